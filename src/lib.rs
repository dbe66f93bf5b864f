// Core layer - config, errors and message helpers
pub mod core;

// Features layer - words, settings and reminders
pub mod features;

// Infrastructure
pub mod database;

pub use crate::core::{Config, VocabError, VocabResult};
pub use database::Database;
pub use features::{ReminderScheduler, ReminderSelector, SettingsStore, WordStore};

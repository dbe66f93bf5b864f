//! # Reminders Feature
//!
//! Twice-daily vocabulary reminders: word selection, message rendering,
//! delivery and the per-minute scheduler.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true (per user, via settings)
//!
//! ## Changelog
//! - 2.0.0: Selection modes, pluggable dedup and notifier
//! - 1.0.0: Initial release

pub mod dedup;
#[cfg(test)]
pub(crate) mod fake_telegram;
pub mod format;
pub mod notifier;
pub mod scheduler;
pub mod selector;

pub use dedup::{DedupStore, InMemoryDedupStore, Slot, SqliteDedupStore};
pub use format::{format_reminder_message, format_selection, format_stats_message};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use scheduler::{ReminderScheduler, SchedulerOptions, TickReport};
pub use selector::{recommend_for, ReminderSelector, Selection, SelectionMode, DEFAULT_WORD_LIMIT};

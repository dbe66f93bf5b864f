//! # Reminder Settings Feature
//!
//! Two daily reminder times (`HH:MM`, 24h) and an on/off switch per user.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod store;
pub mod time;

pub use store::{
    SettingsStore, SettingsUpdate, UserSettings, DEFAULT_EVENING_TIME, DEFAULT_MORNING_TIME,
};
pub use time::{normalize_time, parse_time, validate_time};

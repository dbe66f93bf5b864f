//! Feature modules: vocabulary storage, reminder settings and reminders

pub mod reminders;
pub mod settings;
pub mod words;

pub use reminders::{
    DedupStore, InMemoryDedupStore, LogNotifier, Notifier, ReminderScheduler, ReminderSelector,
    SchedulerOptions, SelectionMode, Slot, SqliteDedupStore, TelegramNotifier, TickReport,
};
pub use settings::{validate_time, SettingsStore, SettingsUpdate, UserSettings};
pub use words::{ReminderStats, Word, WordEntry, WordStore};

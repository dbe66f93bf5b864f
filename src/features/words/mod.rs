//! # Vocabulary Feature
//!
//! Word/translation pairs per user with review history and an adaptive
//! difficulty score in [1, 10].
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod entry;
pub mod models;
pub mod store;

pub use entry::WordEntry;
pub use models::{
    adjust_difficulty, ReminderStats, Word, MAX_DIFFICULTY, MAX_ENGLISH_LEN, MAX_RUSSIAN_LEN,
    MAX_TOPIC_LEN, MAX_TRANSCRIPTION_LEN, MIN_DIFFICULTY,
};
pub use store::{normalize_english, WordStore};

//! Word records, review statistics and the difficulty rule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;

/// Field length caps, in chars
pub const MAX_ENGLISH_LEN: usize = 100;
pub const MAX_RUSSIAN_LEN: usize = 200;
pub const MAX_TRANSCRIPTION_LEN: usize = 100;
pub const MAX_TOPIC_LEN: usize = 50;

/// One vocabulary entry, keyed by (user_id, english)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Always lowercase and trimmed
    pub english: String,
    pub russian: String,
    pub transcription: Option<String>,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub review_count: u32,
    /// In [`MIN_DIFFICULTY`, `MAX_DIFFICULTY`]; higher is harder
    pub difficulty: u8,
}

/// Aggregate review state of one user's vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderStats {
    pub total_words: u32,
    pub never_reviewed: u32,
    pub reviewed_today: u32,
    /// Rounded to one decimal; 1.0 when there are no words
    pub avg_difficulty: f64,
    pub ready_for_reminder: bool,
}

impl ReminderStats {
    /// Build stats from raw counts, deriving readiness
    pub fn new(total_words: u32, never_reviewed: u32, reviewed_today: u32, avg_difficulty: f64) -> Self {
        // Not tied to any spaced-repetition model; kept as the product heuristic
        let ready_for_reminder =
            never_reviewed > 0 || (total_words > 0 && reviewed_today < total_words / 3);

        Self {
            total_words,
            never_reviewed,
            reviewed_today,
            avg_difficulty: (avg_difficulty * 10.0).round() / 10.0,
            ready_for_reminder,
        }
    }
}

impl Default for ReminderStats {
    fn default() -> Self {
        Self {
            total_words: 0,
            never_reviewed: 0,
            reviewed_today: 0,
            avg_difficulty: 1.0,
            ready_for_reminder: false,
        }
    }
}

/// Difficulty after one review: correct answers ease it, wrong ones raise it
pub fn adjust_difficulty(current: u8, correct: bool) -> u8 {
    let current = clamp_difficulty(current as i64);
    if correct {
        current.saturating_sub(1).max(MIN_DIFFICULTY)
    } else {
        (current + 1).min(MAX_DIFFICULTY)
    }
}

pub fn clamp_difficulty(raw: i64) -> u8 {
    raw.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as u8
}

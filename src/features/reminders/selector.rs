//! # Reminder Selector
//!
//! Chooses which words populate a reminder. Read-only over [`WordStore`].
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Explicit-only `random` mode
//! - 1.1.0: `mixed` mode for manual invocation
//! - 1.0.0: Initial release

use crate::features::words::{ReminderStats, Word, WordStore};
use log::debug;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_WORD_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    /// The user has no vocabulary yet
    NoWords,
    RecentWords,
    OldWords,
    DifficultWords,
    /// Half recent, half old. Never recommended automatically.
    Mixed,
    /// Never recommended automatically
    Random,
}

impl SelectionMode {
    pub fn name(self) -> &'static str {
        match self {
            SelectionMode::NoWords => "none",
            SelectionMode::RecentWords => "recent",
            SelectionMode::OldWords => "old",
            SelectionMode::DifficultWords => "difficult",
            SelectionMode::Mixed => "mixed",
            SelectionMode::Random => "random",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            SelectionMode::NoWords => "❌ No words added yet",
            SelectionMode::RecentWords => "📝 <b>NEW WORDS</b>",
            SelectionMode::OldWords => "🔄 <b>LONG TIME NO SEE</b>",
            SelectionMode::DifficultWords => "⚡ <b>HARD WORDS</b>",
            SelectionMode::Mixed => "🎯 <b>MIXED REVIEW</b>",
            SelectionMode::Random => "🎲 <b>RANDOM PICK</b>",
        }
    }

    fn subtitle(self) -> &'static str {
        match self {
            SelectionMode::NoWords => "",
            SelectionMode::RecentWords => "Your latest additions:",
            SelectionMode::OldWords => "These have not been reviewed for a while:",
            SelectionMode::DifficultWords => "The words you struggle with most:",
            SelectionMode::Mixed => "New and old words together:",
            SelectionMode::Random => "A few words from your collection:",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SelectionMode::RecentWords),
            "old" => Ok(SelectionMode::OldWords),
            "difficult" => Ok(SelectionMode::DifficultWords),
            "mixed" => Ok(SelectionMode::Mixed),
            "random" => Ok(SelectionMode::Random),
            other => Err(format!(
                "unknown selection mode '{other}' (expected recent, old, difficult, mixed or random)"
            )),
        }
    }
}

/// Priority cascade over review stats. Order of the checks matters.
pub fn recommend_for(stats: &ReminderStats) -> SelectionMode {
    if stats.total_words == 0 {
        SelectionMode::NoWords
    } else if stats.never_reviewed >= 10 {
        SelectionMode::RecentWords
    } else if stats.never_reviewed < 5 && stats.total_words > 15 {
        SelectionMode::OldWords
    } else if stats.avg_difficulty > 3.0 {
        SelectionMode::DifficultWords
    } else {
        SelectionMode::RecentWords
    }
}

/// Words chosen for one reminder plus the label describing why
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub mode: SelectionMode,
    pub label: String,
    pub words: Vec<Word>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// `(english, russian)` pairs in display order
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.words
            .iter()
            .map(|w| (w.english.as_str(), w.russian.as_str()))
            .collect()
    }
}

#[derive(Clone)]
pub struct ReminderSelector {
    words: WordStore,
}

impl ReminderSelector {
    pub fn new(words: WordStore) -> Self {
        Self { words }
    }

    pub async fn recommend_mode(&self, user_id: i64) -> SelectionMode {
        let stats = self.words.get_reminder_stats(user_id).await;
        recommend_for(&stats)
    }

    /// Select up to `limit` words. `None` uses the recommended mode.
    /// An empty vocabulary yields an empty selection, not an error.
    pub async fn select_words(
        &self,
        user_id: i64,
        mode: Option<SelectionMode>,
        limit: usize,
    ) -> Selection {
        let mode = match mode {
            Some(mode) => mode,
            None => self.recommend_mode(user_id).await,
        };

        let words = match mode {
            SelectionMode::NoWords => Vec::new(),
            SelectionMode::RecentWords => self.words.get_recent_words(user_id, limit).await,
            SelectionMode::OldWords => self.words.get_old_words(user_id, limit).await,
            SelectionMode::DifficultWords => self.words.get_difficult_words(user_id, limit).await,
            SelectionMode::Random => self.words.get_random_words(user_id, limit).await,
            SelectionMode::Mixed => {
                let half = limit / 2;
                let mut words = self.words.get_recent_words(user_id, half).await;
                words.extend(self.words.get_old_words(user_id, half).await);
                words
            }
        };

        debug!("Selected {} words for user {user_id} in {mode} mode", words.len());

        // An empty result always reads as "no words", whatever the mode
        let mode = if words.is_empty() {
            SelectionMode::NoWords
        } else {
            mode
        };
        Selection {
            mode,
            label: label_for(mode, words.len()),
            words,
        }
    }
}

fn label_for(mode: SelectionMode, count: usize) -> String {
    match mode {
        SelectionMode::NoWords => mode.heading().to_string(),
        _ => format!("{} ({count})\n\n{}", mode.heading(), mode.subtitle()),
    }
}

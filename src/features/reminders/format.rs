//! HTML rendering of reminder and statistics messages

use super::selector::Selection;
use crate::core::MESSAGE_LIMIT;
use crate::features::words::{ReminderStats, Word};
use html_escape::encode_text;
use log::debug;

/// Longest word text shown on a reminder line, in chars
pub const DISPLAY_FIELD_LIMIT: usize = 200;

/// Numbered `english - russian` lines under the selection label.
///
/// Word text is escaped and shortened to [`DISPLAY_FIELD_LIMIT`]; the label is
/// trusted markup. Lines that would push the message past [`MESSAGE_LIMIT`]
/// are dropped whole, so the result is always a single message.
pub fn format_reminder_message(label: &str, words: &[Word]) -> String {
    if words.is_empty() {
        return format!("{label}\n\n❌ No words for this mode");
    }

    let mut message = format!("{label}\n");
    for (i, word) in words.iter().enumerate() {
        let line = format!(
            "\n<code>{}.</code> <code>{}</code> - <code>{}</code>",
            i + 1,
            encode_text(&shorten(&word.english)),
            encode_text(&shorten(&word.russian))
        );
        if message.len() + line.len() > MESSAGE_LIMIT {
            debug!("Reminder cut at {i} of {} words", words.len());
            break;
        }
        message.push_str(&line);
    }
    message
}

fn shorten(text: &str) -> String {
    if text.chars().count() <= DISPLAY_FIELD_LIMIT {
        return text.to_string();
    }
    let mut short: String = text.chars().take(DISPLAY_FIELD_LIMIT - 1).collect();
    short.push('…');
    short
}

pub fn format_selection(selection: &Selection) -> String {
    format_reminder_message(&selection.label, &selection.words)
}

pub fn format_stats_message(stats: &ReminderStats) -> String {
    if stats.total_words == 0 {
        return "📊 <b>Statistics</b>\n\nNo words yet 🙁".to_string();
    }

    let mut message = format!(
        "📊 <b>Your statistics</b>\n\n\
         📝 <b>Total words:</b> {}\n\
         ✨ <b>Never reviewed:</b> {}\n\
         🎯 <b>Reviewed today:</b> {}\n\
         ⚡ <b>Average difficulty:</b> {:.1}/10\n\n",
        stats.total_words, stats.never_reviewed, stats.reviewed_today, stats.avg_difficulty
    );

    if stats.ready_for_reminder {
        message.push_str("✅ <b>Ready for reminders!</b>");
    } else {
        message.push_str("⏳ Keep adding words to get better reminders");
    }
    message
}

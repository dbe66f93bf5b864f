//! Message size utilities for the chat transport
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Telegram limits; dropped embed helpers
//! - 1.0.0: Line-aware chunking

/// Telegram `sendMessage` text limit (measured here in bytes, which is stricter)
pub const MESSAGE_LIMIT: usize = 4096;

/// Split text into pieces no longer than `max_size` bytes.
///
/// Splits at line breaks where possible so a reminder line (and the HTML tags
/// on it) stays in one piece. Lines longer than `max_size` are cut on char
/// boundaries.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        // +1 for the newline joining it to `current`
        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };
        if current.len() + needed <= max_size {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if line.len() > max_size {
            let mut pieces = split_on_char_boundaries(line, max_size);
            // Keep the tail open so following short lines can join it
            if let Some(last) = pieces.pop() {
                chunks.extend(pieces);
                current = last;
            }
        } else {
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_on_char_boundaries(line: &str, max_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if current.len() + ch.len_utf8() > max_size && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Chunk text for a single outgoing chat message
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

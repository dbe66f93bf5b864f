//! Parsing of the chat data-entry line `word - translation[ - transcription][ #topic]`

use crate::core::{VocabError, VocabResult};

/// A word as typed by the user, before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub english: String,
    pub russian: String,
    pub transcription: Option<String>,
    pub topic: Option<String>,
}

impl WordEntry {
    pub fn parse(text: &str) -> VocabResult<Self> {
        let text = text.trim();
        if !text.contains(" - ") {
            return Err(VocabError::invalid(
                "expected `word - translation`, e.g. `cat - кот - [kæt]`",
            ));
        }

        let (body, topic) = match text.split_once(" #") {
            Some((body, topic)) => (body.trim(), non_empty(topic)),
            None => (text, None),
        };

        let mut parts = body.splitn(3, " - ");
        let english = parts.next().unwrap_or_default().trim().to_string();
        let russian = parts.next().unwrap_or_default().trim().to_string();
        let transcription = parts.next().and_then(non_empty);

        if english.is_empty() || russian.is_empty() {
            return Err(VocabError::invalid("word and translation are both required"));
        }

        Ok(Self {
            english,
            russian,
            transcription,
            topic,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let entry = WordEntry::parse("cat - кот").unwrap();
        assert_eq!(entry.english, "cat");
        assert_eq!(entry.russian, "кот");
        assert_eq!(entry.transcription, None);
        assert_eq!(entry.topic, None);
    }

    #[test]
    fn test_parse_full() {
        let entry = WordEntry::parse("  cat - кот - [kæt] #animals ").unwrap();
        assert_eq!(entry.transcription.as_deref(), Some("[kæt]"));
        assert_eq!(entry.topic.as_deref(), Some("animals"));
    }

    #[test]
    fn test_translation_may_contain_dashes_after_third_part() {
        let entry = WordEntry::parse("run - бежать - [rʌn] - extra").unwrap();
        assert_eq!(entry.transcription.as_deref(), Some("[rʌn] - extra"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(WordEntry::parse("cat").is_err());
        assert!(WordEntry::parse("cat-кот").is_err());
        assert!(WordEntry::parse(" - кот").is_err());
        assert!(WordEntry::parse("cat -  #animals").is_err());
    }
}

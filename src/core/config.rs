//! # Configuration
//!
//! Process configuration read from the environment (and `.env` via dotenvy).
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Slot selection modes and durable reminder log switch
//! - 1.0.0: Initial release with database, Telegram and timezone settings

use crate::features::reminders::SelectionMode;
use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "./data/bot.db";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    /// Unset means reminders are only logged, never delivered
    pub telegram_token: Option<String>,
    pub telegram_api_base: String,
    /// The one timezone all stored HH:MM times are interpreted in
    pub utc_offset: FixedOffset,
    pub tick_interval: Duration,
    pub reminder_word_limit: usize,
    pub max_concurrent_sends: usize,
    /// Failed sends of one reminder before it is dropped for the day
    pub max_send_attempts: u32,
    pub storage_timeout: Duration,
    /// `None` lets the selector recommend a mode
    pub morning_mode: Option<SelectionMode>,
    pub evening_mode: Option<SelectionMode>,
    pub persist_reminder_log: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let utc_offset = match get("REMINDER_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw)
                .with_context(|| format!("REMINDER_UTC_OFFSET '{raw}' must look like +03:00"))?,
            None => FixedOffset::east_opt(0).context("zero offset")?,
        };

        Ok(Config {
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            telegram_token: get("TELEGRAM_TOKEN"),
            telegram_api_base: get("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            utc_offset,
            tick_interval: Duration::from_secs(parse_number(&get, "REMINDER_TICK_SECS", 60)?.max(1)),
            reminder_word_limit: parse_number(&get, "REMINDER_WORD_LIMIT", 10)? as usize,
            max_concurrent_sends: (parse_number(&get, "REMINDER_MAX_CONCURRENCY", 4)? as usize).max(1),
            max_send_attempts: (parse_number(&get, "REMINDER_MAX_ATTEMPTS", 5)? as u32).max(1),
            storage_timeout: Duration::from_millis(parse_number(&get, "STORAGE_TIMEOUT_MS", 5000)?),
            morning_mode: parse_mode(&get, "MORNING_MODE", Some(SelectionMode::RecentWords))?,
            evening_mode: parse_mode(&get, "EVENING_MODE", None)?,
            persist_reminder_log: match get("PERSIST_REMINDER_LOG") {
                Some(v) => parse_bool(&v)
                    .with_context(|| format!("PERSIST_REMINDER_LOG '{v}' is not a boolean"))?,
                None => false,
            },
        })
    }
}

fn parse_number<G>(get: &G, key: &str, default: u64) -> Result<u64>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{v}'")),
        None => Ok(default),
    }
}

/// `auto` (or unset with a `None` default) means "let the selector decide"
fn parse_mode<G>(get: &G, key: &str, default: Option<SelectionMode>) -> Result<Option<SelectionMode>>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) if v.eq_ignore_ascii_case("auto") => Ok(None),
        Some(v) => v
            .parse::<SelectionMode>()
            .map(Some)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("{key} has unknown mode '{v}'")),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `HH:MM`, `Z` or `UTC`
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => (1, value),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.log_level, "info");
        assert!(config.telegram_token.is_none());
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.tick_interval, Duration::from_secs(60));
        assert_eq!(config.reminder_word_limit, 10);
        assert_eq!(config.max_concurrent_sends, 4);
        assert_eq!(config.max_send_attempts, 5);
        assert_eq!(config.morning_mode, Some(SelectionMode::RecentWords));
        assert_eq!(config.evening_mode, None);
        assert!(!config.persist_reminder_log);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("REMINDER_UTC_OFFSET", "+03:00"),
            ("REMINDER_TICK_SECS", "30"),
            ("MORNING_MODE", "mixed"),
            ("EVENING_MODE", "difficult"),
            ("PERSIST_REMINDER_LOG", "yes"),
        ])
        .unwrap();
        assert_eq!(config.telegram_token.as_deref(), Some("123:abc"));
        assert_eq!(config.utc_offset.local_minus_utc(), 3 * 3600);
        assert_eq!(config.tick_interval, Duration::from_secs(30));
        assert_eq!(config.morning_mode, Some(SelectionMode::Mixed));
        assert_eq!(config.evening_mode, Some(SelectionMode::DifficultWords));
        assert!(config.persist_reminder_log);
    }

    #[test]
    fn test_auto_mode_and_blank_values() {
        let config = config_from(&[("MORNING_MODE", "AUTO"), ("TELEGRAM_TOKEN", "  ")]).unwrap();
        assert_eq!(config.morning_mode, None);
        assert!(config.telegram_token.is_none());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("REMINDER_UTC_OFFSET", "Moscow")]).is_err());
        assert!(config_from(&[("REMINDER_TICK_SECS", "soon")]).is_err());
        assert!(config_from(&[("EVENING_MODE", "sideways")]).is_err());
        assert!(config_from(&[("PERSIST_REMINDER_LOG", "maybe")]).is_err());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+03:00").unwrap().local_minus_utc(), 10800);
        assert_eq!(parse_utc_offset("-05:30").unwrap().local_minus_utc(), -19800);
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("7").unwrap().local_minus_utc(), 7 * 3600);
        assert!(parse_utc_offset("+25:00").is_none());
        assert!(parse_utc_offset("").is_none());
    }
}

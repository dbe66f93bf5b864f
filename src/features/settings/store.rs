//! # Settings Store
//!
//! Per-user reminder times and the reminders on/off switch.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Times stored in canonical zero-padded form
//! - 1.0.0: Initial release

use super::time::normalize_time;
use crate::core::{ensure_user_id, VocabError, VocabResult};
use crate::database::{format_timestamp, parse_timestamp, Database};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use sqlite::{Connection, State, Statement};

pub const DEFAULT_MORNING_TIME: &str = "09:00";
pub const DEFAULT_EVENING_TIME: &str = "20:00";

/// Reminder settings of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: i64,
    pub morning_time: String,
    pub evening_time: String,
    pub reminders_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn defaults(user_id: i64) -> Self {
        Self {
            user_id,
            morning_time: DEFAULT_MORNING_TIME.to_string(),
            evening_time: DEFAULT_EVENING_TIME.to_string(),
            reminders_enabled: true,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub morning_time: Option<String>,
    pub evening_time: Option<String>,
    pub reminders_enabled: Option<bool>,
}

impl SettingsUpdate {
    pub fn morning(time: impl Into<String>) -> Self {
        Self {
            morning_time: Some(time.into()),
            ..Default::default()
        }
    }

    pub fn evening(time: impl Into<String>) -> Self {
        Self {
            evening_time: Some(time.into()),
            ..Default::default()
        }
    }

    pub fn enabled(enabled: bool) -> Self {
        Self {
            reminders_enabled: Some(enabled),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    database: Database,
}

impl SettingsStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Settings for a user.
    ///
    /// Side effect: a user without a row gets the defaults persisted on this
    /// first read. Storage failures and invalid ids return defaults without
    /// persisting anything.
    pub async fn get_user_settings(&self, user_id: i64) -> UserSettings {
        if let Err(e) = ensure_user_id(user_id) {
            warn!("get_user_settings: {e}");
            return UserSettings::defaults(user_id);
        }

        let result = self
            .database
            .call(|conn| match select_settings(conn, user_id)? {
                Some(settings) => Ok(settings),
                None => {
                    let settings = UserSettings::defaults(user_id);
                    write_settings(conn, &settings, false)?;
                    info!("Created default reminder settings for user {user_id}");
                    Ok(settings)
                }
            })
            .await;

        result.unwrap_or_else(|e| {
            error!("❌ Storage error getting settings for user {user_id}: {e}");
            UserSettings::defaults(user_id)
        })
    }

    /// Apply a partial update. Times are validated before anything is written.
    pub async fn update_user_settings(
        &self,
        user_id: i64,
        update: SettingsUpdate,
    ) -> VocabResult<UserSettings> {
        ensure_user_id(user_id)?;
        let morning = validated(update.morning_time.as_deref(), "morning_time")?;
        let evening = validated(update.evening_time.as_deref(), "evening_time")?;

        let result = self
            .database
            .call(|conn| {
                let existing = select_settings(conn, user_id)?;
                let is_update = existing.is_some();
                let mut settings = existing.unwrap_or_else(|| UserSettings::defaults(user_id));

                if let Some(time) = morning {
                    settings.morning_time = time;
                }
                if let Some(time) = evening {
                    settings.evening_time = time;
                }
                if let Some(enabled) = update.reminders_enabled {
                    settings.reminders_enabled = enabled;
                }
                settings.updated_at = Utc::now();

                write_settings(conn, &settings, is_update)?;
                Ok(settings)
            })
            .await;

        match &result {
            Ok(s) => info!(
                "✅ User settings updated: {user_id} (morning {}, evening {}, enabled {})",
                s.morning_time, s.evening_time, s.reminders_enabled
            ),
            Err(e) => error!("❌ Storage error updating settings for user {user_id}: {e}"),
        }
        result
    }

    /// Every user with reminders switched on, times as stored
    pub async fn enabled_users(&self) -> VocabResult<Vec<UserSettings>> {
        self.database
            .call(|conn| {
                let mut statement = conn.prepare(
                    "SELECT user_id, morning_time, evening_time, reminders_enabled, updated_at
                     FROM user_settings WHERE reminders_enabled = 1 ORDER BY user_id",
                )?;
                let mut users = Vec::new();
                while let State::Row = statement.next()? {
                    users.push(read_settings(&statement)?);
                }
                Ok(users)
            })
            .await
    }
}

fn validated(time: Option<&str>, field: &str) -> VocabResult<Option<String>> {
    match time {
        None => Ok(None),
        Some(raw) => normalize_time(raw).map(Some).ok_or_else(|| {
            warn!("Invalid {field} format: {raw}");
            VocabError::invalid(format!("{field} must be HH:MM, got '{raw}'"))
        }),
    }
}

fn select_settings(conn: &Connection, user_id: i64) -> VocabResult<Option<UserSettings>> {
    let mut statement = conn.prepare(
        "SELECT user_id, morning_time, evening_time, reminders_enabled, updated_at
         FROM user_settings WHERE user_id = ?",
    )?;
    statement.bind((1, user_id))?;
    match statement.next()? {
        State::Row => Ok(Some(read_settings(&statement)?)),
        State::Done => Ok(None),
    }
}

fn write_settings(conn: &Connection, settings: &UserSettings, is_update: bool) -> VocabResult<()> {
    let sql = if is_update {
        "UPDATE user_settings
         SET morning_time = ?, evening_time = ?, reminders_enabled = ?, updated_at = ?
         WHERE user_id = ?"
    } else {
        "INSERT INTO user_settings
             (morning_time, evening_time, reminders_enabled, updated_at, user_id)
         VALUES (?, ?, ?, ?, ?)"
    };
    let updated_at = format_timestamp(settings.updated_at);

    let mut statement = conn.prepare(sql)?;
    statement.bind((1, settings.morning_time.as_str()))?;
    statement.bind((2, settings.evening_time.as_str()))?;
    statement.bind((3, settings.reminders_enabled as i64))?;
    statement.bind((4, updated_at.as_str()))?;
    statement.bind((5, settings.user_id))?;
    statement.next()?;
    Ok(())
}

fn read_settings(statement: &Statement<'_>) -> VocabResult<UserSettings> {
    Ok(UserSettings {
        user_id: statement.read::<i64, _>("user_id")?,
        morning_time: statement.read::<String, _>("morning_time")?,
        evening_time: statement.read::<String, _>("evening_time")?,
        reminders_enabled: statement.read::<i64, _>("reminders_enabled")? != 0,
        updated_at: parse_timestamp(&statement.read::<String, _>("updated_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SettingsStore {
        SettingsStore::new(Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_first_read_persists_defaults() {
        let store = store().await;
        assert!(store.enabled_users().await.unwrap().is_empty());

        let settings = store.get_user_settings(7).await;
        assert_eq!(settings.morning_time, "09:00");
        assert_eq!(settings.evening_time, "20:00");
        assert!(settings.reminders_enabled);

        let users = store.enabled_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, 7);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = store().await;
        store
            .update_user_settings(7, SettingsUpdate::morning("7:5"))
            .await
            .unwrap();
        let settings = store
            .update_user_settings(7, SettingsUpdate::evening("21:30"))
            .await
            .unwrap();

        assert_eq!(settings.morning_time, "07:05");
        assert_eq!(settings.evening_time, "21:30");
        assert!(settings.reminders_enabled);
        assert_eq!(store.get_user_settings(7).await.morning_time, "07:05");
    }

    #[tokio::test]
    async fn test_first_write_inserts_with_defaults() {
        let store = store().await;
        let settings = store
            .update_user_settings(3, SettingsUpdate::enabled(false))
            .await
            .unwrap();
        assert_eq!(settings.morning_time, DEFAULT_MORNING_TIME);
        assert_eq!(settings.evening_time, DEFAULT_EVENING_TIME);
        assert!(!settings.reminders_enabled);
        assert!(store.enabled_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_time_writes_nothing() {
        let store = store().await;
        store
            .update_user_settings(7, SettingsUpdate::morning("08:00"))
            .await
            .unwrap();

        let update = SettingsUpdate {
            morning_time: Some("06:00".to_string()),
            evening_time: Some("24:00".to_string()),
            reminders_enabled: Some(false),
        };
        assert!(matches!(
            store.update_user_settings(7, update).await,
            Err(VocabError::InvalidArgument(_))
        ));

        let settings = store.get_user_settings(7).await;
        assert_eq!(settings.morning_time, "08:00");
        assert!(settings.reminders_enabled);
    }

    #[tokio::test]
    async fn test_invalid_user_id() {
        let store = store().await;
        assert!(matches!(
            store.update_user_settings(0, SettingsUpdate::enabled(true)).await,
            Err(VocabError::InvalidArgument(_))
        ));
        assert_eq!(store.get_user_settings(-5).await.morning_time, DEFAULT_MORNING_TIME);
        assert!(store.enabled_users().await.unwrap().is_empty());
    }
}

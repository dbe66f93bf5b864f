//! # Reminder Scheduler
//!
//! Sends each enabled user a morning and an evening word reminder at their
//! configured times. A periodic tick is the only driver; one tick runs at a
//! time and a slot is marked sent only after the notifier succeeds.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Permanent rejections close the slot for the day; capped retries
//! - 2.0.0: Catch-up trigger (slot time reached and not yet sent today),
//!   pluggable dedup store, bounded per-tick fan-out
//! - 1.1.0: Per-user error isolation
//! - 1.0.0: Initial release

use super::dedup::{DedupStore, Slot};
use super::format::format_selection;
use super::notifier::Notifier;
use super::selector::{ReminderSelector, SelectionMode, DEFAULT_WORD_LIMIT};
use crate::core::{Config, VocabError, VocabResult};
use crate::features::settings::{parse_time, SettingsStore, UserSettings};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;

/// Used when a stored slot time cannot be parsed
const FALLBACK_TIME: (u32, u32) = (9, 0);

/// Tunables for the scheduler, normally taken from [`Config`]
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub tick_interval: Duration,
    pub word_limit: usize,
    pub max_concurrency: usize,
    /// Failed sends per slot and day before the slot is given up
    pub max_attempts: u32,
    /// `None` means the selector recommends a mode per user
    pub morning_mode: Option<SelectionMode>,
    pub evening_mode: Option<SelectionMode>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            word_limit: DEFAULT_WORD_LIMIT,
            max_concurrency: 4,
            max_attempts: 5,
            morning_mode: Some(SelectionMode::RecentWords),
            evening_mode: None,
        }
    }
}

impl SchedulerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval,
            word_limit: config.reminder_word_limit,
            max_concurrency: config.max_concurrent_sends.max(1),
            max_attempts: config.max_send_attempts.max(1),
            morning_mode: config.morning_mode,
            evening_mode: config.evening_mode,
        }
    }

    fn mode_for(&self, slot: Slot) -> Option<SelectionMode> {
        match slot {
            Slot::Morning => self.morning_mode,
            Slot::Evening => self.evening_mode,
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Users with reminders enabled
    pub users: usize,
    pub sent: usize,
    /// Due slots skipped because the user has no words to show
    pub skipped_empty: usize,
    pub failed: usize,
}

impl TickReport {
    fn absorb(&mut self, other: TickReport) {
        self.users += other.users;
        self.sent += other.sent;
        self.skipped_empty += other.skipped_empty;
        self.failed += other.failed;
    }
}

enum SlotOutcome {
    NotDue,
    Sent,
    SkippedEmpty,
    Failed,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    settings: SettingsStore,
    selector: ReminderSelector,
    dedup: Arc<dyn DedupStore>,
    notifier: Arc<dyn Notifier>,
    offset: FixedOffset,
    options: SchedulerOptions,
    tick_lock: Arc<Mutex<()>>,
    /// Failed sends so far, per (user, slot), for the recorded day
    attempts: Arc<DashMap<(i64, Slot), (NaiveDate, u32)>>,
}

impl ReminderScheduler {
    pub fn new(
        settings: SettingsStore,
        selector: ReminderSelector,
        dedup: Arc<dyn DedupStore>,
        notifier: Arc<dyn Notifier>,
        offset: FixedOffset,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            settings,
            selector,
            dedup,
            notifier,
            offset,
            options,
            tick_lock: Arc::new(Mutex::new(())),
            attempts: Arc::new(DashMap::new()),
        }
    }

    /// Wall-clock time of `instant` in the configured timezone
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub async fn tick(&self) -> TickReport {
        self.tick_at(self.local_time(Utc::now())).await
    }

    /// Run one tick as if the local time were `now`.
    ///
    /// Ticks are serialized: a second caller waits for the first to finish.
    pub async fn tick_at(&self, now: NaiveDateTime) -> TickReport {
        let _guard = self.tick_lock.lock().await;
        let today = now.date();
        let mut report = TickReport::default();

        let users = match self.settings.enabled_users().await {
            Ok(users) => users,
            Err(e) => {
                error!("❌ Error loading reminder users: {e}");
                return report;
            }
        };
        report.users = users.len();

        let per_user: Vec<TickReport> = stream::iter(users)
            .map(|user| self.process_user(user, now))
            .buffer_unordered(self.options.max_concurrency.max(1))
            .collect()
            .await;
        for user_report in per_user {
            report.absorb(user_report);
        }

        if let Err(e) = self.dedup.purge_before(today).await {
            warn!("Failed to purge reminder log before {today}: {e}");
        }
        self.attempts.retain(|_, (day, _)| *day >= today);

        if report.sent > 0 || report.failed > 0 {
            info!(
                "Reminder tick at {}: {} sent, {} failed, {} empty, {} users",
                now.format("%Y-%m-%d %H:%M"),
                report.sent,
                report.failed,
                report.skipped_empty,
                report.users
            );
        }
        report
    }

    async fn process_user(&self, user: UserSettings, now: NaiveDateTime) -> TickReport {
        let mut report = TickReport::default();
        for slot in Slot::ALL {
            let outcome = self
                .process_slot(&user, slot, now)
                .await
                .unwrap_or_else(|e| {
                    error!("❌ Error processing {slot} reminder for user {}: {e}", user.user_id);
                    SlotOutcome::Failed
                });
            match outcome {
                SlotOutcome::NotDue => {}
                SlotOutcome::Sent => report.sent += 1,
                SlotOutcome::SkippedEmpty => report.skipped_empty += 1,
                SlotOutcome::Failed => report.failed += 1,
            }
        }
        report
    }

    async fn process_slot(
        &self,
        user: &UserSettings,
        slot: Slot,
        now: NaiveDateTime,
    ) -> VocabResult<SlotOutcome> {
        let user_id = user.user_id;
        let today = now.date();

        if !is_due(slot_time(user, slot), now) {
            return Ok(SlotOutcome::NotDue);
        }
        if self.dedup.was_sent(user_id, slot, today).await? {
            return Ok(SlotOutcome::NotDue);
        }

        let selection = self
            .selector
            .select_words(user_id, self.options.mode_for(slot), self.options.word_limit)
            .await;
        if selection.is_empty() {
            debug!("No words for {slot} reminder of user {user_id}, skipping");
            return Ok(SlotOutcome::SkippedEmpty);
        }

        let text = format_selection(&selection);
        match self.notifier.send(user_id, &text).await {
            Ok(()) => {
                self.mark_sent(user_id, slot, today).await?;
                info!(
                    "✅ {slot} reminder sent to user {user_id} ({} mode, {} words)",
                    selection.mode,
                    selection.words.len()
                );
                Ok(SlotOutcome::Sent)
            }
            Err(e @ VocabError::Rejected(_)) => {
                // Resending the same text cannot succeed today
                error!("❌ {slot} reminder to {user_id} rejected, skipping until tomorrow: {e}");
                self.mark_sent(user_id, slot, today).await?;
                Ok(SlotOutcome::Failed)
            }
            Err(e) => {
                let attempt = self.record_failure(user_id, slot, today);
                if attempt >= self.options.max_attempts {
                    error!(
                        "❌ Giving up on {slot} reminder to {user_id} after {attempt} attempts: {e}"
                    );
                    self.mark_sent(user_id, slot, today).await?;
                } else {
                    error!("❌ Error sending {slot} reminder to {user_id} (attempt {attempt}): {e}");
                }
                Ok(SlotOutcome::Failed)
            }
        }
    }

    /// Count a failed send and return the attempt number for today
    fn record_failure(&self, user_id: i64, slot: Slot, today: NaiveDate) -> u32 {
        let mut entry = self.attempts.entry((user_id, slot)).or_insert((today, 0));
        if entry.0 != today {
            *entry = (today, 0);
        }
        entry.1 += 1;
        entry.1
    }

    async fn mark_sent(&self, user_id: i64, slot: Slot, today: NaiveDate) -> VocabResult<()> {
        self.dedup.mark_sent(user_id, slot, today).await.map_err(|e| {
            // Delivered but unrecorded: a later tick today may send again
            warn!("Reminder for user {user_id} sent but not recorded: {e}");
            e
        })
    }

    /// Tick on the configured cadence until `shutdown` turns true or its
    /// sender is dropped. A tick in progress is finished before returning.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.options.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "🚀 Reminder scheduler started (every {}s, UTC{})",
            self.options.tick_interval.as_secs(),
            self.offset
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("⛔ Reminder scheduler stopped");
    }
}

fn slot_time(user: &UserSettings, slot: Slot) -> (u32, u32) {
    let raw = match slot {
        Slot::Morning => &user.morning_time,
        Slot::Evening => &user.evening_time,
    };
    parse_time(raw).unwrap_or_else(|| {
        warn!(
            "Invalid {slot} time '{raw}' for user {}, using default 09:00",
            user.user_id
        );
        FALLBACK_TIME
    })
}

/// Due once the local time (to the minute) has reached the slot time today
fn is_due(slot_time: (u32, u32), now: NaiveDateTime) -> bool {
    slot_time <= (now.hour(), now.minute())
}

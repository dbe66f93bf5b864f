use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::watch;

use lingo::core::Config;
use lingo::database::Database;
use lingo::features::reminders::{
    DedupStore, InMemoryDedupStore, LogNotifier, Notifier, ReminderScheduler, ReminderSelector,
    SchedulerOptions, SqliteDedupStore, TelegramNotifier,
};
use lingo::features::settings::SettingsStore;
use lingo::features::words::WordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting vocabulary reminder bot...");

    // Store initialization failures are fatal
    let database = Database::with_timeout(&config.database_path, config.storage_timeout).await?;
    info!("✅ Database ready at {}", config.database_path);

    let words = WordStore::new(database.clone(), config.utc_offset);
    let settings = SettingsStore::new(database.clone());
    let selector = ReminderSelector::new(words);

    let dedup: Arc<dyn DedupStore> = if config.persist_reminder_log {
        info!("Reminder log persisted in the database");
        Arc::new(SqliteDedupStore::new(database.clone()))
    } else {
        Arc::new(InMemoryDedupStore::new())
    };

    let notifier: Arc<dyn Notifier> = match &config.telegram_token {
        Some(token) => Arc::new(TelegramNotifier::new(token, &config.telegram_api_base)?),
        None => {
            warn!("TELEGRAM_TOKEN not set, reminders will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let scheduler = ReminderScheduler::new(
        settings,
        selector,
        dedup,
        notifier,
        config.utc_offset,
        SchedulerOptions::from_config(&config),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
    }
    info!("Shutdown requested, waiting for the scheduler...");

    // Err only if the scheduler already exited
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        error!("❌ Scheduler task failed: {e}");
    }

    info!("Bye");
    Ok(())
}

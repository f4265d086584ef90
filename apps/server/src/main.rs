//! Contest Bot - Telegram reminders for programming contests.
//!
//! Polls clist.by for upcoming contests on the configured resources, arms
//! reminders ahead of each start and answers `/list` in Telegram.

mod config;

use chrono::Utc;
use clap::Parser;
use config::BotConfig;
use contest_alerts::{Notifier, NotifierError, Subscribers, TelegramBot};
use contest_engine::ReminderScheduler;
use contest_feeds::ClistClient;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Contest Bot CLI
#[derive(Parser, Debug)]
#[command(name = "contest-bot")]
#[command(about = "Programming contest reminders for Telegram", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CONTEST_BOT_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Seconds between contest API polls
    #[arg(long, default_value_t = 3600)]
    poll_interval: u64,

    /// Send the upcoming contest list to this chat and exit
    #[arg(long, value_name = "CHAT_ID", allow_negative_numbers = true)]
    once: Option<i64>,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Fetch upcoming contests once and arm reminders for new ones.
/// Returns the number of timers armed.
async fn poll_once(
    notifier: &Notifier,
    scheduler: &ReminderScheduler,
) -> Result<usize, NotifierError> {
    let now = Utc::now();
    let contests = notifier.upcoming(now).await?;
    Ok(scheduler.sync(&contests, now))
}

async fn run_poll_loop(
    notifier: Arc<Notifier>,
    scheduler: Arc<ReminderScheduler>,
    interval: Duration,
) {
    info!("Starting contest poll loop (every {}s)", interval.as_secs());

    loop {
        match poll_once(&notifier, &scheduler).await {
            Ok(armed) => {
                info!(
                    armed = armed,
                    pending = scheduler.pending_count(),
                    next = ?scheduler.next_reminder(),
                    "Polled clist"
                );
                info!("Current jobs: {:?}", scheduler.scheduled_ids());
            }
            Err(NotifierError::Feed(e)) if e.is_transient() => {
                warn!("Contest poll failed, trying again next interval: {}", e);
            }
            Err(e) => {
                error!("Contest poll failed: {}", e);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match BotConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}", args.config, e);
            return ExitCode::FAILURE;
        }
    };

    info!("🚀 Contest Bot starting...");
    info!("  Config: {}", args.config);
    info!("  Resources: {:?}", config.resource_ids);
    info!("  Time zone: {}", config.display_timezone);
    info!("  Reminders (min before start): {:?}", config.reminder_intervals_minutes);
    info!("  Poll interval: {}s", args.poll_interval);

    let formatter = match config.formatter() {
        Ok(formatter) => formatter,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match ClistClient::with_base_url(config.credentials(), &config.clist_api_url) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create clist client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let bot = Bot::new(&config.telegram_token);
    let subscribers: Subscribers = config.subscribers.iter().copied().collect();
    info!("  Initial subscribers: {}", subscribers.len());

    let notifier = Arc::new(Notifier::new(
        Arc::new(client),
        Arc::new(bot.clone()),
        subscribers,
        formatter,
        config.notifier_config(),
    ));

    if let Some(chat_id) = args.once {
        return match notifier.announce_upcoming(ChatId(chat_id), Utc::now()).await {
            Ok(listed) => {
                info!("Sent {} upcoming contests to chat {}", listed, chat_id);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to send contest list: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let scheduler = Arc::new(ReminderScheduler::new(
        notifier.clone(),
        config.reminder_policy(),
    ));

    let poll_handle = tokio::spawn(run_poll_loop(
        notifier.clone(),
        scheduler.clone(),
        Duration::from_secs(args.poll_interval.max(1)),
    ));

    let telegram = Arc::new(TelegramBot::new(bot, notifier.clone()));
    let bot_handle = tokio::spawn(telegram.run());

    // Handle shutdown
    info!("Press Ctrl+C to stop...");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }

    warn!("Shutdown signal received");
    poll_handle.abort();
    scheduler.cancel_all();

    // The dispatcher stops on the same signal
    let _ = tokio::time::timeout(Duration::from_secs(2), bot_handle).await;

    info!("👋 Contest Bot stopped");
    ExitCode::SUCCESS
}

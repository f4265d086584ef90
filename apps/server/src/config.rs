//! Application configuration.
//!
//! Loaded once at startup from a YAML file:
//!
//! ```yaml
//! clist_user: alice
//! clist_api_key: 0123456789abcdef
//! telegram_token: "123456:ABC-DEF"
//! resource_ids: [1, 2, 63, 93]
//! ```

use chrono::Duration;
use chrono_tz::Tz;
use contest_alerts::{MessageFormatter, NotifierConfig};
use contest_core::{ReminderPolicy, ResourceId};
use contest_feeds::{ClistClient, ClistCredentials};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Unknown time zone '{0}'")]
    Timezone(String),
}

/// Longest lookahead window accepted, in days.
pub const MAX_LOOKAHEAD_DAYS: i64 = 365;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Bot configuration.
#[derive(Clone, PartialEq, Deserialize)]
pub struct BotConfig {
    /// clist.by account name.
    pub clist_user: String,
    /// clist.by API key.
    pub clist_api_key: String,
    /// Telegram bot token.
    pub telegram_token: String,
    /// Contest host resources to follow, in query order.
    pub resource_ids: Vec<ResourceId>,
    /// IANA time zone used to display start times.
    #[serde(default = "default_timezone")]
    pub display_timezone: String,
    /// Reminder lead times in minutes.
    #[serde(default = "default_reminder_intervals")]
    pub reminder_intervals_minutes: Vec<i64>,
    /// How many days ahead to look for contests.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    /// Maximum number of contests in a `/list` reply.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    /// clist contest endpoint.
    #[serde(default = "default_clist_api_url")]
    pub clist_api_url: String,
    /// Chats subscribed at startup.
    #[serde(default)]
    pub subscribers: Vec<i64>,
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

fn default_reminder_intervals() -> Vec<i64> {
    ReminderPolicy::default().lead_minutes
}

fn default_lookahead_days() -> i64 {
    14
}

fn default_list_limit() -> usize {
    6
}

fn default_clist_api_url() -> String {
    ClistClient::DEFAULT_BASE_URL.to_string()
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("clist_user", &self.clist_user)
            .field("clist_api_key", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("resource_ids", &self.resource_ids)
            .field("display_timezone", &self.display_timezone)
            .field("reminder_intervals_minutes", &self.reminder_intervals_minutes)
            .field("lookahead_days", &self.lookahead_days)
            .field("list_limit", &self.list_limit)
            .field("clist_api_url", &self.clist_api_url)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

impl BotConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse and validate YAML config text.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("clist_user", &self.clist_user),
            ("clist_api_key", &self.clist_api_key),
            ("telegram_token", &self.telegram_token),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }
        if self.resource_ids.is_empty() {
            return Err(ConfigError::Invalid("resource_ids must not be empty".into()));
        }
        if self.lookahead_days <= 0 || self.lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(ConfigError::Invalid(format!(
                "lookahead_days must be between 1 and {}",
                MAX_LOOKAHEAD_DAYS
            )));
        }
        if self.list_limit == 0 {
            return Err(ConfigError::Invalid("list_limit must be positive".into()));
        }
        // A lead longer than the lookahead would never fire.
        let max_interval = self.lookahead_days * MINUTES_PER_DAY;
        if self
            .reminder_intervals_minutes
            .iter()
            .any(|&m| m <= 0 || m > max_interval)
        {
            return Err(ConfigError::Invalid(format!(
                "reminder_intervals_minutes must be between 1 and {} (lookahead_days * 1440)",
                max_interval
            )));
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.display_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Timezone(self.display_timezone.clone()))
    }

    pub fn credentials(&self) -> ClistCredentials {
        ClistCredentials::new(&self.clist_user, &self.clist_api_key)
    }

    pub fn reminder_policy(&self) -> ReminderPolicy {
        ReminderPolicy::new(self.reminder_intervals_minutes.clone())
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig {
            resource_ids: self.resource_ids.clone(),
            lookahead: Duration::days(self.lookahead_days),
        }
    }

    pub fn formatter(&self) -> Result<MessageFormatter, ConfigError> {
        Ok(MessageFormatter::new(self.timezone()?, self.list_limit))
    }
}

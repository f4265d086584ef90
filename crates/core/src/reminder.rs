//! Reminder lead times.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lead times before a contest start at which reminders go out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPolicy {
    /// Lead times in minutes, in the order reminders are armed.
    pub lead_minutes: Vec<i64>,
}

impl Default for ReminderPolicy {
    /// One day and two hours before the start.
    fn default() -> Self {
        Self {
            lead_minutes: vec![24 * 60, 2 * 60],
        }
    }
}

impl ReminderPolicy {
    pub fn new(lead_minutes: Vec<i64>) -> Self {
        Self { lead_minutes }
    }

    /// Lead times as durations. Values out of chrono's range are dropped.
    pub fn leads(&self) -> impl Iterator<Item = Duration> + '_ {
        self.lead_minutes.iter().filter_map(|&m| Duration::try_minutes(m))
    }

    /// Reminder instants for a contest starting at `start`.
    /// Instants already in the past at `now` are skipped.
    pub fn reminder_times(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.leads()
            .filter_map(|lead| start.checked_sub_signed(lead))
            .filter(|at| *at >= now)
            .collect()
    }
}

//! HTML message formatting.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use contest_core::{format_delta, format_duration, round_to_nearest_minute, Contest};
use teloxide::utils::html;

/// Display format for contest start times, e.g. `Sat 12.10. 16:35`.
pub const DISPLAY_DATE_FORMAT: &str = "%a %d.%m. %H:%M";

/// Renders contests for Telegram in a fixed display time zone.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    timezone: Tz,
    list_limit: usize,
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Berlin,
            list_limit: 6,
        }
    }
}

impl MessageFormatter {
    pub fn new(timezone: Tz, list_limit: usize) -> Self {
        Self {
            timezone,
            list_limit,
        }
    }

    pub fn list_limit(&self) -> usize {
        self.list_limit
    }

    pub fn format_time(&self, time: &DateTime<Utc>) -> String {
        time.with_timezone(&self.timezone)
            .format(DISPLAY_DATE_FORMAT)
            .to_string()
    }

    /// `<a href="...">event</a>`
    pub fn contest_link(&self, contest: &Contest) -> String {
        // `html::escape` leaves quotes alone; the href sits inside one.
        let href = html::escape(&contest.href).replace('"', "&quot;");
        format!("<a href=\"{}\">{}</a>", href, html::escape(&contest.event))
    }

    /// `Sat 12.10. 16:35, 2:00 <a href="...">event</a>`
    pub fn contest_line(&self, contest: &Contest) -> String {
        format!(
            "{}, {} {}",
            self.format_time(&contest.start),
            format_duration(contest.duration()),
            self.contest_link(contest)
        )
    }

    /// Upcoming contest list, capped at the list limit.
    pub fn list_message(&self, contests: &[Contest]) -> String {
        if contests.is_empty() {
            return "Upcoming contests:\nNo contests found!".to_string();
        }

        let lines: Vec<String> = contests
            .iter()
            .take(self.list_limit)
            .map(|c| self.contest_line(c))
            .collect();

        format!("Upcoming contests:\n{}", lines.join("\n"))
    }

    /// Reminder text with the time left rounded to the minute.
    pub fn reminder_message(&self, contest: &Contest, now: DateTime<Utc>) -> String {
        let delta = round_to_nearest_minute(contest.starts_in(now));
        format!(
            "Reminder: {} starts in {}",
            self.contest_link(contest),
            format_delta(delta)
        )
    }
}

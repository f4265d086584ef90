//! Reminder scheduler.
//!
//! Every poll hands the scheduler the current upcoming contests. Contests that
//! have no live timer get one timer per reminder lead time; contests that
//! already have one are left alone. Timers live only in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contest_core::{Contest, ReminderPolicy};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Receiver of fired reminders.
#[async_trait]
pub trait ReminderSink: Send + Sync {
    /// Called when a reminder for `contest` is due. `now` is the firing time.
    async fn remind(&self, contest: &Contest, now: DateTime<Utc>);
}

struct ArmedReminder {
    at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

impl ArmedReminder {
    #[inline]
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Arms and tracks reminder timers, keyed by contest id.
pub struct ReminderScheduler {
    sink: Arc<dyn ReminderSink>,
    policy: ReminderPolicy,
    armed: DashMap<u64, Vec<ArmedReminder>>,
}

impl ReminderScheduler {
    pub fn new(sink: Arc<dyn ReminderSink>, policy: ReminderPolicy) -> Self {
        Self {
            sink,
            policy,
            armed: DashMap::new(),
        }
    }

    /// Whether a contest has at least one pending reminder.
    pub fn is_scheduled(&self, contest_id: u64) -> bool {
        self.armed
            .get(&contest_id)
            .is_some_and(|reminders| reminders.iter().any(ArmedReminder::is_live))
    }

    /// Arm reminders for every contest that has none pending.
    /// Returns the number of timers armed.
    pub fn sync(&self, contests: &[Contest], now: DateTime<Utc>) -> usize {
        self.prune();

        let mut armed = 0;
        for contest in contests {
            if self.is_scheduled(contest.id) {
                continue;
            }

            let times = self.policy.reminder_times(contest.start, now);
            if times.is_empty() {
                debug!(
                    contest_id = contest.id,
                    event = %contest.event,
                    "No reminder left before start"
                );
                continue;
            }

            let reminders: Vec<ArmedReminder> = times
                .into_iter()
                .map(|at| {
                    info!(
                        contest_id = contest.id,
                        event = %contest.event,
                        at = %at,
                        "Scheduled reminder"
                    );
                    self.arm(contest.clone(), at, now)
                })
                .collect();

            armed += reminders.len();
            self.armed.insert(contest.id, reminders);
        }

        armed
    }

    fn arm(&self, contest: Contest, at: DateTime<Utc>, now: DateTime<Utc>) -> ArmedReminder {
        let delay = (at - now).to_std().unwrap_or_default();
        let sink = Arc::clone(&self.sink);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.remind(&contest, Utc::now()).await;
        });

        ArmedReminder { at, handle }
    }

    /// Forget timers that already fired.
    pub fn prune(&self) {
        self.armed.retain(|_, reminders| {
            reminders.retain(ArmedReminder::is_live);
            !reminders.is_empty()
        });
    }

    /// Ids of contests with pending reminders, ascending.
    pub fn scheduled_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .armed
            .iter()
            .filter(|entry| entry.value().iter().any(ArmedReminder::is_live))
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of pending reminder timers.
    pub fn pending_count(&self) -> usize {
        self.armed
            .iter()
            .map(|entry| entry.value().iter().filter(|r| r.is_live()).count())
            .sum()
    }

    /// Earliest pending reminder instant.
    pub fn next_reminder(&self) -> Option<DateTime<Utc>> {
        self.armed
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|r| r.is_live())
                    .map(|r| r.at)
                    .collect::<Vec<_>>()
            })
            .min()
    }

    /// Abort every pending timer.
    pub fn cancel_all(&self) {
        for entry in self.armed.iter() {
            for reminder in entry.value() {
                reminder.handle.abort();
            }
        }
        self.armed.clear();
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        fired: Mutex<Vec<u64>>,
    }

    impl RecordingSink {
        fn fired(&self) -> Vec<u64> {
            self.fired.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReminderSink for RecordingSink {
        async fn remind(&self, contest: &Contest, _now: DateTime<Utc>) {
            self.fired.lock().unwrap().push(contest.id);
        }
    }

    fn contest(id: u64, now: DateTime<Utc>, starts_in: Duration) -> Contest {
        Contest::new(
            id,
            format!("Round {}", id),
            "https://codeforces.com",
            now + starts_in,
            now + starts_in + Duration::hours(2),
        )
    }

    fn scheduler() -> (Arc<RecordingSink>, ReminderScheduler) {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = ReminderScheduler::new(sink.clone(), ReminderPolicy::default());
        (sink, scheduler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_arms_future_reminders() {
        let (_sink, scheduler) = scheduler();
        let now = Utc::now();

        let armed = scheduler.sync(&[contest(7, now, Duration::days(3))], now);

        assert_eq!(armed, 2);
        assert!(scheduler.is_scheduled(7));
        assert_eq!(scheduler.scheduled_ids(), vec![7]);
        assert_eq!(scheduler.pending_count(), 2);
        assert_eq!(
            scheduler.next_reminder(),
            Some(now + Duration::days(2))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_does_not_rearm_scheduled_contest() {
        let (_sink, scheduler) = scheduler();
        let now = Utc::now();
        let contests = [contest(1, now, Duration::days(3)), contest(2, now, Duration::hours(5))];

        assert_eq!(scheduler.sync(&contests, now), 3);
        assert_eq!(scheduler.sync(&contests, now + Duration::hours(1)), 0);
        assert_eq!(scheduler.pending_count(), 3);
        assert_eq!(scheduler.scheduled_ids(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_skips_contest_starting_soon() {
        let (_sink, scheduler) = scheduler();
        let now = Utc::now();

        let armed = scheduler.sync(&[contest(3, now, Duration::minutes(30))], now);

        assert_eq!(armed, 0);
        assert!(!scheduler.is_scheduled(3));
        assert!(scheduler.next_reminder().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_fires_through_sink() {
        let (sink, scheduler) = scheduler();
        let now = Utc::now();

        // Only the two-hour reminder is still ahead, one hour from now.
        scheduler.sync(&[contest(9, now, Duration::hours(3))], now);
        assert!(sink.fired().is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(3_601)).await;

        assert_eq!(sink.fired(), vec![9]);
        assert!(!scheduler.is_scheduled(9));

        scheduler.prune();
        assert!(scheduler.scheduled_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_contest_not_rearmed_after_last_reminder() {
        let (sink, scheduler) = scheduler();
        let now = Utc::now();
        let contests = [contest(4, now, Duration::hours(3))];

        scheduler.sync(&contests, now);
        tokio::time::sleep(std::time::Duration::from_secs(3_601)).await;

        let later = now + Duration::seconds(3_601);
        assert_eq!(scheduler.sync(&contests, later), 0);
        assert_eq!(sink.fired(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (sink, scheduler) = scheduler();
        let now = Utc::now();

        scheduler.sync(&[contest(5, now, Duration::hours(3))], now);
        scheduler.cancel_all();

        tokio::time::sleep(std::time::Duration::from_secs(7_200)).await;

        assert!(sink.fired().is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }
}

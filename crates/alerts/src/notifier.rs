//! Contest notification logic.

use crate::format::MessageFormatter;
use crate::subscribers::Subscribers;
use crate::telegram::{MessageSink, TelegramError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use contest_core::{format_delta, round_to_nearest_minute, Contest, ResourceId};
use contest_engine::ReminderSink;
use contest_feeds::{ContestQuery, ContestSource, FeedError};
use std::sync::Arc;
use teloxide::types::ChatId;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Contest feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

/// Configuration for the notifier.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Resources to query, in request order.
    pub resource_ids: Vec<ResourceId>,
    /// How far ahead to look for upcoming contests.
    pub lookahead: Duration,
}

impl NotifierConfig {
    pub fn new(resource_ids: Vec<ResourceId>) -> Self {
        Self {
            resource_ids,
            lookahead: Duration::weeks(2),
        }
    }
}

/// Fetches contests and relays them to Telegram chats.
pub struct Notifier {
    source: Arc<dyn ContestSource>,
    sink: Arc<dyn MessageSink>,
    subscribers: Subscribers,
    formatter: MessageFormatter,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(
        source: Arc<dyn ContestSource>,
        sink: Arc<dyn MessageSink>,
        subscribers: Subscribers,
        formatter: MessageFormatter,
        config: NotifierConfig,
    ) -> Self {
        Self {
            source,
            sink,
            subscribers,
            formatter,
            config,
        }
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    pub fn subscribe(&self, chat_id: ChatId) -> bool {
        self.subscribers.add(chat_id)
    }

    pub fn unsubscribe(&self, chat_id: ChatId) -> bool {
        self.subscribers.remove(chat_id)
    }

    /// Query for contests starting within the lookahead window.
    pub fn upcoming_query(&self, now: DateTime<Utc>) -> ContestQuery {
        ContestQuery::upcoming(&self.config.resource_ids, now, self.config.lookahead)
    }

    /// Contests on the configured resources starting after `now`.
    pub async fn upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, NotifierError> {
        let query = self.upcoming_query(now);
        Ok(self.source.fetch_contests(&query).await?)
    }

    /// Upcoming contest list as sent for `/list`.
    pub async fn list_message(&self, now: DateTime<Utc>) -> Result<String, NotifierError> {
        let contests = self.upcoming(now).await?;
        Ok(self.formatter.list_message(&contests))
    }

    /// Send the upcoming contest list to one chat.
    /// Returns the number of contests listed.
    pub async fn announce_upcoming(
        &self,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> Result<usize, NotifierError> {
        let contests = self.upcoming(now).await?;
        let listed = contests.len().min(self.formatter.list_limit());
        let message = self.formatter.list_message(&contests);

        self.sink.send_html(chat_id, &message).await?;
        info!(
            chat_id = chat_id.0,
            contests = listed,
            "Sent list of upcoming contests"
        );
        Ok(listed)
    }

    /// Send a message to every subscriber. Failed chats are logged and skipped.
    /// Returns the number of chats reached.
    pub async fn broadcast(&self, message: &str) -> u32 {
        let mut sent_count = 0u32;

        for chat_id in self.subscribers.list() {
            match self.sink.send_html(chat_id, message).await {
                Ok(_) => sent_count += 1,
                Err(e) => {
                    error!(chat_id = chat_id.0, error = %e, "Failed to send message");
                }
            }
        }

        sent_count
    }
}

#[async_trait]
impl ReminderSink for Notifier {
    async fn remind(&self, contest: &Contest, now: DateTime<Utc>) {
        let message = self.formatter.reminder_message(contest, now);
        let sent = self.broadcast(&message).await;

        info!(
            contest_id = contest.id,
            event = %contest.event,
            delta = %format_delta(round_to_nearest_minute(contest.starts_in(now))),
            sent = sent,
            "Sent out reminder"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contest_core::Resource;
    use contest_feeds::StaticContestSource;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use teloxide::{ApiError, RequestError};

    /// Records sent messages; chats listed in `blocked` fail.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(ChatId, String)>>,
        blocked: Vec<ChatId>,
    }

    impl RecordingSink {
        fn blocking(blocked: Vec<ChatId>) -> Self {
            Self {
                blocked,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send_html(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
            if self.blocked.contains(&chat_id) {
                return Err(RequestError::Api(ApiError::BotBlocked).into());
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 10, 8, 0, 0).unwrap()
    }

    fn contest(id: u64, resource: u32, starts_in: Duration) -> Contest {
        Contest::new(
            id,
            format!("Round {}", id),
            format!("https://example.com/{}", id),
            now() + starts_in,
            now() + starts_in + Duration::hours(2),
        )
        .with_resource(Resource::new(resource, "example.com"))
    }

    fn notifier(
        source: Arc<StaticContestSource>,
        sink: Arc<RecordingSink>,
        subscribers: Subscribers,
    ) -> Notifier {
        Notifier::new(
            source,
            sink,
            subscribers,
            MessageFormatter::new(chrono_tz::UTC, 6),
            NotifierConfig::new(vec![1, 93]),
        )
    }

    #[tokio::test]
    async fn test_upcoming_queries_configured_resources() {
        let source = Arc::new(StaticContestSource::new(vec![
            contest(1, 1, Duration::hours(30)),
            contest(2, 93, Duration::hours(5)),
            contest(3, 12, Duration::hours(6)),
        ]));
        let notifier = notifier(source.clone(), Arc::default(), Subscribers::new());

        let ids: Vec<u64> = notifier
            .upcoming(now())
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids, vec![2, 1]);

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].resource_ids, vec![1, 93]);
        assert_eq!(queries[0].start_after, now());
        assert_eq!(queries[0].start_before, now() + Duration::weeks(2));
    }

    #[tokio::test]
    async fn test_announce_upcoming_caps_list() {
        let contests = (1..=8)
            .map(|i| contest(i, 1, Duration::hours(i as i64)))
            .collect();
        let source = Arc::new(StaticContestSource::new(contests));
        let sink = Arc::new(RecordingSink::default());
        let notifier = notifier(source, sink.clone(), Subscribers::new());

        let listed = notifier.announce_upcoming(ChatId(42), now()).await.unwrap();

        assert_eq!(listed, 6);
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChatId(42));
        assert_eq!(sent[0].1.lines().count(), 7);
        assert!(sent[0].1.starts_with("Upcoming contests:\nThu 10.10. 09:00, 2:00"));
    }

    #[tokio::test]
    async fn test_announce_upcoming_without_contests() {
        let source = Arc::new(StaticContestSource::new(Vec::new()));
        let sink = Arc::new(RecordingSink::default());
        let notifier = notifier(source, sink.clone(), Subscribers::new());

        assert_eq!(notifier.announce_upcoming(ChatId(1), now()).await.unwrap(), 0);
        assert_eq!(sink.sent()[0].1, "Upcoming contests:\nNo contests found!");
    }

    #[tokio::test]
    async fn test_feed_failure_propagates() {
        let source = Arc::new(StaticContestSource::failing());
        let sink = Arc::new(RecordingSink::default());
        let notifier = notifier(source, sink.clone(), Subscribers::new());

        let result = notifier.announce_upcoming(ChatId(1), now()).await;

        assert!(matches!(result, Err(NotifierError::Feed(_))));
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_skips_failing_chat() {
        let source = Arc::new(StaticContestSource::default());
        let sink = Arc::new(RecordingSink::blocking(vec![ChatId(2)]));
        let subscribers: Subscribers = [1, 2, 3].into_iter().collect();
        let notifier = notifier(source, sink.clone(), subscribers);

        let sent = notifier.broadcast("hello").await;

        assert_eq!(sent, 2);
        let chats: Vec<ChatId> = sink.sent().into_iter().map(|(c, _)| c).collect();
        assert_eq!(chats, vec![ChatId(1), ChatId(3)]);
    }

    #[tokio::test]
    async fn test_remind_reaches_all_subscribers() {
        let source = Arc::new(StaticContestSource::default());
        let sink = Arc::new(RecordingSink::default());
        let notifier = notifier(source, sink.clone(), Subscribers::new());
        notifier.subscribe(ChatId(10));
        notifier.subscribe(ChatId(20));

        let c = contest(5, 1, Duration::hours(2));
        notifier.remind(&c, now()).await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0].1,
            "Reminder: <a href=\"https://example.com/5\">Round 5</a> starts in 2:00:00"
        );
    }

    #[tokio::test]
    async fn test_unsubscribed_chat_gets_no_reminder() {
        let source = Arc::new(StaticContestSource::default());
        let sink = Arc::new(RecordingSink::default());
        let notifier = notifier(source, sink.clone(), Subscribers::new());
        notifier.subscribe(ChatId(10));
        assert!(notifier.unsubscribe(ChatId(10)));
        assert!(!notifier.unsubscribe(ChatId(10)));

        notifier.remind(&contest(5, 1, Duration::hours(2)), now()).await;
        assert!(sink.sent().is_empty());
    }
}

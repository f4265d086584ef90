//! Subscribed chats.

use dashmap::DashSet;
use std::sync::Arc;
use teloxide::types::ChatId;

/// Set of chats that receive reminders. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct Subscribers {
    chats: Arc<DashSet<i64>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the chat was already subscribed.
    pub fn add(&self, chat_id: ChatId) -> bool {
        self.chats.insert(chat_id.0)
    }

    /// Returns false if the chat was not subscribed.
    pub fn remove(&self, chat_id: ChatId) -> bool {
        self.chats.remove(&chat_id.0).is_some()
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.chats.contains(&chat_id.0)
    }

    /// Snapshot of all subscribed chats, ascending by id.
    pub fn list(&self) -> Vec<ChatId> {
        let mut ids: Vec<i64> = self.chats.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids.into_iter().map(ChatId).collect()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

impl FromIterator<i64> for Subscribers {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let subscribers = Subscribers::new();
        for id in iter {
            subscribers.add(ChatId(id));
        }
        subscribers
    }
}

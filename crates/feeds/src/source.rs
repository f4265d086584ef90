//! Contest source abstraction.

use crate::{ContestQuery, FeedError};
use async_trait::async_trait;
use contest_core::Contest;
use std::sync::Mutex;

/// Anything that can answer a contest query.
#[async_trait]
pub trait ContestSource: Send + Sync {
    /// Contests matching the query, ordered by start.
    async fn fetch_contests(&self, query: &ContestQuery) -> Result<Vec<Contest>, FeedError>;
}

/// In-memory contest source for testing and dry runs.
#[derive(Default)]
pub struct StaticContestSource {
    contests: Vec<Contest>,
    should_fail: bool,
    queries: Mutex<Vec<ContestQuery>>,
}

impl StaticContestSource {
    pub fn new(contests: Vec<Contest>) -> Self {
        Self {
            contests,
            ..Default::default()
        }
    }

    /// A source whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<ContestQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContestSource for StaticContestSource {
    async fn fetch_contests(&self, query: &ContestQuery) -> Result<Vec<Contest>, FeedError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if self.should_fail {
            return Err(FeedError::Http(503));
        }

        let mut contests: Vec<Contest> = self
            .contests
            .iter()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        contests.sort_by_key(|c| c.start);
        Ok(contests)
    }
}

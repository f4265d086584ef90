//! clist.by REST client.
//!
//! Queries `GET /api/v1/contest/` for contests hosted on a fixed set of
//! resources whose start lies inside a time window.

use crate::{ContestSource, FeedError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use contest_core::{format_clist_time, Contest, ResourceId};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

/// API credentials for clist.by.
#[derive(Clone)]
pub struct ClistCredentials {
    pub username: String,
    pub api_key: String,
}

impl ClistCredentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for ClistCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClistCredentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Contest filter sent to clist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestQuery {
    /// Resources to include, sent in this order.
    pub resource_ids: Vec<ResourceId>,
    /// Exclusive lower bound on the start time.
    pub start_after: DateTime<Utc>,
    /// Exclusive upper bound on the start time.
    pub start_before: DateTime<Utc>,
}

impl ContestQuery {
    /// Contests starting within `window` after `now`.
    /// A window past chrono's range is clamped to the latest representable time.
    pub fn upcoming(resource_ids: &[ResourceId], now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            resource_ids: resource_ids.to_vec(),
            start_after: now,
            start_before: now
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Comma separated resource ids, e.g. `1,2,63`.
    pub fn resource_filter(&self) -> String {
        self.resource_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether a contest satisfies this filter.
    pub fn matches(&self, contest: &Contest) -> bool {
        self.resource_ids.contains(&contest.resource.id)
            && contest.start > self.start_after
            && contest.start < self.start_before
    }

    fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("resource__id__in", self.resource_filter()),
            ("start__gt", format_clist_time(&self.start_after)),
            ("start__lt", format_clist_time(&self.start_before)),
            ("order_by", "start".to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct ContestPage {
    objects: Vec<Contest>,
}

/// Decode a clist contest listing body.
pub fn parse_contest_page(body: &str) -> Result<Vec<Contest>, FeedError> {
    let page: ContestPage = serde_json::from_str(body)?;
    Ok(page.objects)
}

/// clist.by contest API client.
pub struct ClistClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: ClistCredentials,
}

impl ClistClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://clist.by/api/v1/contest/";

    pub fn new(credentials: ClistCredentials) -> Result<Self, FeedError> {
        Self::with_base_url(credentials, Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: ClistCredentials, base_url: &str) -> Result<Self, FeedError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FeedError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full request URL for a query, credentials included.
    pub fn request_url(&self, query: &ContestQuery) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("username", &self.credentials.username);
            pairs.append_pair("api_key", &self.credentials.api_key);
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }

    /// Fetch all contests matching the query, in start order.
    pub async fn fetch(&self, query: &ContestQuery) -> Result<Vec<Contest>, FeedError> {
        debug!(
            resources = %query.resource_filter(),
            from = %query.start_after,
            to = %query.start_before,
            "Querying clist"
        );

        let response = self.client.get(self.request_url(query)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::from_status(status.as_u16()));
        }

        let body = response.text().await?;
        let contests = parse_contest_page(&body)?;

        debug!("clist: fetched {} contests", contests.len());
        Ok(contests)
    }
}

#[async_trait]
impl ContestSource for ClistClient {
    async fn fetch_contests(&self, query: &ContestQuery) -> Result<Vec<Contest>, FeedError> {
        self.fetch(query).await
    }
}

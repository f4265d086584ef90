//! Contest entries as reported by clist.by.

use crate::time::clist_time;
use chrono::{DateTime, Duration, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Identifier of a contest host platform on clist (e.g. 1 = Codeforces).
pub type ResourceId = u32;

/// Contest host platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Host name, e.g. "codeforces.com"
    #[serde(default)]
    pub name: CompactString,
}

impl Resource {
    pub fn new(id: ResourceId, name: &str) -> Self {
        Self {
            id,
            name: CompactString::new(name),
        }
    }
}

/// One contest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    /// clist contest id
    pub id: u64,
    /// Contest title
    pub event: String,
    #[serde(with = "clist_time")]
    pub start: DateTime<Utc>,
    #[serde(with = "clist_time")]
    pub end: DateTime<Utc>,
    /// Link to the contest page
    pub href: String,
    #[serde(default)]
    pub resource: Resource,
}

impl Contest {
    pub fn new(
        id: u64,
        event: impl Into<String>,
        href: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event: event.into(),
            start,
            end,
            href: href.into(),
            resource: Resource::default(),
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = resource;
        self
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Time left until the contest starts (negative once running).
    #[inline]
    pub fn starts_in(&self, now: DateTime<Utc>) -> Duration {
        self.start - now
    }

    #[inline]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start <= now
    }
}

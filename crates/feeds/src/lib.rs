//! Contest listings from clist.by.
//!
//! This crate provides the REST client that queries the clist contest
//! endpoint for a fixed set of resources.
//!
//! ## Architecture
//!
//! - `clist` - Query building, HTTP transport and response decoding
//! - `source` - `ContestSource` trait the notifier polls through
//! - `error` - `FeedError`

pub mod clist;
pub mod error;
pub mod source;

pub use clist::*;
pub use error::*;
pub use source::*;

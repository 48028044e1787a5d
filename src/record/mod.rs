//! Collected post records
//!
//! This module defines the persisted record shape and everything needed to
//! turn raw API payloads into it:
//! - `Record`: the immutable, persisted post row
//! - `RawPost` / `SearchPage`: the tolerant wire shapes returned by the API
//! - Timestamp parsing for the API's `createdAt` format

mod payload;
mod timestamp;

pub use payload::{normalize_counter, RawPost, SearchPage};
pub use timestamp::{format_created_at, month_key_of, parse_created_at, CREATED_AT_FORMAT};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Column order of the persisted/exported record set
pub const FIELDS: [&str; 9] = [
    "id",
    "createdAt",
    "text",
    "retweetCount",
    "replyCount",
    "likeCount",
    "quoteCount",
    "viewCount",
    "bookmarkCount",
];

/// A single collected post
///
/// `created_at` keeps the exact string the API returned so exports stay
/// byte-compatible with the upstream format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub text: String,
    #[serde(rename = "retweetCount")]
    pub retweet_count: u64,
    #[serde(rename = "replyCount")]
    pub reply_count: u64,
    #[serde(rename = "likeCount")]
    pub like_count: u64,
    #[serde(rename = "quoteCount")]
    pub quote_count: u64,
    #[serde(rename = "viewCount")]
    pub view_count: u64,
    #[serde(rename = "bookmarkCount")]
    pub bookmark_count: u64,
}

impl Record {
    /// Parses the creation timestamp, keeping its explicit offset
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_created_at(&self.created_at)
    }

    /// The `YYYY-MM` month this record was created in
    pub fn month_key(&self) -> Option<String> {
        month_key_of(&self.created_at)
    }
}

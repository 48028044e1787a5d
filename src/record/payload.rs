//! Wire shapes of the search API
//!
//! Payloads are decoded leniently: counters may be missing, `null`, strings or
//! floats, and identities may arrive as strings or numbers. Only the overall
//! page structure is strict; a body that does not match it is a malformed
//! response.

use crate::record::Record;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tweets: Vec<RawPost>,

    #[serde(default)]
    pub has_next_page: Option<bool>,

    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl SearchPage {
    /// The cursor of the following page, if the API says there is one
    pub fn next_page_cursor(&self) -> Option<&str> {
        match (self.has_next_page, self.next_cursor.as_deref()) {
            (Some(true), Some(cursor)) if !cursor.is_empty() => Some(cursor),
            _ => None,
        }
    }
}

/// A raw post payload as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(rename = "retweetCount", default)]
    pub retweet_count: Option<Value>,

    #[serde(rename = "replyCount", default)]
    pub reply_count: Option<Value>,

    #[serde(rename = "likeCount", default)]
    pub like_count: Option<Value>,

    #[serde(rename = "quoteCount", default)]
    pub quote_count: Option<Value>,

    #[serde(rename = "viewCount", default)]
    pub view_count: Option<Value>,

    #[serde(rename = "bookmarkCount", default)]
    pub bookmark_count: Option<Value>,
}

impl RawPost {
    /// Returns the post identity, or `None` if it is missing or blank
    pub fn identity(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Converts the payload into a record with normalized counters
    ///
    /// Returns `None` when the payload has no usable identity.
    pub fn into_record(self) -> Option<Record> {
        let id = self.identity()?;

        Some(Record {
            id,
            created_at: self.created_at.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            retweet_count: normalize_counter(self.retweet_count.as_ref()),
            reply_count: normalize_counter(self.reply_count.as_ref()),
            like_count: normalize_counter(self.like_count.as_ref()),
            quote_count: normalize_counter(self.quote_count.as_ref()),
            view_count: normalize_counter(self.view_count.as_ref()),
            bookmark_count: normalize_counter(self.bookmark_count.as_ref()),
        })
    }
}

/// Coerces an engagement counter to a non-negative integer
///
/// Missing, `null`, negative and non-numeric values become 0. Floats are
/// truncated and numeric strings are parsed.
pub fn normalize_counter(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

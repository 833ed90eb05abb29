//! Data models for the word wall
//!
//! Defines the core data structure: an `Entry`, one user-submitted text unit,
//! together with its opaque identifier. Field names follow the item store's
//! JSON representation (`id`, `content`, `date_created`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Width of the glyph marker rendered in front of every entry
pub const GLYPH_WIDTH: usize = 1;

/// Character appended after every entry's content
pub const SEPARATOR: char = ' ';

/// Opaque, stable identifier for an entry
///
/// The item store hands out numeric ids for some collections and string ids
/// for others; both are kept as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EntryId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Unsigned(n) => EntryId(n.to_string()),
            RawId::Signed(n) => EntryId(n.to_string()),
            RawId::Text(s) => EntryId(s),
        })
    }
}

/// One submitted text unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Unique identifier
    pub id: EntryId,
    /// Author-supplied text, immutable once created
    pub content: String,
    /// When the entry was created (absent sorts as epoch 0)
    #[serde(
        rename = "date_created",
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an entry without a creation time
    pub fn new(id: impl Into<EntryId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            created_at: None,
        }
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Ordering key: creation time in milliseconds, 0 when unknown
    pub fn sort_key(&self) -> i64 {
        self.created_at
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }

    /// Number of characters in the content
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Length of the fully revealed entry: glyph, content and separator
    pub fn full_length(&self) -> usize {
        GLYPH_WIDTH + self.char_len() + 1
    }

    /// Content followed by the separator, as laid out on the wall
    pub fn display_text(&self) -> String {
        let mut text = String::with_capacity(self.content.len() + 1);
        text.push_str(&self.content);
        text.push(SEPARATOR);
        text
    }
}

/// Accept RFC 3339 timestamps, treat anything unparseable as absent
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }))
}

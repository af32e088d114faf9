//! # News item
//! Canonical, immutable record shared by every stage of the pipeline.
//!
//! Identity is derived: the content fingerprint is a digest of the text and is
//! never stored next to the item. On disk an item is the same small JSON
//! object external consumers already read: `{"content", "datetime", "tag"}`.

use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Civil time layout used for `datetime` on the wire and in snapshots.
pub const CIVIL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsItem {
    pub content: String,
    #[serde(rename = "datetime", with = "civil_time")]
    pub published_at: NaiveDateTime,
    /// Vendor marker (importance color, topic id, ...). Older dumps call it `color`.
    #[serde(default, alias = "color", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl NewsItem {
    pub fn new(content: impl Into<String>, published_at: NaiveDateTime) -> Self {
        Self {
            content: content.into(),
            published_at,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Digest of the content only; equal fingerprints mean the same item.
    pub fn fingerprint(&self) -> String {
        hex_digest(self.content.as_bytes())
    }

    /// Digest of `content|datetime`, used to identify change events.
    pub fn event_fingerprint(&self) -> String {
        let key = format!(
            "{}|{}",
            self.content,
            self.published_at.format(CIVIL_FORMAT)
        );
        hex_digest(key.as_bytes())
    }
}

pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// First 10 hex chars of a fingerprint; enough to correlate log lines.
pub(crate) fn short(fingerprint: &str) -> &str {
    fingerprint.get(..10).unwrap_or(fingerprint)
}

/// Current wall clock expressed as civil time at `offset`.
pub fn civil_now(offset: FixedOffset) -> NaiveDateTime {
    Utc::now().with_timezone(&offset).naive_local()
}

pub(crate) mod civil_time {
    use super::CIVIL_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(CIVIL_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), CIVIL_FORMAT).map_err(serde::de::Error::custom)
    }
}

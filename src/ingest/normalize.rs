// src/ingest/normalize.rs
//! Raw vendor records → canonical [`NewsItem`]s.
//!
//! A record that cannot be normalized is dropped and logged; it never fails
//! the batch it arrived in.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::{RawItem, SourceTime};
use crate::news::{NewsItem, CIVIL_FORMAT};

const MAX_CONTENT_CHARS: usize = 1500;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unparseable publish time {0:?}")]
    Timestamp(String),
    #[error("content is empty after cleanup")]
    EmptyContent,
}

/// Clean up vendor text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    // 3) “ ” « » → ", ‘ ’ → '
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. NBSP and ideographic space)
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"[\s\u{00A0}\u{3000}]+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_CONTENT_CHARS {
        out = out.chars().take(MAX_CONTENT_CHARS).collect();
    }

    out
}

/// Resolve a vendor time into civil time at `offset`.
pub fn parse_source_time(
    t: &SourceTime,
    offset: FixedOffset,
) -> Result<NaiveDateTime, NormalizeError> {
    match t {
        SourceTime::Unix(secs) => from_unix(*secs, offset)
            .ok_or_else(|| NormalizeError::Timestamp(secs.to_string())),
        SourceTime::Text(raw) => {
            let s = raw.trim();
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, CIVIL_FORMAT) {
                return Ok(dt);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&offset).naive_local());
            }
            if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
                return Ok(dt.with_timezone(&offset).naive_local());
            }
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                if let Some(dt) = s.parse::<i64>().ok().and_then(|x| from_unix(x, offset)) {
                    return Ok(dt);
                }
            }
            Err(NormalizeError::Timestamp(s.to_string()))
        }
    }
}

fn from_unix(secs: i64, offset: FixedOffset) -> Option<NaiveDateTime> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&offset).naive_local())
}

pub fn normalize_item(raw: RawItem, offset: FixedOffset) -> Result<NewsItem, NormalizeError> {
    let published_at = parse_source_time(&raw.published, offset)?;
    let content = normalize_text(&raw.content);
    if content.is_empty() {
        return Err(NormalizeError::EmptyContent);
    }
    let tag = raw.tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    Ok(NewsItem {
        content,
        published_at,
        tag,
    })
}

/// Normalize a whole batch. Returns the kept items and how many were dropped.
pub fn normalize_batch(raw: Vec<RawItem>, offset: FixedOffset) -> (Vec<NewsItem>, usize) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for it in raw {
        let source = it.source.clone();
        match normalize_item(it, offset) {
            Ok(item) => kept.push(item),
            Err(e) => {
                dropped += 1;
                tracing::warn!(target: "ingest", source = %source, error = %e, "item dropped");
            }
        }
    }
    if dropped > 0 {
        counter!("ingest_dropped_total").increment(dropped as u64);
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn normalize_text_strips_markup_and_folds_ws() {
        let s = "  <p>央行&nbsp;&nbsp;<b>降准</b></p>\n\t&ldquo;0.5个百分点&rdquo;  ";
        assert_eq!(normalize_text(s), "央行 降准 \"0.5个百分点\"");
    }

    #[test]
    fn normalize_text_keeps_comparison_signs() {
        assert_eq!(normalize_text("PMI < 50 and CPI > 2"), "PMI < 50 and CPI > 2");
    }

    #[test]
    fn unix_seconds_become_civil_time_at_offset() {
        // 2025-03-14 01:30:00 UTC
        let dt = parse_source_time(&SourceTime::Unix(1_741_915_800), cst()).unwrap();
        assert_eq!(dt.format(CIVIL_FORMAT).to_string(), "2025-03-14 09:30:00");
    }

    #[test]
    fn text_shapes_are_accepted() {
        let civil = SourceTime::Text("2025-03-14 09:30:00".into());
        let rfc3339 = SourceTime::Text("2025-03-14T01:30:00Z".into());
        let rfc2822 = SourceTime::Text("Fri, 14 Mar 2025 01:30:00 +0000".into());
        let digits = SourceTime::Text("1741915800".into());
        for t in [civil, rfc3339, rfc2822, digits] {
            let dt = parse_source_time(&t, cst()).unwrap();
            assert_eq!(dt.format(CIVIL_FORMAT).to_string(), "2025-03-14 09:30:00", "{t:?}");
        }
    }

    #[test]
    fn bad_times_are_errors() {
        assert!(parse_source_time(&SourceTime::Text("yesterday".into()), cst()).is_err());
        assert!(parse_source_time(&SourceTime::Text(String::new()), cst()).is_err());
        assert!(parse_source_time(&SourceTime::Unix(0), cst()).is_err());
    }

    #[test]
    fn batch_drops_bad_items_without_failing() {
        let raw = vec![
            RawItem::new("t", "ok", SourceTime::Text("2025-03-14 09:30:00".into())),
            RawItem::new("t", "bad time", SourceTime::Text("??".into())),
            RawItem::new("t", "<br/>", SourceTime::Text("2025-03-14 09:30:00".into())),
        ];
        let (kept, dropped) = normalize_batch(raw, cst());
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(kept[0].content, "ok");
    }

    #[test]
    fn blank_tag_is_none() {
        let raw = RawItem::new("t", "x", SourceTime::Unix(1_741_915_800)).with_tag(Some("  ".into()));
        assert_eq!(normalize_item(raw, cst()).unwrap().tag, None);
    }
}

//! Retention filter: drops items older than the configured window.

use chrono::{Duration, NaiveDateTime};

use crate::news::NewsItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    window: Duration,
}

impl Retention {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn days(days: u32) -> Self {
        Self::new(Duration::days(i64::from(days)))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Items published at or before this instant are expired. A window
    /// reaching past the calendar's start expires nothing.
    pub fn cutoff(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.checked_sub_signed(self.window).unwrap_or(NaiveDateTime::MIN)
    }

    pub fn is_live(&self, item: &NewsItem, now: NaiveDateTime) -> bool {
        item.published_at > self.cutoff(now)
    }

    /// Keep items newer than the cutoff, preserving order.
    /// Returns the survivors and the number evicted.
    pub fn apply(&self, items: Vec<NewsItem>, now: NaiveDateTime) -> (Vec<NewsItem>, usize) {
        let before = items.len();
        let cutoff = self.cutoff(now);
        let kept: Vec<NewsItem> = items
            .into_iter()
            .filter(|it| it.published_at > cutoff)
            .collect();
        let evicted = before - kept.len();
        (kept, evicted)
    }
}

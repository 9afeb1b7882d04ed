//! Feed types for Krepsys.

use chrono::{DateTime, Utc};

/// A polled RSS/Atom feed.
#[derive(Debug, Clone)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Canonical feed URL (unique).
    pub url: String,
    /// Fetch interval in seconds.
    pub fetch_interval: i64,
    /// Last time the feed was successfully fetched. None means never fetched.
    pub last_fetched: Option<DateTime<Utc>>,
    /// Whether the feed is polled by the scheduler.
    pub is_active: bool,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
}

impl Feed {
    /// Check if the feed is due for a fetch at the given instant.
    ///
    /// A feed is due when it has never been fetched, or when at least
    /// `fetch_interval` seconds have elapsed since the last fetch
    /// (the boundary itself counts as due).
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_fetched {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(last);
                elapsed.num_seconds() >= self.fetch_interval
            }
        }
    }
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Canonical feed URL.
    pub url: String,
    /// Fetch interval in seconds. None means use the configured default.
    pub fetch_interval: Option<i64>,
}

impl NewFeed {
    /// Create a new feed request.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            fetch_interval: None,
        }
    }

    /// Set an explicit fetch interval.
    pub fn with_fetch_interval(mut self, interval: i64) -> Self {
        self.fetch_interval = Some(interval);
        self
    }
}

/// Feed update request (partial).
#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New fetch interval in seconds.
    pub fetch_interval: Option<i64>,
    /// Whether the feed is active.
    pub is_active: Option<bool>,
}

impl FeedUpdate {
    /// Create a new update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the fetch interval.
    pub fn with_fetch_interval(mut self, interval: i64) -> Self {
        self.fetch_interval = Some(interval);
        self
    }

    /// Enable the feed.
    pub fn enable(mut self) -> Self {
        self.is_active = Some(true);
        self
    }

    /// Disable the feed.
    pub fn disable(mut self) -> Self {
        self.is_active = Some(false);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.fetch_interval.is_none() && self.is_active.is_none()
    }
}

/// Parsed feed document: the normalized candidates extracted from one fetch.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Normalized entries; entries without a link have already been dropped.
    pub entries: Vec<ParsedEntry>,
}

/// A normalized article candidate produced by the entry normalizer.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    /// Entry link; the global dedup key.
    pub url: String,
    /// Entry title ("Untitled" when the source omits one).
    pub title: String,
    /// Author name.
    pub author: Option<String>,
    /// Entry body; full content when available, otherwise the summary.
    pub content: Option<String>,
    /// When the entry was published.
    pub published_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_feed(last_fetched: Option<DateTime<Utc>>, interval: i64) -> Feed {
        Feed {
            id: 1,
            name: "Test".to_string(),
            url: "https://example.com/feed.xml".to_string(),
            fetch_interval: interval,
            last_fetched,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_due_never_fetched() {
        let now = Utc::now();
        // Never fetched is due regardless of interval
        assert!(test_feed(None, 60).is_due(now));
        assert!(test_feed(None, 86400).is_due(now));
    }

    #[test]
    fn test_is_due_elapsed() {
        let now = Utc::now();
        let feed = test_feed(Some(now - Duration::seconds(901)), 900);
        assert!(feed.is_due(now));
    }

    #[test]
    fn test_is_due_inclusive_boundary() {
        let now = Utc::now();
        // Exactly at the interval counts as due
        let feed = test_feed(Some(now - Duration::seconds(900)), 900);
        assert!(feed.is_due(now));
    }

    #[test]
    fn test_is_due_not_elapsed() {
        let now = Utc::now();
        let feed = test_feed(Some(now - Duration::seconds(899)), 900);
        assert!(!feed.is_due(now));

        let recent = test_feed(Some(now), 900);
        assert!(!recent.is_due(now));
    }

    #[test]
    fn test_new_feed_builder() {
        let feed = NewFeed::new("Example", "https://example.com/feed.xml");
        assert_eq!(feed.name, "Example");
        assert!(feed.fetch_interval.is_none());

        let feed = feed.with_fetch_interval(1800);
        assert_eq!(feed.fetch_interval, Some(1800));
    }

    #[test]
    fn test_feed_update_empty() {
        assert!(FeedUpdate::new().is_empty());
        assert!(!FeedUpdate::new().with_name("x").is_empty());
        assert!(!FeedUpdate::new().disable().is_empty());
    }

    #[test]
    fn test_feed_update_enable_disable() {
        assert_eq!(FeedUpdate::new().enable().is_active, Some(true));
        assert_eq!(FeedUpdate::new().disable().is_active, Some(false));
    }
}

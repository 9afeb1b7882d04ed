//! Article, tag and highlight types for Krepsys.

use chrono::{DateTime, Utc};

/// A stored article.
#[derive(Debug, Clone)]
pub struct Article {
    /// Article ID.
    pub id: i64,
    /// Owning feed ID.
    pub feed_id: i64,
    /// Article title.
    pub title: String,
    /// Article URL (the global dedup key).
    pub url: String,
    /// Author name.
    pub author: Option<String>,
    /// Article body (HTML when the source provides it).
    pub content: Option<String>,
    /// Plain-text rendition of the body.
    pub content_text: Option<String>,
    /// When the article was published, per the source.
    pub published_at: Option<DateTime<Utc>>,
    /// When the article was ingested.
    pub fetched_at: DateTime<Utc>,
    /// Read flag.
    pub is_read: bool,
    /// Saved (read-later) flag.
    pub is_saved: bool,
    /// Archived flag.
    pub is_archived: bool,
    /// Reader note attached to the article.
    pub note: Option<String>,
}

/// New article for insertion.
#[derive(Debug, Clone)]
pub struct NewArticle {
    /// Owning feed ID.
    pub feed_id: i64,
    /// Article title.
    pub title: String,
    /// Article URL.
    pub url: String,
    /// Author name.
    pub author: Option<String>,
    /// Article body.
    pub content: Option<String>,
    /// Plain-text rendition of the body.
    pub content_text: Option<String>,
    /// When the article was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl NewArticle {
    /// Create a new article for the given feed.
    pub fn new(feed_id: i64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            author: None,
            content: None,
            content_text: None,
            published_at: None,
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the body content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the plain-text body.
    pub fn with_content_text(mut self, text: impl Into<String>) -> Self {
        self.content_text = Some(text.into());
        self
    }

    /// Set the published time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Article update request (partial).
///
/// The `note` field is doubly optional: `None` leaves the note alone,
/// `Some(None)` clears it, `Some(Some(text))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    /// Read flag.
    pub is_read: Option<bool>,
    /// Saved flag.
    pub is_saved: Option<bool>,
    /// Archived flag.
    pub is_archived: Option<bool>,
    /// Reader note.
    pub note: Option<Option<String>>,
}

impl ArticleUpdate {
    /// Create a new update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read flag.
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    /// Set the saved flag.
    pub fn with_saved(mut self, is_saved: bool) -> Self {
        self.is_saved = Some(is_saved);
        self
    }

    /// Set the archived flag.
    pub fn with_archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }

    /// Set the reader note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(Some(note.into()));
        self
    }

    /// Clear the reader note.
    pub fn clear_note(mut self) -> Self {
        self.note = Some(None);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.is_read.is_none()
            && self.is_saved.is_none()
            && self.is_archived.is_none()
            && self.note.is_none()
    }
}

/// Sort order for article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first (default). Undated articles sort last.
    #[default]
    Newest,
    /// Oldest first. Undated articles sort first.
    Oldest,
}

/// Article listing filter.
///
/// Absent fields match everything; each present field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    /// Restrict to one feed.
    pub feed_id: Option<i64>,
    /// Restrict by read flag.
    pub is_read: Option<bool>,
    /// Restrict by saved flag.
    pub is_saved: Option<bool>,
    /// Restrict by archived flag.
    pub is_archived: Option<bool>,
    /// Restrict to articles carrying this tag.
    pub tag_id: Option<i64>,
    /// Sort order.
    pub sort: SortOrder,
    /// Maximum number of rows.
    pub limit: Option<i64>,
    /// Offset into the result.
    pub offset: Option<i64>,
}

impl ArticleFilter {
    /// Create an empty filter (matches everything, newest first).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one feed.
    pub fn with_feed(mut self, feed_id: i64) -> Self {
        self.feed_id = Some(feed_id);
        self
    }

    /// Restrict by read flag.
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    /// Restrict by saved flag.
    pub fn with_saved(mut self, is_saved: bool) -> Self {
        self.is_saved = Some(is_saved);
        self
    }

    /// Restrict by archived flag.
    pub fn with_archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }

    /// Restrict to articles carrying this tag.
    pub fn with_tag(mut self, tag_id: i64) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    /// Set the sort order.
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Set a result limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set a result offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A tag.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Tag ID.
    pub id: i64,
    /// Tag name (unique).
    pub name: String,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
}

/// A highlight within an article.
#[derive(Debug, Clone)]
pub struct Highlight {
    /// Highlight ID.
    pub id: i64,
    /// Owning article ID.
    pub article_id: i64,
    /// Highlighted text.
    pub text: String,
    /// Highlight color.
    pub color: String,
    /// Note attached to the highlight.
    pub note: Option<String>,
    /// When the highlight was created.
    pub created_at: DateTime<Utc>,
}

/// New highlight for creation.
#[derive(Debug, Clone)]
pub struct NewHighlight {
    /// Owning article ID.
    pub article_id: i64,
    /// Highlighted text.
    pub text: String,
    /// Highlight color. None means the default color.
    pub color: Option<String>,
    /// Note attached to the highlight.
    pub note: Option<String>,
}

impl NewHighlight {
    /// Create a new highlight for the given article.
    pub fn new(article_id: i64, text: impl Into<String>) -> Self {
        Self {
            article_id,
            text: text.into(),
            color: None,
            note: None,
        }
    }

    /// Set the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Highlight update request (partial).
#[derive(Debug, Clone, Default)]
pub struct HighlightUpdate {
    /// New color.
    pub color: Option<String>,
    /// New note; `Some(None)` clears it.
    pub note: Option<Option<String>>,
}

impl HighlightUpdate {
    /// Create a new update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(Some(note.into()));
        self
    }

    /// Clear the note.
    pub fn clear_note(mut self) -> Self {
        self.note = Some(None);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.note.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_article_builder() {
        let article = NewArticle::new(1, "Title", "https://example.com/a")
            .with_author("Author")
            .with_content("<p>Body</p>")
            .with_published_at(Utc::now());

        assert_eq!(article.feed_id, 1);
        assert_eq!(article.title, "Title");
        assert_eq!(article.author, Some("Author".to_string()));
        assert!(article.published_at.is_some());
        assert!(article.content_text.is_none());
    }

    #[test]
    fn test_article_update_note_semantics() {
        // Absent: leave the note alone
        assert!(ArticleUpdate::new().note.is_none());
        // Set
        let set = ArticleUpdate::new().with_note("remember this");
        assert_eq!(set.note, Some(Some("remember this".to_string())));
        // Clear
        let clear = ArticleUpdate::new().clear_note();
        assert_eq!(clear.note, Some(None));
    }

    #[test]
    fn test_article_update_empty() {
        assert!(ArticleUpdate::new().is_empty());
        assert!(!ArticleUpdate::new().with_read(true).is_empty());
        assert!(!ArticleUpdate::new().clear_note().is_empty());
    }

    #[test]
    fn test_filter_builder() {
        let filter = ArticleFilter::new()
            .with_feed(3)
            .with_read(false)
            .with_sort(SortOrder::Oldest)
            .with_limit(10);

        assert_eq!(filter.feed_id, Some(3));
        assert_eq!(filter.is_read, Some(false));
        assert_eq!(filter.sort, SortOrder::Oldest);
        assert_eq!(filter.limit, Some(10));
        assert!(filter.is_saved.is_none());
    }

    #[test]
    fn test_sort_order_default_is_newest() {
        assert_eq!(SortOrder::default(), SortOrder::Newest);
        assert_eq!(ArticleFilter::new().sort, SortOrder::Newest);
    }

    #[test]
    fn test_highlight_builders() {
        let hl = NewHighlight::new(5, "quoted text").with_color("green");
        assert_eq!(hl.article_id, 5);
        assert_eq!(hl.color, Some("green".to_string()));
        assert!(hl.note.is_none());

        assert!(HighlightUpdate::new().is_empty());
        assert!(!HighlightUpdate::new().with_color("blue").is_empty());
    }
}

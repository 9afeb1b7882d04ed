//! Feed repository for Krepsys.

use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;

use crate::db::DbPool;
use crate::feed::types::{Feed, FeedUpdate, NewFeed};
use crate::{KrepsysError, Result};

/// Row type for a feed from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    name: String,
    url: String,
    fetch_interval: i64,
    last_fetched: Option<String>,
    is_active: bool,
    created_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            fetch_interval: row.fetch_interval,
            last_fetched: row.last_fetched.and_then(|s| parse_datetime(&s)),
            is_active: row.is_active,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

const FEED_COLUMNS: &str = "id, name, url, fetch_interval, last_fetched, is_active, created_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    pub async fn create(&self, feed: &NewFeed, fetch_interval: i64) -> Result<Feed> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feeds (name, url, fetch_interval)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(fetch_interval)
        .fetch_one(self.pool)
        .await
        .map_err(|e| KrepsysError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| KrepsysError::NotFound("feed".into()))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = $1");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// List all feeds (ordered by registration order).
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY id ASC");
        let rows = sqlx::query_as::<_, FeedRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// List all active feeds (ordered by registration order).
    pub async fn list_active(&self) -> Result<Vec<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE is_active = 1 ORDER BY id ASC");
        let rows = sqlx::query_as::<_, FeedRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// Update a feed (partial).
    pub async fn update(&self, id: i64, update: &FeedUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE feeds SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }

        if let Some(interval) = update.fetch_interval {
            separated.push("fetch_interval = ");
            separated.push_bind_unseparated(interval);
        }

        if let Some(is_active) = update.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Update last fetched timestamp to the current time.
    pub async fn update_last_fetched(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE feeds SET last_fetched = datetime('now') WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a feed. Owned articles are removed by the cascade.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feeds WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(count)
    }
}

/// Parse a stored datetime string to DateTime<Utc>.
///
/// Naive timestamps (the SQLite `datetime('now')` format) are treated as
/// UTC, so a `last_fetched` value without timezone metadata compares the
/// same as one with it.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_feed() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        let new_feed = NewFeed::new("Test Feed", "https://example.com/feed.xml");
        let feed = repo.create(&new_feed, 900).await.unwrap();

        assert!(feed.id > 0);
        assert_eq!(feed.name, "Test Feed");
        assert_eq!(feed.url, "https://example.com/feed.xml");
        assert_eq!(feed.fetch_interval, 900);
        assert!(feed.is_active);
        assert!(feed.last_fetched.is_none());
    }

    #[tokio::test]
    async fn test_get_feed_by_id_and_url() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        let created = repo
            .create(&NewFeed::new("Test", "https://example.com/feed.xml"), 900)
            .await
            .unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Test");

        let by_url = repo
            .get_by_url("https://example.com/feed.xml")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_url.id, created.id);

        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_url_rejected_by_index() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        let new_feed = NewFeed::new("First", "https://example.com/feed.xml");
        repo.create(&new_feed, 900).await.unwrap();

        let dup = NewFeed::new("Second", "https://example.com/feed.xml");
        let result = repo.create(&dup, 900).await;
        assert!(result.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_active_excludes_disabled() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        repo.create(&NewFeed::new("Feed 1", "https://example1.com/feed.xml"), 900)
            .await
            .unwrap();
        let feed2 = repo
            .create(&NewFeed::new("Feed 2", "https://example2.com/feed.xml"), 900)
            .await
            .unwrap();

        repo.update(feed2.id, &FeedUpdate::new().disable())
            .await
            .unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Feed 1");

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_feed() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        let feed = repo
            .create(&NewFeed::new("Test", "https://example.com/feed.xml"), 900)
            .await
            .unwrap();

        let update = FeedUpdate::new()
            .with_name("Updated Name")
            .with_fetch_interval(7200);
        assert!(repo.update(feed.id, &update).await.unwrap());

        let updated = repo.get_by_id(feed.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Updated Name");
        assert_eq!(updated.fetch_interval, 7200);

        // Empty update is a no-op
        assert!(!repo.update(feed.id, &FeedUpdate::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_last_fetched() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        let feed = repo
            .create(&NewFeed::new("Test", "https://example.com/feed.xml"), 900)
            .await
            .unwrap();
        assert!(feed.last_fetched.is_none());

        assert!(repo.update_last_fetched(feed.id).await.unwrap());

        let fetched = repo.get_by_id(feed.id).await.unwrap().unwrap();
        let last = fetched.last_fetched.expect("last_fetched should be set");
        let age = Utc::now().signed_duration_since(last).num_seconds();
        assert!((0..60).contains(&age));
    }

    #[tokio::test]
    async fn test_delete_feed() {
        let db = setup_db().await;
        let repo = FeedRepository::new(db.pool());

        let feed = repo
            .create(&NewFeed::new("Test", "https://example.com/feed.xml"), 900)
            .await
            .unwrap();

        assert!(repo.delete(feed.id).await.unwrap());
        assert!(repo.get_by_id(feed.id).await.unwrap().is_none());
        assert!(!repo.delete(feed.id).await.unwrap());
    }

    #[test]
    fn test_parse_datetime_rfc3339() {
        let dt = parse_datetime("2025-01-01T12:00:00Z").unwrap();
        assert_eq!(dt.timestamp(), 1735732800);

        // Offset form normalizes to UTC
        let offset = parse_datetime("2025-01-01T13:00:00+01:00").unwrap();
        assert_eq!(offset, dt);
    }

    #[test]
    fn test_parse_datetime_naive_treated_as_utc() {
        // SQLite's datetime('now') format carries no timezone; it must
        // compare equal to the same instant written as RFC3339 UTC
        let naive = parse_datetime("2025-01-01 12:00:00").unwrap();
        let explicit = parse_datetime("2025-01-01T12:00:00Z").unwrap();
        assert_eq!(naive, explicit);
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime("").is_none());
    }
}

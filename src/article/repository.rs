//! Article, tag and highlight repositories for Krepsys.

use chrono::Utc;
use sqlx::QueryBuilder;

use crate::article::types::{
    Article, ArticleFilter, ArticleUpdate, Highlight, HighlightUpdate, NewArticle, NewHighlight,
    SortOrder, Tag,
};
use crate::db::DbPool;
use crate::feed::repository::parse_datetime;
use crate::{KrepsysError, Result};

/// Row type for an article from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    feed_id: i64,
    title: String,
    url: String,
    author: Option<String>,
    content: Option<String>,
    content_text: Option<String>,
    published_at: Option<String>,
    fetched_at: String,
    is_read: bool,
    is_saved: bool,
    is_archived: bool,
    note: Option<String>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            url: row.url,
            author: row.author,
            content: row.content,
            content_text: row.content_text,
            published_at: row.published_at.and_then(|s| parse_datetime(&s)),
            fetched_at: parse_datetime(&row.fetched_at).unwrap_or_else(Utc::now),
            is_read: row.is_read,
            is_saved: row.is_saved,
            is_archived: row.is_archived,
            note: row.note,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, feed_id, title, url, author, content, content_text, \
                               published_at, fetched_at, is_read, is_saved, is_archived, note";

/// Repository for article operations.
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a batch of articles, skipping any whose URL is already stored.
    ///
    /// The whole batch runs in one transaction. `INSERT OR IGNORE` against
    /// the unique URL index makes the first writer win, both against rows
    /// already in the table and against duplicates within the batch itself.
    /// Returns the number of rows actually inserted.
    pub async fn insert_batch_if_new(&self, articles: &[NewArticle]) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        let mut inserted = 0usize;
        for article in articles {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO articles
                    (feed_id, title, url, author, content, content_text, published_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(article.feed_id)
            .bind(&article.title)
            .bind(&article.url)
            .bind(&article.author)
            .bind(&article.content)
            .bind(&article.content_text)
            .bind(article.published_at.map(|dt| dt.to_rfc3339()))
            .execute(&mut *tx)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(inserted)
    }

    /// Get an article by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(row.map(Article::from))
    }

    /// Get an article by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Article>> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(row.map(Article::from))
    }

    /// List articles matching the filter.
    pub async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE 1=1"));

        if let Some(feed_id) = filter.feed_id {
            query.push(" AND feed_id = ");
            query.push_bind(feed_id);
        }
        if let Some(is_read) = filter.is_read {
            query.push(" AND is_read = ");
            query.push_bind(is_read);
        }
        if let Some(is_saved) = filter.is_saved {
            query.push(" AND is_saved = ");
            query.push_bind(is_saved);
        }
        if let Some(is_archived) = filter.is_archived {
            query.push(" AND is_archived = ");
            query.push_bind(is_archived);
        }
        if let Some(tag_id) = filter.tag_id {
            query.push(" AND id IN (SELECT article_id FROM article_tags WHERE tag_id = ");
            query.push_bind(tag_id);
            query.push(")");
        }

        // Undated articles fall back on ingestion time, then ID, so the
        // ordering is total and stable
        match filter.sort {
            SortOrder::Newest => {
                query.push(
                    " ORDER BY published_at IS NULL ASC, published_at DESC, fetched_at DESC, id DESC",
                );
            }
            SortOrder::Oldest => {
                query.push(
                    " ORDER BY published_at IS NULL DESC, published_at ASC, fetched_at ASC, id ASC",
                );
            }
        }

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
            if let Some(offset) = filter.offset {
                query.push(" OFFSET ");
                query.push_bind(offset);
            }
        }

        let rows = query
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Update an article (partial).
    pub async fn update(&self, id: i64, update: &ArticleUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE articles SET ");
        let mut separated = query.separated(", ");

        if let Some(is_read) = update.is_read {
            separated.push("is_read = ");
            separated.push_bind_unseparated(is_read);
        }
        if let Some(is_saved) = update.is_saved {
            separated.push("is_saved = ");
            separated.push_bind_unseparated(is_saved);
        }
        if let Some(is_archived) = update.is_archived {
            separated.push("is_archived = ");
            separated.push_bind_unseparated(is_archived);
        }
        if let Some(ref note) = update.note {
            separated.push("note = ");
            separated.push_bind_unseparated(note.clone());
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

    /// Delete an article. Its tag links and highlights go with it.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count articles for a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(count)
    }
}

/// Row type for a tag from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    created_at: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for tag operations.
pub struct TagRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TagRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a tag. Fails with `Conflict` if the name is taken.
    pub async fn create(&self, name: &str) -> Result<Tag> {
        let id: i64 = sqlx::query_scalar("INSERT INTO tags (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    KrepsysError::Conflict(format!("tag '{name}' already exists"))
                } else {
                    KrepsysError::Database(e.to_string())
                }
            })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| KrepsysError::NotFound("tag".into()))
    }

    /// Get a tag by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query_as::<_, TagRow>("SELECT id, name, created_at FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(row.map(Tag::from))
    }

    /// List all tags ordered by name.
    pub async fn list_all(&self) -> Result<Vec<Tag>> {
        let rows =
            sqlx::query_as::<_, TagRow>("SELECT id, name, created_at FROM tags ORDER BY name ASC")
                .fetch_all(self.pool)
                .await
                .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Delete a tag. Its article links are removed by the cascade.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Attach a tag to an article. Attaching twice is a no-op.
    pub async fn attach(&self, article_id: i64, tag_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES ($1, $2)",
        )
        .bind(article_id)
        .bind(tag_id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                KrepsysError::NotFound("article or tag".into())
            } else {
                KrepsysError::Database(e.to_string())
            }
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Detach a tag from an article.
    pub async fn detach(&self, article_id: i64, tag_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM article_tags WHERE article_id = $1 AND tag_id = $2")
            .bind(article_id)
            .bind(tag_id)
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List tags attached to an article.
    pub async fn list_for_article(&self, article_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM tags t
            JOIN article_tags at ON at.tag_id = t.id
            WHERE at.article_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(article_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }
}

/// Row type for a highlight from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct HighlightRow {
    id: i64,
    article_id: i64,
    text: String,
    color: String,
    note: Option<String>,
    created_at: String,
}

impl From<HighlightRow> for Highlight {
    fn from(row: HighlightRow) -> Self {
        Highlight {
            id: row.id,
            article_id: row.article_id,
            text: row.text,
            color: row.color,
            note: row.note,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

const HIGHLIGHT_COLUMNS: &str = "id, article_id, text, color, note, created_at";

/// Allowed highlight colors.
pub const HIGHLIGHT_COLORS: &[&str] = &["yellow", "green", "blue", "pink"];

/// Default highlight color.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "yellow";

fn validate_color(color: &str) -> Result<()> {
    if HIGHLIGHT_COLORS.contains(&color) {
        Ok(())
    } else {
        Err(KrepsysError::Validation(format!(
            "unsupported highlight color: {color}"
        )))
    }
}

/// Repository for highlight operations.
pub struct HighlightRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> HighlightRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a highlight. Fails with `NotFound` if the article is missing.
    pub async fn create(&self, highlight: &NewHighlight) -> Result<Highlight> {
        let color = highlight.color.as_deref().unwrap_or(DEFAULT_HIGHLIGHT_COLOR);
        validate_color(color)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO highlights (article_id, text, color, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(highlight.article_id)
        .bind(&highlight.text)
        .bind(color)
        .bind(&highlight.note)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                KrepsysError::NotFound("article".into())
            } else {
                KrepsysError::Database(e.to_string())
            }
        })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| KrepsysError::NotFound("highlight".into()))
    }

    /// Get a highlight by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Highlight>> {
        let query = format!("SELECT {HIGHLIGHT_COLUMNS} FROM highlights WHERE id = $1");
        let row = sqlx::query_as::<_, HighlightRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(row.map(Highlight::from))
    }

    /// List highlights for an article, in creation order.
    pub async fn list_for_article(&self, article_id: i64) -> Result<Vec<Highlight>> {
        let query = format!(
            "SELECT {HIGHLIGHT_COLUMNS} FROM highlights WHERE article_id = $1 ORDER BY id ASC"
        );
        let rows = sqlx::query_as::<_, HighlightRow>(&query)
            .bind(article_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Highlight::from).collect())
    }

    /// Update a highlight (partial).
    pub async fn update(&self, id: i64, update: &HighlightUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        if let Some(ref color) = update.color {
            validate_color(color)?;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE highlights SET ");
        let mut separated = query.separated(", ");

        if let Some(ref color) = update.color {
            separated.push("color = ");
            separated.push_bind_unseparated(color);
        }
        if let Some(ref note) = update.note {
            separated.push("note = ");
            separated.push_bind_unseparated(note.clone());
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

    /// Delete a highlight.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| KrepsysError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false)
}

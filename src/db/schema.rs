//! Database schema and migrations for Krepsys.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - feeds and articles
    r#"
-- Feeds table for polled RSS/Atom sources
CREATE TABLE feeds (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    url             TEXT NOT NULL UNIQUE,
    fetch_interval  INTEGER NOT NULL DEFAULT 900,   -- seconds, minimum 60
    last_fetched    TEXT,                           -- NULL means never fetched
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_feeds_is_active ON feeds(is_active);

-- Articles ingested from feeds; url is the global dedup key
CREATE TABLE articles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    feed_id       INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    url           TEXT NOT NULL UNIQUE,
    author        TEXT,
    content       TEXT,
    content_text  TEXT,
    published_at  TEXT,
    fetched_at    TEXT NOT NULL DEFAULT (datetime('now')),
    is_read       INTEGER NOT NULL DEFAULT 0,
    is_saved      INTEGER NOT NULL DEFAULT 0,
    is_archived   INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_articles_feed_id ON articles(feed_id);
CREATE INDEX idx_articles_published_at ON articles(published_at);
"#,
    // v2: Tags with article junction table
    r#"
CREATE TABLE tags (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE article_tags (
    article_id  INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    tag_id      INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (article_id, tag_id)
);

CREATE INDEX idx_article_tags_tag_id ON article_tags(tag_id);
"#,
    // v3: Highlights owned by articles
    r#"
CREATE TABLE highlights (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id  INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    text        TEXT NOT NULL,
    color       TEXT NOT NULL DEFAULT 'yellow',  -- yellow | green | blue | pink
    note        TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_highlights_article_id ON highlights(article_id);
"#,
    // v4: Per-article reader note
    r#"
ALTER TABLE articles ADD COLUMN note TEXT;
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_feed_tables() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE feeds"));
        assert!(first.contains("CREATE TABLE articles"));
        assert!(first.contains("fetch_interval"));
        assert!(first.contains("last_fetched"));
    }

    #[test]
    fn test_article_url_is_unique() {
        assert!(MIGRATIONS[0].contains("url             TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_articles_cascade_with_feed() {
        assert!(MIGRATIONS[0].contains("REFERENCES feeds(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        // Each migration should be non-empty and contain SQL keywords
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(
                migration.contains("CREATE TABLE")
                    || migration.contains("ALTER TABLE")
                    || migration.contains("CREATE INDEX")
            );
        }
    }

    #[test]
    fn test_tags_migration() {
        let tags = MIGRATIONS[1];
        assert!(tags.contains("CREATE TABLE tags"));
        assert!(tags.contains("CREATE TABLE article_tags"));
        assert!(tags.contains("PRIMARY KEY (article_id, tag_id)"));
    }

    #[test]
    fn test_highlights_migration() {
        let highlights = MIGRATIONS[2];
        assert!(highlights.contains("CREATE TABLE highlights"));
        assert!(highlights.contains("ON DELETE CASCADE"));
    }
}

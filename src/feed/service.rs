//! Feed service for Krepsys.
//!
//! Ties the fetcher and the repositories together: feed registration with
//! URL validation, the fetch-normalize-store pipeline, and the fire-and-
//! forget refresh used after creation and on manual refresh requests.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::article::repository::ArticleRepository;
use crate::article::types::NewArticle;
use crate::config::MIN_FETCH_INTERVAL_SECS;
use crate::db::Database;
use crate::feed::fetcher::{validate_url, FeedFetcher};
use crate::feed::repository::FeedRepository;
use crate::feed::types::{Feed, FeedUpdate, NewFeed, ParsedFeed};
use crate::{KrepsysError, Result};

/// Feed service.
#[derive(Clone)]
pub struct FeedService {
    db: Arc<Database>,
    fetcher: Arc<FeedFetcher>,
    default_interval: i64,
}

impl FeedService {
    /// Create a new feed service.
    pub fn new(db: Arc<Database>, fetcher: Arc<FeedFetcher>, default_interval: i64) -> Self {
        Self {
            db,
            fetcher,
            default_interval,
        }
    }

    /// Register a new feed.
    ///
    /// Validates the URL and the interval, rejects a URL that is already
    /// registered, then kicks off an immediate background fetch so the
    /// first articles appear without waiting for the next scheduler pass.
    pub async fn create_feed(&self, new_feed: NewFeed) -> Result<Feed> {
        validate_url(&new_feed.url)?;

        let interval = new_feed.fetch_interval.unwrap_or(self.default_interval);
        if interval < MIN_FETCH_INTERVAL_SECS as i64 {
            return Err(KrepsysError::Validation(format!(
                "fetch interval must be at least {MIN_FETCH_INTERVAL_SECS} seconds"
            )));
        }

        let repo = FeedRepository::new(self.db.pool());
        if repo.get_by_url(&new_feed.url).await?.is_some() {
            return Err(KrepsysError::Conflict(format!(
                "feed URL already registered: {}",
                new_feed.url
            )));
        }

        let feed = repo.create(&new_feed, interval).await?;
        info!("Registered feed {} ({})", feed.id, feed.url);

        self.spawn_fetch(feed.id, feed.url.clone());
        Ok(feed)
    }

    /// Request an immediate refresh of a feed.
    ///
    /// Returns as soon as the feed is confirmed to exist; the fetch itself
    /// runs in the background.
    pub async fn trigger_refresh(&self, feed_id: i64) -> Result<()> {
        let repo = FeedRepository::new(self.db.pool());
        let feed = repo
            .get_by_id(feed_id)
            .await?
            .ok_or_else(|| KrepsysError::NotFound("feed".into()))?;

        self.spawn_fetch(feed.id, feed.url);
        Ok(())
    }

    /// Fetch a feed and store its new articles.
    ///
    /// Per-feed failures never propagate: a transport or parse problem is
    /// logged and reported as zero new articles, and `last_fetched` stays
    /// untouched so the feed comes due again on the next pass. A fetch
    /// that succeeds, even with nothing new, refreshes `last_fetched`.
    pub async fn fetch(&self, feed_id: i64, url: &str) -> Result<usize> {
        match self.fetcher.fetch(url).await {
            Ok(parsed) => self.store_parsed(feed_id, parsed).await,
            Err(KrepsysError::FeedParse(e)) => {
                warn!("Feed {} ({}) returned an unparseable document: {}", feed_id, url, e);
                Ok(0)
            }
            Err(e) => {
                error!("Failed to fetch feed {} ({}): {}", feed_id, url, e);
                Ok(0)
            }
        }
    }

    /// Store the parsed entries for a feed and stamp `last_fetched`.
    pub async fn store_parsed(&self, feed_id: i64, parsed: ParsedFeed) -> Result<usize> {
        let candidates: Vec<NewArticle> = parsed
            .entries
            .into_iter()
            .map(|entry| {
                let mut article = NewArticle::new(feed_id, entry.title, entry.url);
                article.author = entry.author;
                article.content = entry.content;
                article.published_at = entry.published_at;
                article
            })
            .collect();

        let inserted = ArticleRepository::new(self.db.pool())
            .insert_batch_if_new(&candidates)
            .await?;

        if inserted > 0 {
            info!("Feed {}: stored {} new article(s)", feed_id, inserted);
        }

        FeedRepository::new(self.db.pool())
            .update_last_fetched(feed_id)
            .await?;

        Ok(inserted)
    }

    /// Get a feed by ID.
    pub async fn get_feed(&self, feed_id: i64) -> Result<Feed> {
        FeedRepository::new(self.db.pool())
            .get_by_id(feed_id)
            .await?
            .ok_or_else(|| KrepsysError::NotFound("feed".into()))
    }

    /// List all feeds.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.db.pool()).list_all().await
    }

    /// List active feeds.
    pub async fn list_active_feeds(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.db.pool()).list_active().await
    }

    /// Update a feed.
    pub async fn update_feed(&self, feed_id: i64, update: FeedUpdate) -> Result<Feed> {
        if let Some(interval) = update.fetch_interval {
            if interval < MIN_FETCH_INTERVAL_SECS as i64 {
                return Err(KrepsysError::Validation(format!(
                    "fetch interval must be at least {MIN_FETCH_INTERVAL_SECS} seconds"
                )));
            }
        }

        let repo = FeedRepository::new(self.db.pool());
        if repo.get_by_id(feed_id).await?.is_none() {
            return Err(KrepsysError::NotFound("feed".into()));
        }

        repo.update(feed_id, &update).await?;
        self.get_feed(feed_id).await
    }

    /// Delete a feed and all of its articles.
    pub async fn delete_feed(&self, feed_id: i64) -> Result<()> {
        let deleted = FeedRepository::new(self.db.pool()).delete(feed_id).await?;
        if !deleted {
            return Err(KrepsysError::NotFound("feed".into()));
        }
        info!("Deleted feed {}", feed_id);
        Ok(())
    }

    /// Spawn a background fetch for one feed. Errors stay in the logs.
    fn spawn_fetch(&self, feed_id: i64, url: String) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.fetch(feed_id, &url).await {
                error!("Background fetch for feed {} failed: {}", feed_id, e);
            }
        });
    }
}

//! Periodic feed scheduler for Krepsys.
//!
//! A single loop wakes on a fixed tick, reads the active feeds fresh from
//! the database, and fetches the ones that are due. Feeds are fetched
//! sequentially; one bad feed never blocks the rest of the pass.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::feed::service::FeedService;
use crate::Result;

/// Periodic feed scheduler.
pub struct FeedScheduler {
    service: FeedService,
    tick_interval: Duration,
}

impl FeedScheduler {
    /// Create a new scheduler.
    pub fn new(service: FeedService, tick_interval: Duration) -> Self {
        Self {
            service,
            tick_interval,
        }
    }

    /// Run the scheduler until the shutdown signal flips to true.
    ///
    /// The first pass runs immediately; after that, one pass per tick.
    /// Shutdown is checked between passes, so the loop stops promptly
    /// without cutting a fetch in half.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Feed scheduler started (tick every {}s)",
            self.tick_interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("Scheduler pass failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Feed scheduler stopped");
    }

    /// Run one scheduler pass: fetch every active feed that is due.
    ///
    /// The feed list is read fresh each pass so newly added feeds and
    /// interval changes take effect without a restart. All due feeds are
    /// judged against one clock reading.
    pub async fn tick(&self) -> Result<usize> {
        let feeds = self.service.list_active_feeds().await?;
        let now = Utc::now();

        let due: Vec<_> = feeds.into_iter().filter(|f| f.is_due(now)).collect();
        if due.is_empty() {
            debug!("Scheduler pass: nothing due");
            return Ok(0);
        }

        debug!("Scheduler pass: {} feed(s) due", due.len());

        let mut fetched = 0usize;
        for feed in due {
            // fetch() absorbs transport and parse failures itself; anything
            // surfacing here is a database problem, logged per feed so the
            // rest of the pass still runs
            match self.service.fetch(feed.id, &feed.url).await {
                Ok(count) => {
                    fetched += 1;
                    if count > 0 {
                        debug!("Feed {}: {} new article(s)", feed.id, count);
                    }
                }
                Err(e) => {
                    error!("Feed {} failed during scheduler pass: {}", feed.id, e);
                }
            }
        }

        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::feed::fetcher::FeedFetcher;
    use crate::feed::repository::FeedRepository;
    use crate::feed::types::NewFeed;
    use crate::Database;
    use std::sync::Arc;

    async fn setup() -> (Arc<Database>, FeedScheduler) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let config = FetchConfig {
            connect_timeout_secs: 1,
            total_timeout_secs: 2,
            ..FetchConfig::default()
        };
        let fetcher = Arc::new(FeedFetcher::new(&config).unwrap());
        let service = FeedService::new(db.clone(), fetcher, 900);
        let scheduler = FeedScheduler::new(service, Duration::from_secs(60));
        (db, scheduler)
    }

    #[tokio::test]
    async fn test_tick_with_no_feeds() {
        let (_db, scheduler) = setup().await;
        assert_eq!(scheduler.tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tick_skips_feeds_not_due() {
        let (db, scheduler) = setup().await;
        let repo = FeedRepository::new(db.pool());

        // A freshly stamped feed is not due
        let feed = repo
            .create(&NewFeed::new("Fresh", "http://192.0.2.1:1/feed.xml"), 900)
            .await
            .unwrap();
        repo.update_last_fetched(feed.id).await.unwrap();

        assert_eq!(scheduler.tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tick_skips_inactive_feeds() {
        let (db, scheduler) = setup().await;
        let repo = FeedRepository::new(db.pool());

        let feed = repo
            .create(&NewFeed::new("Disabled", "http://192.0.2.1:1/feed.xml"), 900)
            .await
            .unwrap();
        repo.update(feed.id, &crate::feed::types::FeedUpdate::new().disable())
            .await
            .unwrap();

        // Never fetched, but inactive feeds are not polled
        assert_eq!(scheduler.tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tick_isolates_failing_feed() {
        let (db, scheduler) = setup().await;
        let repo = FeedRepository::new(db.pool());

        // Both feeds are due (never fetched); both are unreachable, and
        // the pass still visits every one of them
        repo.create(&NewFeed::new("Bad 1", "http://192.0.2.1:1/feed.xml"), 900)
            .await
            .unwrap();
        repo.create(&NewFeed::new("Bad 2", "http://192.0.2.2:1/feed.xml"), 900)
            .await
            .unwrap();

        let visited = scheduler.tick().await.unwrap();
        assert_eq!(visited, 2);

        // Transport failures never stamp last_fetched
        for feed in repo.list_all().await.unwrap() {
            assert!(feed.last_fetched.is_none());
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_db, scheduler) = setup().await;
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        // Give the first pass a moment, then signal shutdown
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop promptly")
            .unwrap();
    }
}

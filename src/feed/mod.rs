//! Feed subsystem: registration, fetching, and scheduled polling.

pub mod fetcher;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod types;

pub use fetcher::FeedFetcher;
pub use repository::FeedRepository;
pub use scheduler::FeedScheduler;
pub use service::FeedService;
pub use types::{Feed, FeedUpdate, NewFeed, ParsedEntry, ParsedFeed};

//! Feed fetching and entry normalization.
//!
//! This module downloads RSS/Atom documents with resource limits and turns
//! the parser output into normalized article candidates.

use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{KrepsysError, Result};
use crate::feed::types::{ParsedEntry, ParsedFeed};

/// Title used when an entry carries none.
const UNTITLED: &str = "Untitled";

/// User agent string for feed fetching.
const USER_AGENT: &str = "Krepsys/0.1 (Feed Reader)";

/// Feed fetcher with timeouts and size limits.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a new fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                KrepsysError::FeedTransport(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse a feed from the given URL.
    ///
    /// Transport problems (unreachable host, HTTP error status, oversized
    /// body) surface as `FeedTransport`; a fetched document that cannot be
    /// parsed surfaces as `FeedParse`.
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KrepsysError::FeedTransport(format!("failed to fetch feed: {e}")))?;

        if !response.status().is_success() {
            return Err(KrepsysError::FeedTransport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        // Check content length if available
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(KrepsysError::FeedTransport(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| KrepsysError::FeedTransport(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(KrepsysError::FeedTransport(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Validate a feed URL: must parse, use http(s) and have a host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| KrepsysError::Validation(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(KrepsysError::Validation(format!(
                "unsupported URL scheme: {scheme}"
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(KrepsysError::Validation("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse feed bytes into normalized entries.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)
        .map_err(|e| KrepsysError::FeedParse(format!("failed to parse feed: {e}")))?;

    let entries: Vec<ParsedEntry> = feed
        .entries
        .into_iter()
        .filter_map(normalize_entry)
        .collect();

    Ok(ParsedFeed { entries })
}

/// Normalize one parser entry into an article candidate.
///
/// Entries without a link are dropped (they cannot be deduplicated).
/// Full content is preferred over the summary; the published time is
/// optional and never fails the fetch.
pub fn normalize_entry(entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
    let url = entry.links.first().map(|l| l.href.clone())?;

    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let content = entry
        .content
        .and_then(|c| c.body)
        .or(entry.summary.map(|s| s.content));

    let author = entry.authors.first().map(|a| a.name.clone());

    Some(ParsedEntry {
        url,
        title,
        author,
        content,
        published_at: entry.published,
    })
}

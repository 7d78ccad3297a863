//! Sheet fetching with a short-lived in-memory cache.
//!
//! Downloads the published CSV export of the source sheet and parses it into
//! a [`Table`]. The last good table is reused for `cache_ttl` so that rapid
//! refreshes do not hit the network.

pub mod cache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::Table;

pub use cache::TtlCache;

/// Errors that can occur while fetching the sheet.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("Expected CSV but received {0}; is the sheet published?")]
    UnexpectedContentType(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sheet export is empty")]
    EmptyPayload,
}

/// Anything that can produce a sheet snapshot.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &str;

    /// Current snapshot, possibly memoized.
    async fn fetch(&self) -> Result<Arc<Table>, FetchError>;
}

/// Configuration for the sheet fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Published CSV export URL
    pub url: Url,

    /// How long a fetched table is reused
    pub cache_ttl: Duration,

    /// Maximum payload size to accept
    pub max_content_size: usize,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cache_ttl: Duration::from_secs(5),
            max_content_size: 10 * 1024 * 1024, // 10MB
            timeout: Duration::from_secs(30),
            user_agent: format!("ops-leaderboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Parse and validate a URL string.
    pub fn parse_url(raw: &str) -> Result<Url, FetchError> {
        let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, raw
            ))),
        }
    }
}

/// Published spreadsheet read over HTTP.
pub struct SheetSource {
    client: Client,
    config: FetcherConfig,
    cache: TtlCache<Arc<Table>>,
}

impl SheetSource {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("ops-leaderboard")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        let cache = TtlCache::new(config.cache_ttl);
        Ok(Self {
            client,
            config,
            cache,
        })
    }

    /// Download and parse, bypassing the cache.
    pub async fn fetch_fresh(&self) -> Result<Arc<Table>, FetchError> {
        let url = &self.config.url;
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        if let Some(ct) = content_type.as_deref() {
            if ct.starts_with("text/html") {
                return Err(FetchError::UnexpectedContentType(ct.to_string()));
            }
        }

        if let Some(size) = response.content_length() {
            if size > self.config.max_content_size as u64 {
                return Err(FetchError::ContentTooLarge {
                    size: size as usize,
                    max_size: self.config.max_content_size,
                });
            }
        }

        let content = response.bytes().await?;
        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }

        let table = Arc::new(parse_csv(&content)?);
        debug!(
            "Parsed {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            url
        );

        self.cache.put(table.clone()).await;
        Ok(table)
    }
}

#[async_trait]
impl DataSource for SheetSource {
    fn name(&self) -> &str {
        "sheet"
    }

    async fn fetch(&self) -> Result<Arc<Table>, FetchError> {
        if let Some((table, fetched_at)) = self.cache.get().await {
            debug!("Serving sheet from cache (fetched {})", fetched_at);
            return Ok(table);
        }
        self.fetch_fresh().await
    }
}

/// Parse a CSV export. Rows whose cells are all blank are dropped.
pub fn parse_csv(content: &[u8]) -> Result<Table, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(FetchError::EmptyPayload);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

/// Fixed snapshot, or a fixed failure, for tests.
#[cfg(test)]
pub struct StaticSource {
    result: std::sync::Mutex<Result<Arc<Table>, String>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl StaticSource {
    pub fn new(table: Table) -> Self {
        Self {
            result: std::sync::Mutex::new(Ok(Arc::new(table))),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn from_csv(csv: &str) -> Self {
        Self::new(parse_csv(csv.as_bytes()).unwrap())
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: std::sync::Mutex::new(Err(message.to_string())),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Make every later fetch fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.result.lock().unwrap() = Err(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl DataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Arc<Table>, FetchError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &*self.result.lock().unwrap() {
            Ok(table) => Ok(table.clone()),
            Err(message) => Err(FetchError::InvalidUrl(message.clone())),
        }
    }
}

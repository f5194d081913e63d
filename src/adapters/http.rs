//! HTTP JSON quote source
//!
//! Polls a venue's public market-data endpoint and locates each quote field
//! with a JSON pointer. A field may point into an order-book ladder, in which
//! case levels `0..ladder_depth` are walked and the last level that reads and
//! parses before the first gap is taken.
//!
//! Reads of one tick that target the same URL share a single fetched
//! document, so a venue's sell and buy quotes come from one snapshot.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::adapters::errors::{SourceError, SourceResult};
use crate::adapters::traits::QuoteSource;
use crate::config::constants::user_agent;
use crate::config::{FieldLocator, VenueConfig};
use crate::core::quote::{parse_price, QuoteSide};

/// Placeholder replaced by the level index in ladder pointers
const LADDER_PLACEHOLDER: &str = "{i}";

/// Default window in which a fetched document is reused by other reads
pub const DEFAULT_DOCUMENT_REUSE: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct FetchedDocument {
    fetched_at: Instant,
    document: Value,
}

/// Quote source backed by a JSON HTTP endpoint
///
/// The session is the HTTP client: `open` builds it and probes the venue URL,
/// `close` drops it. Reads on a closed source fail with `SessionClosed`.
pub struct HttpQuoteSource {
    venue: VenueConfig,
    request_timeout: Duration,
    document_reuse: Duration,
    client: Option<reqwest::Client>,
    documents: Mutex<HashMap<String, FetchedDocument>>,
}

impl HttpQuoteSource {
    pub fn new(venue: VenueConfig, request_timeout: Duration) -> Self {
        Self {
            venue,
            request_timeout,
            document_reuse: DEFAULT_DOCUMENT_REUSE,
            client: None,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// How long a fetched document serves further reads of the same URL
    ///
    /// Keep it below the poll interval so every tick sees a fresh document.
    pub fn with_document_reuse(mut self, window: Duration) -> Self {
        self.document_reuse = window;
        self
    }

    fn locator(&self, side: QuoteSide) -> &FieldLocator {
        match side {
            QuoteSide::Sell => &self.venue.sell,
            QuoteSide::Buy => &self.venue.buy,
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.request_timeout.as_millis() as u64
    }

    fn map_request_error(&self, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::NetworkTimeout(self.timeout_ms())
        } else {
            SourceError::Request(e.to_string())
        }
    }

    async fn fetch_json(&self, client: &reqwest::Client, url: &str) -> SourceResult<Value> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::InvalidResponse(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("invalid JSON from {}: {}", url, e)))
    }

    /// Fetch `url`, or reuse a document fetched within the reuse window
    ///
    /// The lock is held across the request so concurrent reads of the same
    /// tick wait for one fetch instead of issuing their own.
    async fn document(&self, client: &reqwest::Client, url: &str) -> SourceResult<Value> {
        let mut documents = self.documents.lock().await;
        if let Some(cached) = documents.get(url) {
            if cached.fetched_at.elapsed() < self.document_reuse {
                return Ok(cached.document.clone());
            }
        }

        let document = self.fetch_json(client, url).await?;
        documents.insert(
            url.to_string(),
            FetchedDocument {
                fetched_at: Instant::now(),
                document: document.clone(),
            },
        );
        Ok(document)
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn open(&mut self) -> SourceResult<()> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.request_timeout)
            .user_agent(user_agent())
            .tcp_nodelay(true)
            .build()
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        // Probe once so an unreachable venue fails at startup
        let response = client
            .get(&self.venue.url)
            .send()
            .await
            .map_err(|e| SourceError::ConnectionFailed(format!("{}: {}", self.venue.id, e)))?;

        if !response.status().is_success() {
            return Err(SourceError::ConnectionFailed(format!(
                "{}: probe returned HTTP {}",
                self.venue.id,
                response.status()
            )));
        }

        info!(
            venue = %self.venue.id,
            url = %self.venue.url,
            timeout_ms = self.timeout_ms(),
            "HTTP client configured"
        );
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> SourceResult<()> {
        self.client = None;
        self.documents.get_mut().clear();
        Ok(())
    }

    async fn read_field(&self, side: QuoteSide) -> SourceResult<Option<String>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SourceError::SessionClosed(self.venue.id.clone()))?;

        let locator = self.locator(side);
        let url = locator.url.as_deref().unwrap_or(&self.venue.url);
        let document = self.document(client, url).await?;

        let text = locate_field(&document, locator);
        if text.is_none() {
            debug!(venue = %self.venue.id, side = %side, pointer = %locator.pointer, "Field not found");
        }
        Ok(text)
    }

    fn is_open(&self) -> bool {
        self.client.is_some()
    }

    fn venue_name(&self) -> &str {
        &self.venue.id
    }
}

// =============================================================================
// Field location
// =============================================================================

/// Locate a field's raw text in a JSON document
///
/// A single locator returns whatever scalar sits at the pointer. A ladder
/// locator returns the deepest level that parses as a price before the
/// first level that is absent or unparseable.
pub fn locate_field(document: &Value, locator: &FieldLocator) -> Option<String> {
    match locator.ladder_depth {
        None => document.pointer(&locator.pointer).and_then(value_text),
        Some(depth) => {
            let mut last = None;
            for level in 0..depth {
                let pointer = locator.pointer.replace(LADDER_PLACEHOLDER, &level.to_string());
                match document.pointer(&pointer).and_then(value_text) {
                    Some(text) if parse_price(&text).is_ok() => last = Some(text),
                    _ => break,
                }
            }
            last
        }
    }
}

/// Scalar JSON value as text; venues quote prices as strings or numbers
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locator(pointer: &str, ladder_depth: Option<usize>) -> FieldLocator {
        FieldLocator {
            pointer: pointer.to_string(),
            ladder_depth,
            url: None,
        }
    }

    fn venue(url: &str) -> VenueConfig {
        VenueConfig {
            id: "mexc".to_string(),
            label: "MEXC Future".to_string(),
            url: url.to_string(),
            sell: locator("/data/asks/{i}/0", Some(20)),
            buy: locator("/data/bids/0/0", None),
        }
    }

    const BOOK: &str = r#"{"data":{"asks":[["0.00451","120"],["0.00452","80"],["0.00455","10"]],"bids":[[0.0045,"300"]]}}"#;

    #[test]
    fn test_locate_single_string_and_number() {
        let doc = json!({"last": {"sell": "101.5", "buy": 100.25}});
        assert_eq!(locate_field(&doc, &locator("/last/sell", None)), Some("101.5".to_string()));
        assert_eq!(locate_field(&doc, &locator("/last/buy", None)), Some("100.25".to_string()));
    }

    #[test]
    fn test_locate_missing_or_non_scalar() {
        let doc = json!({"last": {"sell": null, "nested": {"x": 1}}});
        assert_eq!(locate_field(&doc, &locator("/last/sell", None)), None);
        assert_eq!(locate_field(&doc, &locator("/last/nested", None)), None);
        assert_eq!(locate_field(&doc, &locator("/nope", None)), None);
    }

    #[test]
    fn test_ladder_takes_last_level_before_gap() {
        let doc = json!({"asks": [["1.1"], ["1.2"], ["--"], ["1.4"]]});
        assert_eq!(
            locate_field(&doc, &locator("/asks/{i}/0", Some(19))),
            Some("1.2".to_string())
        );
    }

    #[test]
    fn test_ladder_respects_depth() {
        let doc = json!({"asks": [["1.1"], ["1.2"], ["1.3"]]});
        assert_eq!(
            locate_field(&doc, &locator("/asks/{i}/0", Some(2))),
            Some("1.2".to_string())
        );
    }

    #[test]
    fn test_ladder_with_unreadable_first_level() {
        let doc = json!({"asks": [["n/a"], ["1.2"]]});
        assert_eq!(locate_field(&doc, &locator("/asks/{i}/0", Some(5))), None);
        assert_eq!(locate_field(&json!({}), &locator("/asks/{i}/0", Some(5))), None);
    }

    #[tokio::test]
    async fn test_read_before_open_is_session_closed() {
        let source = HttpQuoteSource::new(venue("http://127.0.0.1:1/"), Duration::from_millis(100));
        let err = source.read_field(QuoteSide::Buy).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(!source.is_open());
    }

    #[tokio::test]
    async fn test_open_and_read_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/depth")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BOOK)
            .create_async()
            .await;

        let url = format!("{}/api/v1/depth", server.url());
        let mut source = HttpQuoteSource::new(venue(&url), Duration::from_secs(2));
        source.open().await.unwrap();
        assert!(source.is_open());
        assert_eq!(source.venue_name(), "mexc");

        let sell = source.read_field(QuoteSide::Sell).await.unwrap();
        let buy = source.read_field(QuoteSide::Buy).await.unwrap();
        assert_eq!(sell.as_deref(), Some("0.00455"));
        assert_eq!(buy.as_deref(), Some("0.0045"));

        source.close().await.unwrap();
        assert!(!source.is_open());
        assert!(source.read_field(QuoteSide::Sell).await.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let mut server = mockito::Server::new_async().await;
        // One probe on open plus one document fetch for both slots
        let mock = server
            .mock("GET", "/depth")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BOOK)
            .expect(2)
            .create_async()
            .await;

        let mut source = HttpQuoteSource::new(
            venue(&format!("{}/depth", server.url())),
            Duration::from_secs(2),
        )
        .with_document_reuse(Duration::from_secs(5));
        source.open().await.unwrap();

        let (sell, buy) = tokio::join!(
            source.read_field(QuoteSide::Sell),
            source.read_field(QuoteSide::Buy)
        );
        assert_eq!(sell.unwrap().as_deref(), Some("0.00455"));
        assert_eq!(buy.unwrap().as_deref(), Some("0.0045"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_reuse_window_fetches_every_read() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/depth")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BOOK)
            .expect(3)
            .create_async()
            .await;

        let mut source = HttpQuoteSource::new(
            venue(&format!("{}/depth", server.url())),
            Duration::from_secs(2),
        )
        .with_document_reuse(Duration::ZERO);
        source.open().await.unwrap();

        source.read_field(QuoteSide::Sell).await.unwrap();
        source.read_field(QuoteSide::Buy).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_fails_when_probe_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let mut source =
            HttpQuoteSource::new(venue(&format!("{}/down", server.url())), Duration::from_secs(2));
        let err = source.open().await.unwrap_err();
        assert!(matches!(err, SourceError::ConnectionFailed(_)));
        assert!(!source.is_open());
    }

    #[tokio::test]
    async fn test_field_url_override_and_http_error_is_recoverable() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/ticker")
            .with_status(500)
            .create_async()
            .await;

        let mut config = venue(&format!("{}/health", server.url()));
        config.buy.url = Some(format!("{}/ticker", server.url()));
        let mut source = HttpQuoteSource::new(config, Duration::from_secs(2));
        source.open().await.unwrap();

        let err = source.read_field(QuoteSide::Buy).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse(_)));
        assert!(!err.is_fatal());

        // Sell still uses the venue URL, whose document has no asks
        assert_eq!(source.read_field(QuoteSide::Sell).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_json_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/depth")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let mut source =
            HttpQuoteSource::new(venue(&format!("{}/depth", server.url())), Duration::from_secs(2));
        source.open().await.unwrap();
        let err = source.read_field(QuoteSide::Buy).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse(_)));
    }
}

#![cfg(feature = "net")]

use crate::config::PriceConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Body returned by the price proxy; an unknown price serialises as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceResponse {
    /// USD per token, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl PriceResponse {
    /// Response carrying no price.
    pub fn unknown() -> Self {
        Self { price: None }
    }
}

/// Reasons a price lookup produced nothing.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("No API key")]
    /// No API key configured.
    MissingKey,
    #[error("API request failed with status: {0}")]
    /// Upstream answered with a non-success status.
    Status(u16),
    #[error("Price data not found in API response")]
    /// Body did not contain a usable price.
    Missing,
    #[error("Error during API request: {0}")]
    /// Transport or decode failure.
    Request(String),
}

/// Pull `data.<SYMBOL>.quote.USD.price` out of a quotes response.
///
/// A zero or negative price counts as missing.
pub fn extract_price(body: &Value, symbol: &str) -> Option<f64> {
    body.get("data")?
        .get(symbol)?
        .get("quote")?
        .get("USD")?
        .get("price")?
        .as_f64()
        .filter(|price| price.is_finite() && *price > 0.0)
}

/// Price upstream client.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: Client,
    cfg: PriceConfig,
}

impl PriceClient {
    /// Build a client with the configured timeout.
    pub fn new(cfg: PriceConfig) -> Result<Self, PriceError> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|err| PriceError::Request(err.to_string()))?;
        Ok(Self { http, cfg })
    }

    /// Fetch the price. Never fails: every error is logged and yields an unknown price.
    pub async fn fetch(&self) -> PriceResponse {
        match self.try_fetch().await {
            Ok(price) => PriceResponse { price: Some(price) },
            Err(err) => {
                log::error!("QSYS|mod=PRICE|evt=FALLBACK|symbol={}|err={err}", self.cfg.symbol);
                PriceResponse::unknown()
            }
        }
    }

    /// Fetch the price, surfacing the failure reason.
    pub async fn try_fetch(&self) -> Result<f64, PriceError> {
        let key = self.cfg.api_key.as_deref().ok_or(PriceError::MissingKey)?;
        let resp = self
            .http
            .get(&self.cfg.endpoint)
            .query(&[("symbol", self.cfg.symbol.as_str()), ("convert", "USD")])
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|err| PriceError::Request(err.to_string()))?;
        if !resp.status().is_success() {
            return Err(PriceError::Status(resp.status().as_u16()));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|err| PriceError::Request(err.to_string()))?;
        extract_price(&body, &self.cfg.symbol).ok_or(PriceError::Missing)
    }
}

/// Reuses the last successful price for the configured TTL.
///
/// Failures are not cached, so the next caller tries the upstream again.
#[derive(Debug)]
pub struct CachedPrice {
    client: PriceClient,
    slot: Mutex<Option<(Instant, f64)>>,
}

impl CachedPrice {
    /// Wrap `client` with an empty cache.
    pub fn new(client: PriceClient) -> Self {
        Self {
            client,
            slot: Mutex::new(None),
        }
    }

    /// Cached price if still fresh, otherwise a new lookup.
    pub async fn get(&self) -> PriceResponse {
        let mut slot = self.slot.lock().await;
        if let Some((fetched_at, price)) = *slot {
            if fetched_at.elapsed() < self.client.cfg.cache_ttl {
                return PriceResponse { price: Some(price) };
            }
        }
        let resp = self.client.fetch().await;
        if let Some(price) = resp.price {
            *slot = Some((Instant::now(), price));
        }
        resp
    }

    #[cfg(test)]
    async fn seed(&self, price: f64) {
        *self.slot.lock().await = Some((Instant::now(), price));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn unreachable_config() -> PriceConfig {
        PriceConfig {
            endpoint: "http://127.0.0.1:9/v1/cryptocurrency/quotes/latest".to_string(),
            timeout: Duration::from_millis(200),
            ..PriceConfig::default()
        }
    }

    #[test]
    fn extracts_nested_usd_price() {
        let body = json!({ "data": { "AVAIL": { "quote": { "USD": { "price": 0.0871 } } } } });
        assert_eq!(extract_price(&body, "AVAIL"), Some(0.0871));
        assert_eq!(extract_price(&body, "ETH"), None);
    }

    #[test]
    fn zero_or_malformed_price_is_missing() {
        let zero = json!({ "data": { "AVAIL": { "quote": { "USD": { "price": 0 } } } } });
        assert_eq!(extract_price(&zero, "AVAIL"), None);
        let text = json!({ "data": { "AVAIL": { "quote": { "USD": { "price": "0.08" } } } } });
        assert_eq!(extract_price(&text, "AVAIL"), None);
        assert_eq!(extract_price(&json!([]), "AVAIL"), None);
    }

    #[test]
    fn unknown_price_serialises_as_empty_object() {
        assert_eq!(
            serde_json::to_string(&PriceResponse::unknown()).unwrap(),
            "{}"
        );
        assert_eq!(
            serde_json::to_string(&PriceResponse { price: Some(1.5) }).unwrap(),
            r#"{"price":1.5}"#
        );
    }

    /// Serves `status` and `body` to every connection; returns the endpoint URL.
    async fn canned_upstream(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = vec![0u8; 8192];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/v1/cryptocurrency/quotes/latest")
    }

    fn keyed_config(endpoint: String) -> PriceConfig {
        PriceConfig {
            api_key: Some("test-key".to_string()),
            endpoint,
            timeout: Duration::from_secs(5),
            ..PriceConfig::default()
        }
    }

    #[tokio::test]
    async fn upstream_price_is_returned() {
        let endpoint = canned_upstream(
            "200 OK",
            r#"{"data":{"AVAIL":{"quote":{"USD":{"price":0.5}}}}}"#,
        )
        .await;
        let client = PriceClient::new(keyed_config(endpoint)).unwrap();
        assert_eq!(client.try_fetch().await.unwrap(), 0.5);
        assert_eq!(client.fetch().await, PriceResponse { price: Some(0.5) });
    }

    #[tokio::test]
    async fn error_status_degrades_to_unknown() {
        let endpoint = canned_upstream("500 Internal Server Error", "{}").await;
        let client = PriceClient::new(keyed_config(endpoint)).unwrap();
        assert!(matches!(
            client.try_fetch().await,
            Err(PriceError::Status(500))
        ));
        assert_eq!(client.fetch().await, PriceResponse::unknown());
    }

    #[tokio::test]
    async fn body_without_price_degrades_to_unknown() {
        let endpoint = canned_upstream("200 OK", r#"{"data":{}}"#).await;
        let client = PriceClient::new(keyed_config(endpoint)).unwrap();
        assert!(matches!(client.try_fetch().await, Err(PriceError::Missing)));
        assert_eq!(client.fetch().await, PriceResponse::unknown());

        let cache = CachedPrice::new(client);
        assert_eq!(cache.get().await, PriceResponse::unknown());
        assert!(cache.slot.lock().await.is_none());
    }

    #[tokio::test]
    async fn missing_key_degrades_to_unknown() {
        let client = PriceClient::new(unreachable_config()).unwrap();
        assert!(matches!(
            client.try_fetch().await,
            Err(PriceError::MissingKey)
        ));
        assert_eq!(client.fetch().await, PriceResponse::unknown());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_unknown() {
        let cfg = PriceConfig {
            api_key: Some("test-key".to_string()),
            ..unreachable_config()
        };
        let client = PriceClient::new(cfg).unwrap();
        assert!(matches!(
            client.try_fetch().await,
            Err(PriceError::Request(_))
        ));
        assert_eq!(client.fetch().await, PriceResponse::unknown());
    }

    #[tokio::test]
    async fn fresh_price_served_from_cache() {
        let cache = CachedPrice::new(PriceClient::new(unreachable_config()).unwrap());
        assert_eq!(cache.get().await, PriceResponse::unknown());
        cache.seed(0.25).await;
        assert_eq!(cache.get().await, PriceResponse { price: Some(0.25) });
    }
}

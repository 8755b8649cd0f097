use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, UPGRADE_INSECURE_REQUESTS,
};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use super::PageFetcher;

/// Why a single URL could not be fetched. Always recoverable: the caller
/// moves on to the next candidate.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Worth another attempt at the same URL.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Transport(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::Body(_) => false,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    config: ScraperConfig,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// Fetch a URL as text, retrying transient failures with backoff.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.polite_delay().await;

        let base = (self.config.request_delay_ms / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(base)
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.config.max_retries);

        let mut attempt = 0u32;
        RetryIf::start(
            strategy,
            move || {
                attempt += 1;
                debug!("GET {} (attempt {})", url, attempt);
                self.get_once(url)
            },
            |e: &FetchError| {
                let retry = e.is_transient();
                if retry {
                    warn!("Transient failure for {}: {}", url, e);
                }
                retry
            },
        )
        .await
    }

    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let total = Duration::from_millis(self.config.request_delay_ms)
            + jitter(Duration::from_millis(self.config.jitter_ms));
        if !total.is_zero() {
            sleep(total).await;
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.get_text(url).await
    }
}

/// Navigation headers a desktop Chrome sends; the upstream host rejects
/// requests without them.
fn browser_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    let extra = [
        ("sec-ch-ua", r#""Google Chrome";v="143", "Chromium";v="143", "Not A(Brand";v="24""#),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""Windows""#),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
    ];
    for (name, value) in extra {
        h.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(FetchError::Status(429).is_transient());
        assert!(!FetchError::Status(404).is_transient());
        assert!(!FetchError::Status(403).is_transient());
        assert!(!FetchError::Body("eof".into()).is_transient());
    }

    #[test]
    fn browser_headers_are_present() {
        let h = browser_headers();
        assert!(h.get(ACCEPT).unwrap().to_str().unwrap().starts_with("text/html"));
        assert_eq!(h.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(h.get(UPGRADE_INSECURE_REQUESTS).unwrap(), "1");
    }

    #[tokio::test]
    async fn invalid_url_fails_without_panicking() {
        let config = ScraperConfig {
            request_delay_ms: 0,
            jitter_ms: 0,
            max_retries: 0,
            ..ScraperConfig::default()
        };
        let client = HttpClient::new(&config).unwrap();
        assert!(client.fetch("not-a-url").await.is_err());
    }

    #[tokio::test]
    async fn refused_connection_is_retried_then_reported() {
        let config = ScraperConfig {
            request_delay_ms: 0,
            jitter_ms: 0,
            max_retries: 1,
            ..ScraperConfig::default()
        };
        let client = HttpClient::new(&config).unwrap();
        let err = client.get_text("http://127.0.0.1:1/").await.unwrap_err();
        assert!(err.is_transient(), "{:?}", err);
    }
}

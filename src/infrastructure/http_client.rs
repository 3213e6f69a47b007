//! HTTP transport for listing pages
//!
//! Issues one GET per call with a static browser identity, a random delay
//! before every attempt and a fixed cooldown after every failed attempt. The
//! caller gets either the full body or a terminal failure for that URL.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::{FetchOutcome, NetworkError};
use crate::infrastructure::config::TransportConfig;

/// Single-URL fetch with the retry policy applied inside.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// `reqwest`-backed transport. Built once and shared; its configuration does
/// not change after construction.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: TransportConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        let headers = Self::identity_headers(&config)?;

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .default_headers(headers)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn identity_headers(config: &TransportConfig) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept).context("Invalid Accept header")?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("Invalid Accept-Language header")?,
        );
        headers.insert(
            CONNECTION,
            HeaderValue::from_str(&config.connection).context("Invalid Connection header")?,
        );
        if config.upgrade_insecure_requests {
            headers.insert(
                HeaderName::from_static("upgrade-insecure-requests"),
                HeaderValue::from_static("1"),
            );
        }
        Ok(headers)
    }

    /// Get the configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Random delay drawn uniformly from the configured jitter interval
    fn jitter_delay(&self) -> Duration {
        let (min, max) = (self.config.jitter_min_ms, self.config.jitter_max_ms);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(fastrand::u64(min.min(max)..=max))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, NetworkError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout { url: url.to_string() }
            } else {
                NetworkError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let delay = self.jitter_delay();
            if !delay.is_zero() {
                debug!("Waiting {:?} before attempt {}/{} for {}", delay, attempt, max_attempts, url);
                sleep(delay).await;
            }

            info!("🌐 HTTP GET (attempt {}/{}) : {}", attempt, max_attempts, url);
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes) on attempt {}", url, body.len(), attempt);
                    return FetchOutcome::Success(body);
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed for {}: {}", attempt, max_attempts, url, e);
                    last_error = Some(e);

                    if attempt < max_attempts {
                        let cooldown = self.config.retry_cooldown();
                        if !cooldown.is_zero() {
                            sleep(cooldown).await;
                        }
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| NetworkError::Request {
            url: url.to_string(),
            message: "no attempt was made".to_string(),
        });
        warn!("❌ Giving up on {} after {} attempts: {}", url, max_attempts, error);
        FetchOutcome::Failure {
            error,
            attempts: max_attempts,
        }
    }
}

fn classify_request_error(url: &str, e: &reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout { url: url.to_string() }
    } else if e.is_connect() {
        NetworkError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        NetworkError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(TransportConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn rejects_invalid_header_values() {
        let config = TransportConfig {
            user_agent: "bad\nagent".to_string(),
            ..TransportConfig::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[test]
    fn jitter_stays_within_interval() {
        let client = HttpClient::new(TransportConfig::default()).unwrap();
        for _ in 0..100 {
            let delay = client.jitter_delay();
            assert!(delay >= Duration::from_millis(1000) && delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn zero_interval_means_no_jitter() {
        let client = HttpClient::new(TransportConfig::default().without_delays()).unwrap();
        assert_eq!(client.jitter_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn unreachable_host_fails_after_all_attempts() {
        let config = TransportConfig {
            max_attempts: 2,
            timeout_seconds: 2,
            ..TransportConfig::default().without_delays()
        };
        let client = HttpClient::new(config).unwrap();

        // Port 9 on localhost is not expected to accept HTTP connections.
        match client.fetch("http://127.0.0.1:9/").await {
            FetchOutcome::Failure { attempts, .. } => assert_eq!(attempts, 2),
            FetchOutcome::Success(_) => panic!("expected a failure"),
        }
    }
}

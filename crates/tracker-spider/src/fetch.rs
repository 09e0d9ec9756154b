use crate::config::Config;
use crate::http::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, FROM};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, trace, warn};

/// Status codes the SEC hands out when throttling or briefly unavailable.
pub const RETRYABLE_STATUSES: [u16; 6] = [403, 429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client, error({0})")]
    Client(#[source] reqwest::Error),

    #[error("invalid header value, error({0})")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to fetch {url}, error({source})")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} still responding with status {status} after {attempts} attempts")]
    Exhausted {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("failed to parse JSON from {url}, error({source})")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Status and body of one GET request, before any interpretation.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single GET, no retries. The seam between the network and everything built on top of it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError>;
}

/// [`Transport`] over a [`reqwest`] client carrying the identification headers.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(FROM, HeaderValue::from_str(config.contact())?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let transport_err = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport_err)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_err)?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

/// When to try again, and how long to wait first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub retryable: Vec<u16>,
    /// Delay before attempt `k` is `base_delay * 2^(k-1)`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            retryable: RETRYABLE_STATUSES.to_vec(),
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable.contains(&status)
    }

    /// Backoff before the given 1-based attempt; the first attempt never waits.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use tracker_spider::fetch::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_before(1), Duration::ZERO);
    /// assert_eq!(policy.delay_before(2), Duration::from_secs(2));
    /// assert_eq!(policy.delay_before(4), Duration::from_secs(8));
    /// ```
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(31);
        self.base_delay.saturating_mul(factor)
    }
}

/// JSON over a [`Transport`], retrying transient statuses with exponential backoff.
pub struct Fetcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch `url` as an untyped JSON value.
    pub async fn fetch(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        self.fetch_json(url).await
    }

    /// Fetch `url` and deserialize the body into `D`.
    ///
    /// Retryable statuses are retried until `max_attempts` is reached; any other failing status,
    /// transport error, or undecodable body ends the call immediately.
    pub async fn fetch_json<D: DeserializeOwned>(&self, url: &str) -> Result<D, FetchError> {
        let mut attempt = 1;
        loop {
            trace!("GET {url} (attempt {attempt}/{})", self.policy.max_attempts);
            let response = self.transport.get(url).await.map_err(|err| {
                error!("request failed, error({err})");
                err
            })?;

            if response.is_success() {
                return serde_json::from_slice(&response.body).map_err(|source| {
                    error!("failed to parse JSON from {url}, error({source})");
                    FetchError::Decode {
                        url: url.to_string(),
                        source,
                    }
                });
            }

            let status = response.status;
            if !self.policy.is_retryable(status) {
                error!("{url} responded with status {status}");
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            if attempt >= self.policy.max_attempts {
                error!(
                    "{url} still responding with status {status}, giving up after {attempt} attempts"
                );
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    status,
                    attempts: attempt,
                });
            }

            attempt += 1;
            let delay = self.policy.delay_before(attempt);
            warn!(
                "{url} responded with status {status}; retrying in {delay:?} (attempt {attempt}/{})",
                self.policy.max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    // replays canned responses in order, counting requests
    struct Scripted {
        responses: Mutex<VecDeque<RawResponse>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(responses: Vec<RawResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get(&self, _url: &str) -> Result<RawResponse, FetchError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("more requests than scripted responses"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_statuses_with_backoff() {
        let transport = Scripted::new(vec![
            RawResponse::new(503, ""),
            RawResponse::new(503, ""),
            RawResponse::new(503, ""),
            RawResponse::new(200, r#"{"ok": true}"#),
        ]);
        let fetcher = Fetcher::new(transport, RetryPolicy::default());

        let start = Instant::now();
        let json = fetcher.fetch("https://example.test/doc.json").await.unwrap();

        assert_eq!(json, serde_json::json!({"ok": true}));
        assert_eq!(fetcher.transport().calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(2 + 4 + 8));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let transport = Scripted::new(vec![RawResponse::new(429, ""); 4]);
        let fetcher = Fetcher::new(transport, RetryPolicy::default());

        let err = fetcher
            .fetch("https://example.test/doc.json")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::Exhausted {
                status: 429,
                attempts: 4,
                ..
            }
        ));
        assert_eq!(fetcher.transport().calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_status_fails_at_once() {
        let transport = Scripted::new(vec![RawResponse::new(404, "not found")]);
        let fetcher = Fetcher::new(transport, RetryPolicy::default());

        let start = Instant::now();
        let err = fetcher
            .fetch("https://example.test/missing.json")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(fetcher.transport().calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn undecodable_body_is_terminal() {
        let transport = Scripted::new(vec![RawResponse::new(200, "<html>")]);
        let fetcher = Fetcher::new(transport, RetryPolicy::default());

        let err = fetcher
            .fetch("https://example.test/doc.json")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(fetcher.transport().calls(), 1);
    }

    #[test]
    fn default_policy_matches_sec_throttling() {
        let policy = RetryPolicy::default();
        for status in [403, 429, 500, 502, 503, 504] {
            assert!(policy.is_retryable(status), "{status} should be retryable");
        }
        for status in [400, 401, 404, 501] {
            assert!(!policy.is_retryable(status), "{status} should be terminal");
        }
        assert_eq!(policy.delay_before(3), Duration::from_secs(4));
    }

    #[test]
    fn http_transport_builds_with_default_config() {
        assert!(HttpTransport::new(&Config::default()).is_ok());
    }
}

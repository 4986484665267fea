use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Single-address check against a reputation service.
pub trait EmailVerifier: Send + Sync {
    /// Returns the service's classification string for `email`.
    fn check(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<String, VerificationError>> + Send;
}

/// Per-address failure. Never fatal to a sweep.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("verification request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("verification service returned HTTP {0}")]
    Status(StatusCode),
    #[error("verification service reported '{status}': {message}")]
    Api { status: String, message: String },
    #[error("verification response carried no result")]
    MissingResult,
}

/// NeverBounce single-check client.
#[derive(Clone)]
pub struct NeverBounceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SingleCheckResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl NeverBounceClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

impl EmailVerifier for NeverBounceClient {
    async fn check(&self, email: &str) -> Result<String, VerificationError> {
        // without_url keeps the api key out of error messages
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("key", self.api_key.as_str()), ("email", email)])
            .send()
            .await
            .map_err(|err| VerificationError::Transport(err.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::Status(status));
        }

        let body: SingleCheckResponse = response
            .json()
            .await
            .map_err(|err| VerificationError::Transport(err.without_url()))?;

        if let Some(api_status) = body.status.filter(|value| value != "success") {
            return Err(VerificationError::Api {
                status: api_status,
                message: body.message.unwrap_or_default(),
            });
        }

        body.result
            .map(|result| result.trim().to_string())
            .filter(|result| !result.is_empty())
            .ok_or(VerificationError::MissingResult)
    }
}

/// Enforces a minimum gap between the end of one check and the start of the
/// next, whether or not the previous check succeeded.
pub struct Paced<V> {
    inner: V,
    min_interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl<V> Paced<V> {
    pub fn new(inner: V, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_finished: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }
}

impl<V: EmailVerifier> EmailVerifier for Paced<V> {
    async fn check(&self, email: &str) -> Result<String, VerificationError> {
        // held across the call so concurrent callers queue behind it
        let mut last_finished = self.last_finished.lock().await;
        if let Some(finished) = *last_finished {
            tokio::time::sleep_until(finished + self.min_interval).await;
        }

        let outcome = self.inner.check(email).await;
        *last_finished = Some(Instant::now());
        outcome
    }
}

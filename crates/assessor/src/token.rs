//! Bearer-token acquisition
//!
//! The hosted inference service authenticates with short-lived bearer tokens
//! minted by an identity endpoint from a long-lived API key.
//! [`IamTokenProvider`] performs that exchange once per call;
//! [`CachingTokenProvider`] optionally reuses a token until shortly before
//! it expires.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use overwatch_common::{AssessmentError, AssessmentResult, GatewayConfig};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Short-lived bearer token. The secret is kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            value: value.into(),
            expires_in,
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Lifetime in seconds as reported by the identity endpoint
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(&self) -> AssessmentResult<AccessToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchanges the API key at the identity endpoint, one attempt per call
pub struct IamTokenProvider {
    client: Client,
    url: String,
    grant_type: String,
    api_key: String,
    timeout: Duration,
}

impl IamTokenProvider {
    pub fn new(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            url: config.identity.url.clone(),
            grant_type: config.identity.grant_type.clone(),
            api_key: config.credentials.api_key.clone(),
            timeout: config.identity.timeout(),
        }
    }
}

#[async_trait]
impl TokenProvider for IamTokenProvider {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn acquire_token(&self) -> AssessmentResult<AccessToken> {
        let form = [
            ("grant_type", self.grant_type.as_str()),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self
            .client
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Connection error during token exchange");
                AssessmentError::Auth(format!("identity endpoint unreachable: {}", e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!(status = %status, body = %body, "Identity endpoint rejected token exchange");
            return Err(AssessmentError::Auth(format!(
                "identity endpoint returned {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Identity endpoint returned an unexpected body");
            AssessmentError::Auth(format!("malformed token response: {}", e))
        })?;

        debug!(expires_in = ?token.expires_in, "Bearer token acquired");
        Ok(AccessToken::new(token.access_token, token.expires_in))
    }
}

struct CachedToken {
    token: AccessToken,
    refresh_at: Instant,
}

/// Reuses tokens from an inner provider until `expires_in - margin` has
/// elapsed, then refreshes lazily on the next call.
///
/// Tokens without a reported lifetime, whose lifetime does not exceed the
/// margin, or whose refresh point cannot be represented are never cached. A failed refresh only fails the caller that
/// triggered it.
pub struct CachingTokenProvider<P> {
    inner: P,
    margin: Duration,
    slot: Mutex<Option<CachedToken>>,
}

impl<P: TokenProvider> CachingTokenProvider<P> {
    pub fn new(inner: P, margin: Duration) -> Self {
        Self {
            inner,
            margin,
            slot: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for CachingTokenProvider<P> {
    async fn acquire_token(&self) -> AssessmentResult<AccessToken> {
        // Held across the refresh so concurrent callers share one exchange.
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.token.clone());
            }
            debug!("Cached bearer token is due for refresh");
        }

        *slot = None;
        let token = self.inner.acquire_token().await?;

        let refresh_at = token
            .expires_in()
            .map(Duration::from_secs)
            .filter(|lifetime| *lifetime > self.margin)
            .and_then(|lifetime| Instant::now().checked_add(lifetime - self.margin));

        match refresh_at {
            Some(refresh_at) => {
                *slot = Some(CachedToken {
                    token: token.clone(),
                    refresh_at,
                });
            }
            None if token.expires_in().is_some() => {
                debug!(expires_in = ?token.expires_in(), "Token lifetime not cacheable");
            }
            None => {}
        }

        Ok(token)
    }
}

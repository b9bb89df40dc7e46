//! reqwest-backed [`PlatformApi`]
//!
//! One client per process with a cookie store holding the session. Every
//! call goes through [`HttpPlatformClient::send`], which retries network
//! errors, 429 and 5xx with exponential backoff up to `max_retries` and hands
//! back the first response that is worth interpreting. Pacing is not done
//! here; callers acquire from the rate limiter before each call.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::archiver::config::{calculate_backoff, CONNECT_TIMEOUT};
use crate::config::ArchiveConfig;
use crate::fetcher::pagination::PageCursor;
use crate::fetcher::raw::{RawFeedPage, RawItemDetail, RawLoginResponse, RawStatus};
use crate::fetcher::{Credentials, FetcherError, FetcherResult, PlatformApi, Session};

type HmacSha256 = Hmac<Sha256>;

/// Signature key version sent alongside the signed login body
const SIG_KEY_VERSION: &str = "4";

/// User agent presented to the private API
const USER_AGENT: &str = concat!("post-archiver/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the private platform API
pub struct HttpPlatformClient {
    client: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    max_retries: u32,
}

impl HttpPlatformClient {
    /// Build a client from the run configuration
    ///
    /// # Errors
    /// [`FetcherError::NetworkError`] if the TLS backend cannot be initialised
    pub fn from_config(config: &ArchiveConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        if self.app_id.is_empty() {
            request
        } else {
            request.header("X-IG-App-ID", self.app_id.as_str())
        }
    }

    /// Send a request, retrying transient failures
    ///
    /// Retries on:
    /// - Network errors (timeout, connection refused)
    /// - 429 responses
    /// - 5xx responses
    ///
    /// Any other response, success or client error, is returned as is.
    async fn send<F>(&self, endpoint: &'static str, build: F) -> FetcherResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = calculate_backoff(attempt - 1);
                debug!(endpoint, attempt = attempt + 1, ?backoff, "Retrying request");
                tokio::time::sleep(backoff).await;
            }

            crate::metrics::record_remote_request(endpoint);

            let response = match self.with_headers(build()).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        endpoint,
                        attempt = attempt + 1,
                        attempts,
                        error = %e,
                        "Network error"
                    );
                    last_error = Some(FetcherError::NetworkError(e.to_string()));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(endpoint, attempt = attempt + 1, attempts, "Rate limited by platform (429)");
                last_error = Some(FetcherError::RateLimitExceeded);
                continue;
            }

            if status.is_server_error() {
                warn!(endpoint, attempt = attempt + 1, attempts, %status, "Server error");
                last_error = Some(FetcherError::HttpError(format!("Server error: {status}")));
                continue;
            }

            debug!(endpoint, %status, attempt = attempt + 1, "Request completed");
            return Ok(response);
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("All retries exhausted".to_string())))
    }

    /// Decode a response body, turning client errors into [`FetcherError::HttpError`]
    async fn decode<T>(endpoint: &'static str, response: Response) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_client_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetcherError::HttpError(format!(
                "{endpoint}: client error {status}: {body}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            FetcherError::ParseError(format!("{endpoint}: failed to deserialize response: {e}"))
        })
    }
}

/// HMAC-SHA256 of `payload` keyed by `secret`, hex encoded
pub fn sign_payload(secret: &str, payload: &str) -> FetcherResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| FetcherError::AuthError(format!("HMAC error: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build the `signed_body` form value for `payload`
pub fn signed_body(secret: &str, payload: &str) -> FetcherResult<String> {
    Ok(format!("{}.{}", sign_payload(secret, payload)?, payload))
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn login(&self, credentials: &Credentials) -> FetcherResult<Session> {
        let payload = serde_json::json!({
            "username": credentials.username,
            "password": credentials.password,
            "login_attempt_count": 0,
        })
        .to_string();
        let form = [
            ("signed_body", signed_body(&self.app_secret, &payload)?),
            ("ig_sig_key_version", SIG_KEY_VERSION.to_string()),
        ];

        let url = self.url("accounts/login/");
        let response = self
            .send("login", || self.client.post(&url).form(&form))
            .await
            .map_err(|e| FetcherError::AuthError(e.to_string()))?;

        let status = response.status();
        let body: RawLoginResponse = response
            .json()
            .await
            .map_err(|e| FetcherError::AuthError(format!("unreadable login response ({status}): {e}")))?;

        let user = match body.logged_in_user {
            Some(user) if status.is_success() && !user.pk.is_empty() => user,
            _ => {
                let reason = body
                    .message
                    .unwrap_or_else(|| format!("login rejected with status {status}"));
                return Err(FetcherError::AuthError(reason));
            }
        };

        info!(user_id = %user.pk, username = %user.username, "Logged in");

        Ok(Session {
            user_id: user.pk,
            username: if user.username.is_empty() {
                credentials.username.clone()
            } else {
                user.username
            },
        })
    }

    async fn get_feed_page(
        &self,
        session: &Session,
        cursor: Option<&PageCursor>,
    ) -> FetcherResult<RawFeedPage> {
        let url = self.url(&format!("feed/user/{}/", session.user_id));
        let query: Vec<(&str, &str)> = cursor
            .map(|c| vec![("max_id", c.as_str())])
            .unwrap_or_default();

        let response = self
            .send("feed_page", || self.client.get(&url).query(&query))
            .await?;
        Self::decode("feed_page", response).await
    }

    async fn get_item_detail(
        &self,
        _session: &Session,
        media_id: &str,
    ) -> FetcherResult<RawItemDetail> {
        let url = self.url(&format!("media/{media_id}/info/"));
        let response = self.send("item_detail", || self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(media_id, "Item detail returned 404");
            return Ok(RawItemDetail::default());
        }

        Self::decode("item_detail", response).await
    }

    async fn set_archived(&self, _session: &Session, media_id: &str) -> FetcherResult<RawStatus> {
        let url = self.url(&format!("media/{media_id}/only_me/"));
        let form = [("media_id", media_id)];
        let response = self
            .send("set_archived", || self.client.post(&url).form(&form))
            .await?;
        Self::decode("set_archived", response).await
    }
}

//! HTTP client for the Threads Graph API.
//!
//! Two read-only endpoints are used: the user's media list and per-media
//! insights. Non-2xx responses surface as [`ThreadsError::Api`] with the
//! Graph API's own error message when one is present.

use std::time::Duration;

use fortune_core::PostMetrics;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ThreadsError;
use crate::types::{metrics_from_insights, DataEnvelope, ErrorEnvelope, InsightMetric, MediaItem};

const DEFAULT_BASE_URL: &str = "https://graph.threads.net";
const MEDIA_FIELDS: &str = "id,media_type,media_url,permalink,username,text,timestamp,is_quote_post";
const INSIGHT_METRICS: &str = "views,likes,replies,reposts,shares";

/// Client for one Threads account.
///
/// Use [`ThreadsClient::new`] for production or
/// [`ThreadsClient::with_base_url`] to point at a mock server in tests.
pub struct ThreadsClient {
    client: Client,
    access_token: String,
    user_id: String,
    base_url: String,
}

impl std::fmt::Debug for ThreadsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadsClient")
            .field("access_token", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ThreadsClient {
    /// Creates a client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, user_id: &str, timeout_secs: u64) -> Result<Self, ThreadsError> {
        Self::with_base_url(access_token, user_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ThreadsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        access_token: &str,
        user_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ThreadsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("threads-fortune/0.1")
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            user_id: user_id.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Fetches the most recent `limit` posts of the configured user.
    ///
    /// # Errors
    ///
    /// - [`ThreadsError::Api`] on a non-2xx status.
    /// - [`ThreadsError::Http`] on network failure.
    /// - [`ThreadsError::Deserialize`] if the body does not match.
    pub async fn get_user_media(&self, limit: u32) -> Result<Vec<MediaItem>, ThreadsError> {
        let url = format!("{}/{}/threads", self.base_url, self.user_id);
        let limit = limit.to_string();
        let envelope: DataEnvelope<MediaItem> = self
            .get_json(
                &url,
                &[
                    ("fields", MEDIA_FIELDS),
                    ("limit", limit.as_str()),
                    ("access_token", self.access_token.as_str()),
                ],
            )
            .await?;

        tracing::debug!(count = envelope.data.len(), "fetched threads media");
        Ok(envelope.data)
    }

    /// Fetches lifetime metrics for one post.
    ///
    /// # Errors
    ///
    /// - [`ThreadsError::Api`] on a non-2xx status.
    /// - [`ThreadsError::Http`] on network failure.
    /// - [`ThreadsError::Deserialize`] if the body does not match.
    pub async fn get_media_insights(&self, media_id: &str) -> Result<PostMetrics, ThreadsError> {
        let url = format!("{}/{media_id}/insights", self.base_url);
        let envelope: DataEnvelope<InsightMetric> = self
            .get_json(
                &url,
                &[
                    ("metric", INSIGHT_METRICS),
                    ("access_token", self.access_token.as_str()),
                ],
            )
            .await?;

        Ok(metrics_from_insights(&envelope.data))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ThreadsError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map_or_else(|_| body.trim().to_string(), |e| e.error.message);
            return Err(ThreadsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ThreadsError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::traits::ProgressService;
use crate::config::ServiceConfig;
use crate::models::{ProgressRecord, ProgressReport, ProgressStatus};

/// Portal responses wrap their payload as `{ "success": bool, "data": ... }`.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest {
    video_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tv_show_id: Option<i64>,
}

/// [`ProgressService`] backed by the portal's viewing-status REST API.
#[derive(Clone)]
pub struct HttpProgressService {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProgressService {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        // A trailing slash keeps `join` from dropping the last path segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("Invalid progress service URL: {}", base_url))?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.token.clone(),
            Duration::from_secs(config.request_timeout),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid endpoint path: {}", path))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.endpoint(path)?;
        trace!(%url, "POST");

        let response = self.request(Method::POST, url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} failed with status {}: {}", path, status, error_body));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressService for HttpProgressService {
    async fn start_session(&self, video_id: i64, collection_id: Option<i64>) -> Result<()> {
        debug!(video_id, ?collection_id, "Starting viewing session");
        self.post_json(
            "viewing-status/start",
            &StartSessionRequest {
                video_id,
                tv_show_id: collection_id,
            },
        )
        .await
    }

    async fn report_progress(&self, report: &ProgressReport) -> Result<()> {
        self.post_json("viewing-status/update", report).await
    }

    async fn get_status(&self, video_id: i64, collection_id: Option<i64>) -> Result<Option<ProgressStatus>> {
        let mut url = self.endpoint(&format!("viewing-status/{}", video_id))?;
        if let Some(collection_id) = collection_id {
            url.query_pairs_mut()
                .append_pair("tv_show_id", &collection_id.to_string());
        }
        trace!(%url, "GET");

        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(video_id, "No viewing status stored");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("Viewing status request failed with status {}", status));
        }

        let envelope: ApiEnvelope<ProgressRecord> = response
            .json()
            .await
            .context("Failed to parse viewing status response")?;
        if !envelope.success {
            return Err(anyhow!(
                "Viewing status request rejected: {}",
                envelope.message.unwrap_or_default()
            ));
        }

        Ok(envelope.data.as_ref().map(ProgressStatus::from))
    }
}

impl std::fmt::Debug for HttpProgressService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProgressService")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

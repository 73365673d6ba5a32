//! HTTP client for the record-keeping service.

use serde::Serialize;
use tracing::{debug, error};

use vodforge_models::VideoStatus;

use crate::error::{NotifierError, NotifierResult};

/// Configuration for the metadata sync client.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Base URL of the record-keeping service
    pub base_url: String,
    /// Basic auth username, when the endpoint requires it
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
}

impl NotifierConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("NOTIFIER_SERVICE_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            username: std::env::var("BASIC_AUTH_USERNAME").ok(),
            password: std::env::var("BASIC_AUTH_PASSWORD").ok(),
        }
    }
}

/// One status update for a video record.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataUpdate {
    pub user_id: String,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<i32>,
}

impl MetadataUpdate {
    /// A bare status change for the given owner.
    pub fn status(owner_id: impl Into<String>, status: VideoStatus) -> Self {
        Self {
            user_id: owner_id.into(),
            status,
            title: None,
            duration_sec: None,
        }
    }

    /// Attach a title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Attach a duration.
    pub fn with_duration(mut self, duration_sec: Option<i32>) -> Self {
        self.duration_sec = duration_sec;
        self
    }
}

/// Client for pushing video metadata updates.
#[derive(Clone)]
pub struct NotifierClient {
    http: reqwest::Client,
    config: NotifierConfig,
}

impl NotifierClient {
    /// Create a new client.
    pub fn new(config: NotifierConfig) -> NotifierResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(NotifierError::Transport)?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> NotifierResult<Self> {
        Self::new(NotifierConfig::from_env())
    }

    /// Push one update for a video record. Expects a 2xx; any other
    /// response is surfaced with its body for diagnosis.
    pub async fn update(&self, video_id: &str, update: &MetadataUpdate) -> NotifierResult<()> {
        let url = format!(
            "{}/internal/media/videos/{}",
            self.config.base_url.trim_end_matches('/'),
            video_id
        );

        debug!(video_id, status = %update.status, "Syncing video metadata");

        let mut request = self.http.patch(&url).json(update);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(video_id, status = status.as_u16(), body, "Notifier rejected update");
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(video_id, "Metadata update accepted");
        Ok(())
    }
}

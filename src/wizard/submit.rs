//! Submission targets for a completed wizard

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::form_data::FormData;

/// Payload handed to a submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub form_type: String,
    pub owner_id: String,
    pub data: FormData,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(form_type: impl Into<String>, owner_id: impl Into<String>, data: FormData) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_type: form_type.into(),
            owner_id: owner_id.into(),
            data,
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not write submission to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode submission: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The commit call a wizard makes on its final step
#[async_trait]
pub trait FormSubmitter: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str;

    async fn submit(&self, submission: &Submission) -> Result<(), SubmitError>;
}

/// Writes each submission to `<dir>/<form_type>-<id>.json`
pub struct FileSubmitter {
    dir: PathBuf,
}

impl FileSubmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn submission_path(&self, submission: &Submission) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", submission.form_type, submission.id))
    }
}

#[async_trait]
impl FormSubmitter for FileSubmitter {
    fn name(&self) -> &str {
        "file"
    }

    async fn submit(&self, submission: &Submission) -> Result<(), SubmitError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SubmitError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.submission_path(submission);
        let contents = serde_json::to_string_pretty(submission)?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| SubmitError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = ?path, form = %submission.form_type, "Submission written");
        Ok(())
    }
}

/// POSTs each submission as JSON to an endpoint
pub struct HttpSubmitter {
    endpoint: String,
    bearer_token: Option<String>,
    client: Client,
}

impl HttpSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("formflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            client,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FormSubmitter for HttpSubmitter {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, submission: &Submission) -> Result<(), SubmitError> {
        let mut request = self.client.post(&self.endpoint).json(submission);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::info!(
                endpoint = %self.endpoint,
                status = %status,
                form = %submission.form_type,
                "Submission accepted"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(endpoint = %self.endpoint, status = %status, "Submission rejected");
        Err(SubmitError::Status {
            status: status.as_u16(),
            message: rejection_message(&body, status.canonical_reason()),
        })
    }
}

/// Pull a human message out of an error body: `{"message": ..}`, `{"error": ..}` or raw text
fn rejection_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

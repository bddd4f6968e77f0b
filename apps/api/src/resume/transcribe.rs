//! Speech-to-text for recorded video/audio resumes via the AssemblyAI REST API.
//!
//! The flow is upload, create a transcript job, then poll until it settles.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";
const POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Roughly ten minutes of polling.
const MAX_POLLS: u32 = 200;
/// Per HTTP call, including the media upload.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transcription API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transcription failed: {0}")]
    Failed(String),

    #[error("transcription did not finish after {0} polls")]
    TimedOut(u32),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptResponse {
    pub id: String,
    pub status: TranscriptStatus,
    pub text: Option<String>,
    pub error: Option<String>,
}

/// What one poll tells us about a transcript job.
#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    Pending,
    Done(String),
}

impl TranscriptResponse {
    pub fn outcome(self) -> Result<PollOutcome, TranscriptionError> {
        match self.status {
            TranscriptStatus::Queued | TranscriptStatus::Processing => Ok(PollOutcome::Pending),
            TranscriptStatus::Completed => Ok(PollOutcome::Done(self.text.unwrap_or_default())),
            TranscriptStatus::Error => Err(TranscriptionError::Failed(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

#[derive(Clone)]
pub struct Transcriber {
    client: Client,
    api_key: String,
    base_url: String,
}

impl Transcriber {
    pub fn new(api_key: String) -> Result<Self, TranscriptionError> {
        Self::build(api_key, DEFAULT_BASE_URL, REQUEST_TIMEOUT)
    }

    fn build(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, TranscriptionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TranscriptionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(TranscriptionError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn transcribe(&self, media: Bytes) -> Result<String, TranscriptionError> {
        let size = media.len();
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(media)
            .send()
            .await?;
        let upload: UploadResponse = Self::check(response).await?.json().await?;
        debug!("Uploaded {size} bytes for transcription");

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&TranscriptRequest {
                audio_url: &upload.upload_url,
            })
            .send()
            .await?;
        let job: TranscriptResponse = Self::check(response).await?.json().await?;
        info!("Transcript job {} created", job.id);

        let id = job.id.clone();
        if let PollOutcome::Done(text) = job.outcome()? {
            return Ok(text);
        }

        for _ in 0..MAX_POLLS {
            tokio::time::sleep(POLL_INTERVAL).await;
            let response = self
                .client
                .get(format!("{}/transcript/{id}", self.base_url))
                .header("authorization", &self.api_key)
                .send()
                .await?;
            let poll: TranscriptResponse = Self::check(response).await?.json().await?;
            if let PollOutcome::Done(text) = poll.outcome()? {
                info!("Transcript job {id} completed ({} chars)", text.len());
                return Ok(text);
            }
        }

        Err(TranscriptionError::TimedOut(MAX_POLLS))
    }
}

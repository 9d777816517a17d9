use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};

use crate::error::{CollaboratorError, CollaboratorResult, Modality};
use crate::fusion::features::{AudioVector, IdentityVector, VisionVector};

use super::{AudioCollaborator, IdentityCollaborator, VisionCollaborator};

/// Endpoint and transport settings shared by the remote collaborators.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub vision_url: String,
    pub identity_url: String,
    pub audio_url: String,
    pub connect_timeout: Duration,
}

/// Build the shared reqwest client. Per-request deadlines are enforced by
/// the orchestrator, so only the connect phase is bounded here.
pub fn build_client(config: &HttpClientConfig) -> anyhow::Result<Client> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()?;
    Ok(client)
}

fn unavailable(modality: Modality, err: impl std::fmt::Display) -> CollaboratorError {
    CollaboratorError::Unavailable {
        modality,
        reason: err.to_string(),
    }
}

async fn post_frame(
    client: &Client,
    url: &str,
    modality: Modality,
    frame: Bytes,
) -> CollaboratorResult<Vec<f64>> {
    let part = multipart::Part::stream(frame).file_name("frame");
    let form = multipart::Form::new().part("file", part);
    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| unavailable(modality, e))?;
    handle_response(modality, response).await
}

async fn handle_response(
    modality: Modality,
    response: reqwest::Response,
) -> CollaboratorResult<Vec<f64>> {
    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(modality, format!("status {status}")));
    }

    let body = response.bytes().await.map_err(|e| unavailable(modality, e))?;
    serde_json::from_slice::<Vec<f64>>(&body).map_err(|e| CollaboratorError::Malformed {
        modality,
        reason: format!("expected a JSON array of numbers: {e}"),
    })
}

/// Remote vision service: `POST` multipart `file`, replies `[f64; 5]`.
pub struct HttpVision {
    client: Client,
    url: String,
}

impl HttpVision {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl VisionCollaborator for HttpVision {
    async fn analyze(&self, frame: Bytes) -> CollaboratorResult<VisionVector> {
        let values = post_frame(&self.client, &self.url, Modality::Vision, frame).await?;
        VisionVector::from_values(&values)
    }
}

/// Remote identity service: `POST` multipart `file`, replies `[f64; 3]`.
pub struct HttpIdentity {
    client: Client,
    url: String,
}

impl HttpIdentity {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl IdentityCollaborator for HttpIdentity {
    async fn analyze(&self, frame: Bytes) -> CollaboratorResult<IdentityVector> {
        let values = post_frame(&self.client, &self.url, Modality::Identity, frame).await?;
        IdentityVector::from_values(&values)
    }
}

/// Remote audio service: `GET`, replies its latest `[f64; 3]`.
pub struct HttpAudio {
    client: Client,
    url: String,
}

impl HttpAudio {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AudioCollaborator for HttpAudio {
    async fn latest(&self) -> CollaboratorResult<AudioVector> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| unavailable(Modality::Audio, e))?;
        let values = handle_response(Modality::Audio, response).await?;
        AudioVector::from_values(&values)
    }
}

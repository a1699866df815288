use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::protocol::{AnnotationRequest, AnnotationResponse, ModelCatalog};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("invalid annotation service root '{root}': {source}")]
    InvalidServiceRoot {
        root: String,
        source: url::ParseError,
    },
    #[error("annotation service transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("annotation service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed annotation service response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Remote annotation backend. One call yields exactly one outcome and leaves no
/// state behind.
#[async_trait]
pub trait AnnotationService: Send + Sync {
    async fn annotate(
        &self,
        request: &AnnotationRequest,
    ) -> Result<AnnotationResponse, AnnotationError>;

    async fn models(&self) -> Result<ModelCatalog, AnnotationError>;
}

#[derive(Debug, Clone)]
pub struct AnnotationClient {
    http: Client,
    service_root: Url,
}

impl AnnotationClient {
    pub fn new(service_root: &str) -> Result<Self, AnnotationError> {
        Self::with_timeout(service_root, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(service_root: &str, timeout: Duration) -> Result<Self, AnnotationError> {
        let service_root = parse_service_root(service_root)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AnnotationError::Transport)?;
        Ok(Self { http, service_root })
    }

    pub fn service_root(&self) -> &Url {
        &self.service_root
    }

    fn endpoint(&self, name: &str) -> Result<Url, AnnotationError> {
        self.service_root
            .join(name)
            .map_err(|source| AnnotationError::InvalidServiceRoot {
                root: self.service_root.to_string(),
                source,
            })
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AnnotationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnnotationError::Status { status, body });
        }
        let bytes = response.bytes().await.map_err(AnnotationError::Transport)?;
        serde_json::from_slice(&bytes).map_err(AnnotationError::Decode)
    }
}

#[async_trait]
impl AnnotationService for AnnotationClient {
    async fn annotate(
        &self,
        request: &AnnotationRequest,
    ) -> Result<AnnotationResponse, AnnotationError> {
        let url = self.endpoint("annotate")?;
        debug!(%url, model = %request.model, collapse_phrases = request.collapse_phrases, "posting annotation request");
        let response = self
            .http
            .post(url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .json(request)
            .send()
            .await
            .map_err(AnnotationError::Transport)?;
        Self::read_json(response).await
    }

    async fn models(&self) -> Result<ModelCatalog, AnnotationError> {
        let url = self.endpoint("models")?;
        let response = self
            .http
            .get(url)
            .header(ACCEPT, APPLICATION_JSON)
            .send()
            .await
            .map_err(AnnotationError::Transport)?;
        Self::read_json(response).await
    }
}

/// Parses the service root so that endpoint names resolve beneath its path,
/// i.e. `http://host/api` serves `http://host/api/annotate`.
pub fn parse_service_root(raw: &str) -> Result<Url, AnnotationError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| AnnotationError::InvalidServiceRoot {
        root: raw.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/annotation_client_tests.rs"]
mod tests;

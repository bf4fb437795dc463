//! Generation Service Abstraction
//!
//! Unified interface for the external content-generation collaborators:
//! material analysis, reading-material generation, and exercise generation.
//! All calls are synchronous request-response over HTTP; the engine awaits
//! them strictly in sequence.

use crate::error::ServiceError;
use crate::material::{AnalyzedMaterial, GeneratedActivity, ReadingMaterial, Topic};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for the material analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// One bundled topic group inside a reading request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingBatchRequest {
    pub topics: Vec<Topic>,
    pub title: String,
    pub learning_outcome: String,
}

/// Request body for reading-material generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRequest {
    pub title: String,
    pub macro_subject: String,
    pub topics: Vec<ReadingBatchRequest>,
    pub education_level: String,
    pub learning_outcome: String,
    /// Target reading time in minutes.
    pub duration: u32,
    pub language: String,
}

/// Request body for exercise generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRequest {
    pub macro_subject: String,
    pub topic: String,
    pub topic_explanation: String,
    pub education_level: String,
    pub learning_outcome: String,
    /// Reading material the exercise should draw from. Empty when no reading
    /// was generated for the topic.
    pub material: String,
    pub solutions_count: u32,
    pub distractors_count: u32,
    pub easy_distractors_count: u32,
    pub activity_kind: String,
    pub language: String,
}

/// Content-generation collaborator interface.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Analyze raw source text into structured material.
    async fn analyze_material(&self, text: &str) -> Result<AnalyzedMaterial, ServiceError>;

    /// Generate reading material covering one topic batch.
    async fn generate_reading(&self, request: &ReadingRequest)
        -> Result<ReadingMaterial, ServiceError>;

    /// Generate one exercise activity.
    async fn generate_exercise(
        &self,
        request: &ExerciseRequest,
    ) -> Result<GeneratedActivity, ServiceError>;
}

// Helper function to map HTTP errors to ServiceError
pub(crate) fn map_http_error(error: reqwest::Error) -> ServiceError {
    if error.is_status() {
        let status = error.status().map(|s| s.as_u16()).unwrap_or_default();
        match status {
            401 => ServiceError::AuthFailed(format!("Authentication failed: {}", error)),
            429 => ServiceError::RateLimited(format!("Rate limit exceeded: {}", error)),
            404 => ServiceError::EndpointNotFound(format!("Endpoint not found: {}", error)),
            _ => ServiceError::RequestFailed(format!(
                "Request failed with status {}: {}",
                status, error
            )),
        }
    } else if error.is_timeout() {
        ServiceError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ServiceError::RequestFailed(format!("Connection error: {}", error))
    } else {
        ServiceError::RequestFailed(format!("HTTP error: {}", error))
    }
}

fn map_status_error(status: u16, body: String) -> ServiceError {
    match status {
        401 => ServiceError::AuthFailed(format!("Authentication failed: {}", body)),
        429 => ServiceError::RateLimited(format!("Rate limit exceeded: {}", body)),
        404 => ServiceError::EndpointNotFound(format!("Endpoint not found: {}", body)),
        _ => ServiceError::RequestFailed(format!(
            "Request failed with status {}: {}",
            status, body
        )),
    }
}

const SERVICE_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SERVICE_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_service_http_client() -> Result<Client, ServiceError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(SERVICE_HTTP_CONNECT_TIMEOUT)
        .timeout(SERVICE_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ServiceError::ClientBuild(format!("Failed to create HTTP client: {}", e)))
}

/// HTTP client for the generation collaborator.
pub struct HttpGenerationService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGenerationService {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, ServiceError> {
        let client = build_service_http_client()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ServiceError>
    where
        Req: Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn analyze_material(&self, text: &str) -> Result<AnalyzedMaterial, ServiceError> {
        let request = AnalyzeRequest {
            text: text.to_string(),
        };
        self.post_json("analysis", &request).await
    }

    async fn generate_reading(
        &self,
        request: &ReadingRequest,
    ) -> Result<ReadingMaterial, ServiceError> {
        self.post_json("material", request).await
    }

    async fn generate_exercise(
        &self,
        request: &ExerciseRequest,
    ) -> Result<GeneratedActivity, ServiceError> {
        self.post_json("exercises", request).await
    }
}

//! Flow persistence toward the storage collaborator.
//!
//! The flow is submitted exactly once, fully assembled. A rejected submission
//! surfaces as an error to the caller; there is no automatic retry here.

use crate::error::SynthesisError;
use crate::graph::LearningFlow;
use crate::provider::build_service_http_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage collaborator interface. Returns the persisted flow id.
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn persist(&self, flow: &LearningFlow) -> Result<String, SynthesisError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedFlow {
    id: String,
}

/// HTTP client for the flow storage collaborator.
pub struct HttpFlowStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpFlowStore {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, SynthesisError> {
        let client = build_service_http_client()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl FlowStore for HttpFlowStore {
    async fn persist(&self, flow: &LearningFlow) -> Result<String, SynthesisError> {
        let url = format!("{}/flows", self.base_url);
        let mut builder = self.client.post(&url).json(flow);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder
            .send()
            .await
            .map_err(|e| SynthesisError::Service(crate::provider::map_http_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SynthesisError::Persistence {
                status: status.as_u16(),
                message: body,
            });
        }

        let persisted: PersistedFlow = response.json().await.map_err(|e| {
            SynthesisError::Persistence {
                status: status.as_u16(),
                message: format!("Unreadable persistence response: {}", e),
            }
        })?;
        Ok(persisted.id)
    }
}

/// Writes the flow document to a local JSON file. Used by dry runs.
pub struct FileFlowStore {
    path: PathBuf,
}

impl FileFlowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FlowStore for FileFlowStore {
    async fn persist(&self, flow: &LearningFlow) -> Result<String, SynthesisError> {
        let json = serde_json::to_string_pretty(flow).map_err(|e| {
            SynthesisError::Persistence {
                status: 0,
                message: format!("Failed to serialize flow: {}", e),
            }
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, json)?;
        Ok(flow.id.clone())
    }
}

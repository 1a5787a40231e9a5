use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tracing::debug;
use waypoints_common::{Result, WaypointError};

use crate::embedder::{send_json, Embedder};
use crate::types::{parse_remote_embedding, RemoteEmbedRequest};

/// Model served by the remote inference endpoint
pub const HF_EMBEDDING_MODEL: &str = "BAAI/bge-small-en-v1.5";

/// Feature-extraction endpoint for `HF_EMBEDDING_MODEL`
pub const HF_EMBEDDING_ENDPOINT: &str =
    "https://router.huggingface.co/hf-inference/models/BAAI/bge-small-en-v1.5/pipeline/feature-extraction";

/// Hugging Face inference API client
#[derive(Debug, Clone)]
pub struct HuggingFaceEmbedder {
    endpoint: String,
    token: String,
    client: Client,
}

impl HuggingFaceEmbedder {
    /// Create client for the fixed inference endpoint
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self::with_endpoint(client, HF_EMBEDDING_ENDPOINT, token)
    }

    /// Create client for a custom endpoint
    pub fn with_endpoint(
        client: Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            client,
        }
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.token.trim().is_empty() {
            return Err(WaypointError::MissingCredential);
        }

        debug!("Requesting remote embedding - Text length: {}", text.len());

        let request = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&RemoteEmbedRequest {
                model: HF_EMBEDDING_MODEL,
                inputs: text,
            });

        let raw = send_json(self.name(), request).await?;
        parse_remote_embedding(raw)
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use waypoints_common::{AppConfig, Result, WaypointError};

use crate::local::LocalEmbedder;
use crate::remote::HuggingFaceEmbedder;

/// Text embedding capability shared by both backends
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed text into exactly `EMBEDDING_DIM` components
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Build the embedder selected by the deployment mode
pub fn build_embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    let client = http_client(Duration::from_secs(config.embedding_timeout_secs))?;

    let embedder: Arc<dyn Embedder> = if config.mode.is_prod() {
        let token = config.hugging_face_token.clone().unwrap_or_default();
        Arc::new(HuggingFaceEmbedder::new(client, token))
    } else {
        Arc::new(LocalEmbedder::new(client, &config.embedding_service_url))
    };

    info!(
        "Embedding backend selected: {} (mode={})",
        embedder.name(),
        config.mode.as_str()
    );
    Ok(embedder)
}

/// HTTP client with a whole-request timeout
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| WaypointError::internal(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and return the decoded JSON body of a 200 response.
///
/// Transport failures are `EmbeddingUnreachable`, any other status is
/// `EmbeddingStatus`, an undecodable body is `EmbeddingResponse`.
pub(crate) async fn send_json(backend: &str, request: RequestBuilder) -> Result<Value> {
    let response = request.send().await.map_err(|e| {
        warn!("{} embedding request failed: {}", backend, e);
        WaypointError::embedding_unreachable(e.to_string())
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!("{} embedding service returned status: {}", backend, status.as_u16());
        return Err(WaypointError::EmbeddingStatus(status.as_u16()));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| WaypointError::embedding_response(e.to_string()))
}

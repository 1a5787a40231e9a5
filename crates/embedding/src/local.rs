use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use waypoints_common::Result;

use crate::embedder::{send_json, Embedder};
use crate::types::{parse_local_embedding, LocalEmbedRequest};

/// Client for the local embedding service (`POST /embed`)
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    embed_url: String,
    client: Client,
}

impl LocalEmbedder {
    /// Create client for the service at `base_url`
    pub fn new(client: Client, base_url: &str) -> Self {
        let embed_url = format!("{}/embed", base_url.trim_end_matches('/'));
        Self { embed_url, client }
    }

    pub fn embed_url(&self) -> &str {
        &self.embed_url
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Requesting local embedding - Text length: {}", text.len());

        let request = self
            .client
            .post(&self.embed_url)
            .json(&LocalEmbedRequest { text });

        let raw = send_json(self.name(), request).await?;
        parse_local_embedding(raw)
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::http_client;
    use crate::EMBEDDING_DIM;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::{json, Value};
    use std::time::Duration;
    use waypoints_common::WaypointError;

    /// Local service stub answering `POST /embed` with `status` and `body`
    fn spawn_stub(status: u16, body: Value) -> String {
        let server = HttpServer::new(move || {
            let body = body.clone();
            App::new().route(
                "/embed",
                web::post().to(move |payload: web::Json<Value>| {
                    let body = body.clone();
                    async move {
                        if payload.get("text").and_then(Value::as_str).is_none() {
                            return HttpResponse::BadRequest().json(json!({"error": "missing field: text"}));
                        }
                        let status = actix_web::http::StatusCode::from_u16(status)
                            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
                        HttpResponse::build(status).json(body)
                    }
                }),
            )
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}", addr)
    }

    fn embedder(base_url: &str) -> LocalEmbedder {
        LocalEmbedder::new(http_client(Duration::from_secs(5)).unwrap(), base_url)
    }

    #[test]
    fn test_trailing_slash_is_tolerated() {
        let client = http_client(Duration::from_secs(1)).unwrap();
        assert_eq!(
            LocalEmbedder::new(client.clone(), "http://127.0.0.1:5001/").embed_url(),
            "http://127.0.0.1:5001/embed"
        );
        assert_eq!(
            LocalEmbedder::new(client, "http://127.0.0.1:5001").embed_url(),
            "http://127.0.0.1:5001/embed"
        );
    }

    #[actix_web::test]
    async fn test_embed_success() {
        let base = spawn_stub(200, json!({ "embedding": vec![0.5_f64; EMBEDDING_DIM] }));
        let vector = embedder(&base).embed("ancient temples").await.unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIM);
    }

    #[actix_web::test]
    async fn test_wrong_dimension() {
        let base = spawn_stub(200, json!({ "embedding": vec![0.5_f64; 12] }));
        let err = embedder(&base).embed("ancient temples").await.unwrap_err();
        assert!(matches!(err, WaypointError::EmbeddingDimension(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[actix_web::test]
    async fn test_non_success_status() {
        let base = spawn_stub(503, json!({ "error": "loading" }));
        let err = embedder(&base).embed("ancient temples").await.unwrap_err();
        assert!(matches!(err, WaypointError::EmbeddingStatus(503)));
    }

    #[actix_web::test]
    async fn test_unreachable_service() {
        // Bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = embedder(&format!("http://127.0.0.1:{}", port))
            .embed("ancient temples")
            .await
            .unwrap_err();
        assert!(matches!(err, WaypointError::EmbeddingUnreachable(_)));
        assert_eq!(err.public_message(), "embedding service unreachable");
    }
}

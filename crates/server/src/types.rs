use serde::{Deserialize, Serialize};

/// Search query string
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query text
    pub q: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Waypoint count response
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

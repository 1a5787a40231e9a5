use actix_web::{get, HttpResponse};

use crate::types::HealthResponse;

/// Liveness probe, reachable without a site token
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

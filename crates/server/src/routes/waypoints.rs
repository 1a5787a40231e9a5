use actix_web::{get, web, HttpResponse};

use crate::error::ApiError;
use crate::search::search_waypoints;
use crate::state::AppState;
use crate::types::{CountResponse, SearchQuery};

#[get("/waypoints/count")]
pub async fn count(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let count = state.store.count().await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

#[get("/waypoints/search")]
pub async fn search(
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let results = search_waypoints(
        state.embedder.as_ref(),
        state.store.as_ref(),
        query.q.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(results))
}

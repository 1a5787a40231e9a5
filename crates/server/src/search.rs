use tracing::{debug, info, warn};
use waypoints_common::{Result, WaypointError};
use waypoints_embedding::{Embedder, EMBEDDING_DIM};
use waypoints_store::{SearchResult, WaypointStore, SEARCH_LIMIT};

/// Run one search: embed the query, ask the store for the nearest
/// waypoints, and normalize their distances.
///
/// An empty or whitespace-only query is rejected before the embedder is
/// called. Any failure aborts the whole search with no partial results.
pub async fn search_waypoints(
    embedder: &dyn Embedder,
    store: &dyn WaypointStore,
    query: Option<&str>,
) -> Result<Vec<SearchResult>> {
    let query = match query {
        Some(q) if !q.trim().is_empty() => q,
        _ => return Err(WaypointError::invalid_input("missing query parameter q")),
    };

    debug!("Searching waypoints - Query length: {}", query.len());

    let embedding = embedder.embed(query).await.map_err(|e| {
        warn!("Embedding via {} failed: {}", embedder.name(), e);
        e
    })?;

    if embedding.len() != EMBEDDING_DIM {
        warn!(
            "Embedding via {} returned {} components",
            embedder.name(),
            embedding.len()
        );
        return Err(WaypointError::embedding_dimension(format!(
            "expected {} components, got {}",
            EMBEDDING_DIM,
            embedding.len()
        )));
    }

    let rows = store.nearest(&embedding, SEARCH_LIMIT).await?;
    let results: Vec<SearchResult> = rows.into_iter().map(SearchResult::from).collect();

    info!("Search completed - {} results", results.len());
    Ok(results)
}

use std::sync::Arc;
use waypoints_embedding::Embedder;
use waypoints_store::WaypointStore;

/// Shared application state
pub struct AppState {
    /// Embedding backend selected at startup
    pub embedder: Arc<dyn Embedder>,

    /// Waypoint store (owns the connection pool)
    pub store: Arc<dyn WaypointStore>,
}

impl AppState {
    /// Create new application state
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn WaypointStore>) -> Self {
        Self { embedder, store }
    }
}

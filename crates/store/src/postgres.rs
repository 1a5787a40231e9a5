use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, error, info};
use waypoints_common::{AppConfig, Result, WaypointError, EMBEDDING_DIM};

use crate::connect::connect_options;
use crate::types::WaypointRow;

/// Maximum rows returned by a similarity search
pub const SEARCH_LIMIT: i64 = 3;

const COUNT_SQL: &str = "SELECT count(*) FROM waypoints";

// Cosine distance (<=>), NULL embeddings excluded before distance is computed
const NEAREST_SQL: &str = "SELECT name, description, (embedding <=> $1) AS distance \
     FROM waypoints \
     WHERE embedding IS NOT NULL \
     ORDER BY distance ASC \
     LIMIT $2";

/// Read-only access to the waypoints table
#[async_trait]
pub trait WaypointStore: Send + Sync {
    /// Total number of waypoints
    async fn count(&self) -> Result<i64>;

    /// Up to `limit` rows closest to `embedding`, ascending distance
    async fn nearest(&self, embedding: &[f32], limit: i64) -> Result<Vec<WaypointRow>>;
}

/// PostgreSQL + pgvector waypoint store
#[derive(Debug, Clone)]
pub struct PgWaypointStore {
    pool: PgPool,
}

impl PgWaypointStore {
    /// Connect the pool described by the configuration
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let options = connect_options(&config.database)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| WaypointError::database(format!("Failed to connect: {}", e)))?;

        info!(
            "Database pool initialized - max_connections: {}",
            config.database_max_connections
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round-trip a trivial query to verify connectivity
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| WaypointError::database(format!("ping failed: {}", e)))?;
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

#[async_trait]
impl WaypointStore for PgWaypointStore {
    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(COUNT_SQL)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Count query failed: {}", e);
                WaypointError::database(e.to_string())
            })
    }

    async fn nearest(&self, embedding: &[f32], limit: i64) -> Result<Vec<WaypointRow>> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(WaypointError::invalid_input(format!(
                "query vector must have {} components, got {}",
                EMBEDDING_DIM,
                embedding.len()
            )));
        }

        let rows = sqlx::query_as::<_, WaypointRow>(NEAREST_SQL)
            .bind(Vector::from(embedding.to_vec()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Similarity query failed: {}", e);
                WaypointError::database(e.to_string())
            })?;

        debug!("Similarity query returned {} rows", rows.len());
        Ok(rows)
    }
}

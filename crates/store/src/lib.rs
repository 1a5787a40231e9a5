//! Waypoints store
//!
//! Read-only PostgreSQL/pgvector access to the waypoints table and
//! distance-to-score normalization.

mod connect;
mod postgres;
mod score;
mod types;

pub use connect::{connect_options, parse_connection_string};
pub use postgres::{PgWaypointStore, WaypointStore, SEARCH_LIMIT};
pub use score::{normalize, Normalized};
pub use types::{SearchResult, WaypointRow};

pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseSettings, DeploymentMode};
pub use error::WaypointError;

/// Length of every sentence embedding (BAAI/bge-small-en-v1.5)
pub const EMBEDDING_DIM: usize = 384;

pub type Result<T> = std::result::Result<T, WaypointError>;

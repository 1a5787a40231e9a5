//! Waypoints embedding backends
//!
//! Remote inference provider and local embedding service clients behind a
//! single `Embedder` trait. The backend is chosen once from the deployment
//! mode.

mod embedder;
mod local;
mod remote;
mod types;

pub use embedder::{build_embedder, http_client, Embedder};
pub use local::LocalEmbedder;
pub use remote::{HuggingFaceEmbedder, HF_EMBEDDING_ENDPOINT, HF_EMBEDDING_MODEL};
pub use types::{parse_local_embedding, parse_remote_embedding, EMBEDDING_DIM};

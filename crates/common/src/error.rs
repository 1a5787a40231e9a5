/// Waypoints error types
#[derive(Debug, thiserror::Error)]
pub enum WaypointError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store connectivity or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Embedding provider could not be reached (connect, DNS, timeout)
    #[error("Embedding service unreachable: {0}")]
    EmbeddingUnreachable(String),

    /// Embedding provider answered with a non-success status
    #[error("Embedding service returned status {0}")]
    EmbeddingStatus(u16),

    /// Embedding provider body could not be decoded
    #[error("Invalid embedding response: {0}")]
    EmbeddingResponse(String),

    /// Embedding had the wrong shape or length
    #[error("Unexpected embedding dimension: {0}")]
    EmbeddingDimension(String),

    /// Bearer credential for the remote provider is missing
    #[error("Missing embedding credential")]
    MissingCredential,

    /// Invalid client input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or incorrect site token
    #[error("Unauthorized")]
    Unauthorized,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WaypointError {
    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create database error
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create embedding-unreachable error
    pub fn embedding_unreachable<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingUnreachable(msg.into())
    }

    /// Create embedding-response error
    pub fn embedding_response<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingResponse(msg.into())
    }

    /// Create embedding-dimension error
    pub fn embedding_dimension<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingDimension(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// HTTP response mapping, consumed by the server's ResponseError impl
impl WaypointError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Unauthorized => 401,
            Self::EmbeddingStatus(_) => 502,
            Self::EmbeddingResponse(_) => 502,
            Self::EmbeddingDimension(_) => 502,
            Self::EmbeddingUnreachable(_) => 500,
            Self::MissingCredential => 500,
            Self::Database(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
        }
    }

    /// Message safe to show to clients. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::Unauthorized => "invalid or missing site token".to_string(),
            Self::Database(_) => "database query failed".to_string(),
            Self::EmbeddingUnreachable(_) => "embedding service unreachable".to_string(),
            Self::EmbeddingStatus(_) => "embedding service error".to_string(),
            Self::EmbeddingResponse(_) => "invalid embedding response".to_string(),
            Self::EmbeddingDimension(_) => "unexpected embedding dimension".to_string(),
            Self::MissingCredential => "embedding credential not configured".to_string(),
            Self::Config(_) | Self::Internal(_) | Self::Io(_) => "internal error".to_string(),
        }
    }
}

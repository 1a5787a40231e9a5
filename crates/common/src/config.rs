use crate::error::WaypointError;
use std::fmt;
use std::path::PathBuf;

/// Default base URL of the local embedding service
pub const DEFAULT_EMBEDDING_SERVICE_URL: &str = "http://127.0.0.1:5001";

/// Default PostgreSQL port for discrete connection settings
pub const DEFAULT_DATABASE_PORT: u16 = 5432;

/// Deployment mode, selects the embedding backend for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Local embedding service (`ENV` unset or anything but `prod`)
    Dev(String),
    /// Remote inference provider (`ENV=prod`)
    Prod,
}

impl DeploymentMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "prod" => Self::Prod,
            "" => Self::Dev("dev".to_string()),
            other => Self::Dev(other.to_string()),
        }
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Prod => "prod",
            Self::Dev(name) => name,
        }
    }
}

/// Where the database lives
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseSettings {
    /// `postgres://` URL or libpq `key=value` string
    ConnectionString(String),
    /// Discrete `DATABASE_*` components
    Components {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
        name: String,
    },
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionString(_) => f.write_str("ConnectionString(<redacted>)"),
            Self::Components { host, port, user, name, .. } => f
                .debug_struct("Components")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"<redacted>")
                .field("name", name)
                .finish(),
        }
    }
}

/// Waypoints application configuration
///
/// Built once at startup and shared read-only with every component.
#[derive(Clone)]
pub struct AppConfig {
    /// Database location
    pub database: DatabaseSettings,

    /// Maximum pool connections
    pub database_max_connections: u32,

    /// Pool acquire timeout in seconds
    pub database_connect_timeout_secs: u64,

    /// Listen address (host:port)
    pub server_addr: String,

    /// Deployment mode
    pub mode: DeploymentMode,

    /// Local embedding service base URL
    pub embedding_service_url: String,

    /// Bearer credential for the remote inference provider
    pub hugging_face_token: Option<String>,

    /// Outbound embedding request timeout in seconds
    pub embedding_timeout_secs: u64,

    /// Shared secret expected in `X-Site-Token`
    pub site_token: String,

    /// CORS allow-list; empty disables CORS handling
    pub cors_origins: Vec<String>,

    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Optional directory for a log file
    pub log_dir: Option<PathBuf>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database", &self.database)
            .field("database_max_connections", &self.database_max_connections)
            .field("database_connect_timeout_secs", &self.database_connect_timeout_secs)
            .field("server_addr", &self.server_addr)
            .field("mode", &self.mode)
            .field("embedding_service_url", &self.embedding_service_url)
            .field(
                "hugging_face_token",
                &self.hugging_face_token.as_ref().map(|_| "<redacted>"),
            )
            .field("embedding_timeout_secs", &self.embedding_timeout_secs)
            .field("site_token", &"<redacted>")
            .field("cors_origins", &self.cors_origins)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, WaypointError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WaypointError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = Self::database_settings(&get)?;

        let server_addr = get("SERVER_ADDR").ok_or_else(|| {
            WaypointError::config("could not find SERVER_ADDR in environment variables")
        })?;

        let site_token = get("SITE_TOKEN")
            .ok_or_else(|| WaypointError::config("SITE_TOKEN must be set in environment (.env)"))?;

        let mode = DeploymentMode::parse(&get("ENV").unwrap_or_default());

        let hugging_face_token = get("HUGGING_FACE_TOKEN");
        if mode.is_prod() && hugging_face_token.is_none() {
            return Err(WaypointError::config(
                "HUGGING_FACE_TOKEN must be set when ENV=prod",
            ));
        }

        let config = Self {
            database,
            database_max_connections: Self::parse_number(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            database_connect_timeout_secs: Self::parse_number(
                &get,
                "DATABASE_CONNECT_TIMEOUT_SECS",
                30,
            )?,
            server_addr,
            mode,
            embedding_service_url: get("EMBEDDING_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_SERVICE_URL.to_string()),
            hugging_face_token,
            embedding_timeout_secs: Self::parse_number(&get, "EMBEDDING_TIMEOUT_SECS", 30)?,
            site_token,
            cors_origins: parse_origins(&get("CORS_ORIGINS").unwrap_or_default()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_dir: get("LOG_DIR").map(PathBuf::from),
        };

        config.validate()?;

        Ok(config)
    }

    fn database_settings<F>(get: &F) -> Result<DatabaseSettings, WaypointError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(conn) = get("DATABASE_URL").or_else(|| get("DATABASE_CONFIG")) {
            return Ok(DatabaseSettings::ConnectionString(conn));
        }

        match (get("DATABASE_HOST"), get("DATABASE_NAME")) {
            (Some(host), Some(name)) => Ok(DatabaseSettings::Components {
                host,
                port: Self::parse_number(get, "DATABASE_PORT", DEFAULT_DATABASE_PORT)?,
                user: get("DATABASE_USER"),
                password: get("DATABASE_PASSWORD"),
                name,
            }),
            _ => Err(WaypointError::config(
                "could not find DATABASE_URL, DATABASE_CONFIG or DATABASE_HOST/DATABASE_NAME in environment variables",
            )),
        }
    }

    fn parse_number<F, T>(get: &F, key: &str, default: T) -> Result<T, WaypointError>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr,
    {
        match get(key) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                WaypointError::config(format!("{} must be a number, got '{}'", key, raw))
            }),
            None => Ok(default),
        }
    }

    /// Whether CORS handling is enabled
    pub fn cors_enabled(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), WaypointError> {
        if !self.embedding_service_url.starts_with("http://")
            && !self.embedding_service_url.starts_with("https://")
        {
            return Err(WaypointError::config(
                "EMBEDDING_SERVICE_URL must start with http:// or https://",
            ));
        }

        if !self.server_addr.contains(':') {
            return Err(WaypointError::config(format!(
                "SERVER_ADDR must be host:port, got '{}'",
                self.server_addr
            )));
        }

        if self.embedding_timeout_secs == 0 || self.database_connect_timeout_secs == 0 {
            return Err(WaypointError::config("timeouts must be greater than 0"));
        }

        if self.database_max_connections == 0 {
            return Err(WaypointError::config("DATABASE_MAX_CONNECTIONS cannot be 0"));
        }

        Ok(())
    }
}

/// Split a comma-separated allow-list, dropping blank entries
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

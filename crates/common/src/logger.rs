use crate::error::WaypointError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "waypoints.log";

/// Install the global tracing subscriber.
///
/// Events always go to stderr. With `log_dir` set, a plain copy is also
/// appended to `log_dir/waypoints.log`. `RUST_LOG` wins over `log_level`.
pub fn setup_logging(log_dir: Option<&Path>, log_level: &str) -> Result<(), WaypointError> {
    let log_file = log_dir.map(open_log_file).transpose()?;
    let log_path = log_file.as_ref().map(|(path, _)| path.clone());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_log_level(log_level).as_str()));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    let file_layer = log_file.map(|(_, file)| {
        fmt::layer()
            .with_writer(Arc::new(file))
            .with_target(true)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| WaypointError::config(format!("Failed to initialize logging: {}", e)))?;

    match log_path {
        Some(path) => tracing::info!("Logging to stderr and {} at {}", path.display(), log_level),
        None => tracing::info!("Logging to stderr at {}", log_level),
    }

    Ok(())
}

fn open_log_file(dir: &Path) -> Result<(PathBuf, File), WaypointError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        WaypointError::config(format!("Cannot create log directory {}: {}", dir.display(), e))
    })?;

    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| WaypointError::config(format!("Cannot open {}: {}", path.display(), e)))?;

    Ok((path, file))
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}

//! Waypoints HTTP server
//!
//! Actix-web API over the waypoints store: health, count and semantic
//! search, behind site-token auth and optional CORS.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod state;
pub mod types;

use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_actix_web::TracingLogger;
use waypoints_common::{AppConfig, Result};

pub use error::ApiError;
pub use middleware::{Cors, SiteToken, SITE_TOKEN_HEADER};
pub use search::search_waypoints;
pub use state::AppState;

/// Run the HTTP server until it is stopped
pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let state = web::Data::new(state);
    let site_token = config.site_token.clone();
    let cors_origins = config.cors_origins.clone();

    if config.cors_enabled() {
        info!("CORS enabled for {} origin(s)", cors_origins.len());
    }

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(SiteToken::new(site_token.clone()))
            .wrap(Cors::new(cors_origins.clone()))
            .wrap(TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&config.server_addr)?;

    info!("listening on {}", config.server_addr);
    server.run().await?;

    info!("Server stopped");
    Ok(())
}

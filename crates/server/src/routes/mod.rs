mod health;
mod waypoints;

use actix_web::web;
use waypoints_common::WaypointError;

use crate::error::ApiError;

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Query strings that fail to deserialize (e.g. a repeated `q`) still
    // answer with the JSON error body.
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected query string: {}", err);
        ApiError(WaypointError::invalid_input("invalid query parameter q")).into()
    });

    cfg.app_data(query_config)
        .service(health::health)
        .service(waypoints::count)
        .service(waypoints::search);
}

//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing) and
//! returns the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Teams
        .route(
            "/teams",
            get(handlers::list_teams).post(handlers::create_team),
        )
        .route(
            "/teams/{team_id}",
            get(handlers::get_team)
                .put(handlers::update_team)
                .delete(handlers::delete_team),
        )
        // Drivers
        .route(
            "/drivers",
            get(handlers::list_drivers).post(handlers::create_driver),
        )
        .route(
            "/drivers/number/{number}",
            get(handlers::get_driver_by_number),
        )
        .route(
            "/drivers/{driver_id}",
            put(handlers::update_driver).delete(handlers::delete_driver),
        )
        // Races and results
        .route(
            "/races",
            get(handlers::list_races).post(handlers::create_race),
        )
        .route("/races/{race_id}/results", get(handlers::list_race_results))
        .route("/results", post(handlers::record_result))
        // Read models
        .route("/standings", get(handlers::get_standings))
        .route("/reports/championship", get(handlers::championship_report));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        let _router = create_router(AppState::new(repo));
    }
}

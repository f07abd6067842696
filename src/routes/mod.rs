//! Rutas HTTP
//!
//! Cada módulo expone un `Router<AppState>` que se anida bajo su prefijo.

pub mod assignment_routes;
pub mod capacity_routes;
pub mod coverage_routes;
pub mod route_admin_routes;
pub mod territory_routes;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    routing::get,
    BoxError, Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use crate::state::AppState;

/// Tiempo máximo por petición; un lote abandonado se detiene entre tareas
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Construir el router completo de la API
pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors_origins.is_empty() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(state.config.cors_origins.clone())
    };

    Router::new()
        .route("/health", get(health_check))
        .nest("/territory", territory_routes::create_territory_router())
        .nest("/assignments", assignment_routes::create_assignment_router())
        .nest("/capacity", capacity_routes::create_capacity_router())
        .nest("/routes", route_admin_routes::create_route_admin_router())
        .nest("/coverage", coverage_routes::create_coverage_router())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(REQUEST_TIMEOUT),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "REQUEST_TIMEOUT", "message": "Request took too long" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "INTERNAL_ERROR", "message": err.to_string() })),
        )
    }
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "routes": state.ledger.route_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

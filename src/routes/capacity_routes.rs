use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::capacity_controller::CapacityController;
use crate::dto::api_response::ApiResponse;
use crate::dto::capacity_dto::{RecomputeResponse, ReleaseRequest, ReleaseResponse, SnapshotQuery};
use crate::models::capacity::CapacitySnapshot;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_capacity_router() -> Router<AppState> {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/release", post(release_capacity))
        .route("/recompute", post(recompute_ledger))
}

fn controller(state: &AppState) -> CapacityController {
    CapacityController::new(state.ledger.clone(), state.repository.clone())
}

async fn get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<Vec<CapacitySnapshot>>, AppError> {
    let response = controller(&state).snapshots(query).await?;
    Ok(Json(response))
}

async fn release_capacity(
    State(state): State<AppState>,
    Json(request): Json<ReleaseRequest>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let response = controller(&state).release(request).await?;
    Ok(Json(response))
}

async fn recompute_ledger(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RecomputeResponse>>, AppError> {
    let routes = state.reconcile_ledger().await?;
    tracing::info!("🔄 Ledger reconciliado: {} rutas", routes);
    Ok(Json(ApiResponse::success_with_message(
        RecomputeResponse { routes },
        "Ledger reconciled with persisted assignments".to_string(),
    )))
}

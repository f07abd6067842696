use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::assignment_controller::AssignmentController;
use crate::dto::assignment_dto::{
    AssignmentResponse, BatchAssignmentRequest, BatchAssignmentResponse, ReassignRequest,
    SingleAssignmentRequest,
};
use crate::services::assignment_coordinator::CancellationFlag;
use crate::state::AppState;
use crate::utils::errors::{internal_error, AppError};

pub fn create_assignment_router() -> Router<AppState> {
    Router::new()
        .route("/single", post(assign_single))
        .route("/batch", post(assign_batch))
        .route("/reassign", post(reassign))
}

/// Marca el lote como cancelado cuando la petición se abandona
struct CancelOnDrop(CancellationFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn controller(state: &AppState) -> AssignmentController {
    AssignmentController::new(state.coordinator.clone(), state.geocoder.clone())
}

async fn assign_single(
    State(state): State<AppState>,
    Json(request): Json<SingleAssignmentRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let response = controller(&state).assign_single(request).await?;
    Ok(Json(response))
}

async fn assign_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchAssignmentRequest>,
) -> Result<Json<BatchAssignmentResponse>, AppError> {
    let flag = CancellationFlag::new();
    let _guard = CancelOnDrop(flag.clone());
    let controller = controller(&state);

    // El lote corre en su propia tarea: si el cliente se desconecta o la
    // petición expira, se detiene entre tareas en lugar de a mitad de una.
    let response = tokio::spawn(async move { controller.assign_batch(request, Some(&flag)).await })
        .await
        .map_err(|e| internal_error(&format!("Batch assignment task failed: {}", e)))??;

    Ok(Json(response))
}

async fn reassign(
    State(state): State<AppState>,
    Json(request): Json<ReassignRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let response = controller(&state).reassign(request).await?;
    Ok(Json(response))
}

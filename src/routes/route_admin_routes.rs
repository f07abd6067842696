use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::api_response::ApiResponse;
use crate::dto::route_dto::{CreateRouteRequest, RouteResponse, UpdateCapacityRequest};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_route))
        .route("/:id", get(get_route).delete(delete_route))
        .route("/:id/capacity", put(update_capacity))
        .route("/:id/deactivate", post(deactivate_route))
        .route("/:id/activate", post(activate_route))
}

fn controller(state: &AppState) -> RouteController {
    RouteController::new(state.ledger.clone(), state.repository.clone())
}

async fn create_route(
    State(state): State<AppState>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Route created".to_string())))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteResponse>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_capacity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCapacityRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let response = controller(&state).update_capacity(id, request).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn deactivate_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let response = controller(&state).set_active(id, false).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Route deactivated".to_string())))
}

async fn activate_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let response = controller(&state).set_active(id, true).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Route activated".to_string())))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    controller(&state).delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Route deleted"
    })))
}

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::territory_controller::TerritoryController;
use crate::dto::territory_dto::{ResolveQuery, ResolveResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_territory_router() -> Router<AppState> {
    Router::new().route("/resolve", get(resolve_territory))
}

async fn resolve_territory(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, AppError> {
    let controller = TerritoryController::new(state.repository.clone());
    let response = controller.resolve(query).await?;
    Ok(Json(response))
}

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::coverage_controller::CoverageController;
use crate::dto::coverage_dto::CoverageQuery;
use crate::services::coverage_auditor::CoverageReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_coverage_router() -> Router<AppState> {
    Router::new().route("/gaps", get(find_coverage_gaps))
}

async fn find_coverage_gaps(
    State(state): State<AppState>,
    Query(query): Query<CoverageQuery>,
) -> Result<Json<CoverageReport>, AppError> {
    let controller = CoverageController::new(state.repository.clone(), state.config.coverage_grid);
    let report = controller.gaps(query).await?;
    Ok(Json(report))
}

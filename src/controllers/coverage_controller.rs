use std::sync::Arc;

use crate::dto::coverage_dto::CoverageQuery;
use crate::repositories::route_repository::RouteRepository;
use crate::services::coverage_auditor::{find_gaps, CoverageReport, GridSpec};
use crate::utils::errors::{bad_request_error, internal_error, AppError, AppResult};

pub struct CoverageController {
    repository: Arc<dyn RouteRepository>,
    grid: GridSpec,
}

impl CoverageController {
    pub fn new(repository: Arc<dyn RouteRepository>, grid: GridSpec) -> Self {
        Self { repository, grid }
    }

    pub async fn gaps(&self, query: CoverageQuery) -> AppResult<CoverageReport> {
        let depot = self
            .repository
            .find_depot(query.depot_id)
            .await?
            .ok_or(AppError::DepotNotFound(query.depot_id))?;
        let boundary = depot
            .boundary
            .ok_or_else(|| bad_request_error("Depot has no service boundary"))?;
        let routes = self.repository.find_active(Some(depot.id)).await?;
        let grid = self.grid;

        // Muestreo de rejilla: trabajo de CPU fuera del runtime async
        let report = tokio::task::spawn_blocking(move || find_gaps(&boundary, &routes, &grid))
            .await
            .map_err(|e| internal_error(&format!("Coverage audit task failed: {}", e)))??;

        Ok(report)
    }
}

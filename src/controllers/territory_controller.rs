use std::sync::Arc;

use crate::dto::territory_dto::{ResolveQuery, ResolveResponse};
use crate::models::geo::GeoPoint;
use crate::repositories::route_repository::RouteRepository;
use crate::services::territory_resolver::resolve;
use crate::utils::errors::AppResult;

pub struct TerritoryController {
    repository: Arc<dyn RouteRepository>,
}

impl TerritoryController {
    pub fn new(repository: Arc<dyn RouteRepository>) -> Self {
        Self { repository }
    }

    pub async fn resolve(&self, query: ResolveQuery) -> AppResult<ResolveResponse> {
        let point = GeoPoint::new(query.lat, query.lng)?;
        let candidates = self.repository.find_active(query.depot_id).await?;

        Ok(ResolveResponse {
            route_ids: resolve(&point, &candidates),
        })
    }
}

use std::sync::Arc;

use crate::dto::capacity_dto::{ReleaseRequest, ReleaseResponse, SnapshotQuery};
use crate::models::capacity::CapacitySnapshot;
use crate::repositories::route_repository::RouteRepository;
use crate::services::capacity_ledger::{CapacityError, CapacityLedger};
use crate::utils::errors::{bad_request_error, AppResult};

pub struct CapacityController {
    ledger: CapacityLedger,
    repository: Arc<dyn RouteRepository>,
}

impl CapacityController {
    pub fn new(ledger: CapacityLedger, repository: Arc<dyn RouteRepository>) -> Self {
        Self { ledger, repository }
    }

    pub async fn snapshots(&self, query: SnapshotQuery) -> AppResult<Vec<CapacitySnapshot>> {
        match (query.route_id, query.depot_id) {
            (Some(route_id), _) => Ok(vec![self.ledger.snapshot(route_id).await?]),
            (None, Some(depot_id)) => {
                let routes = self.repository.find_by_depot(depot_id, query.date).await?;
                let ids: Vec<_> = routes.iter().map(|r| r.id).collect();
                Ok(self.ledger.snapshots(&ids).await)
            }
            (None, None) => Err(bad_request_error("Either routeId or depotId is required")),
        }
    }

    /// Liberación compensatoria. Una ruta desconocida se registra y no falla.
    pub async fn release(&self, request: ReleaseRequest) -> AppResult<ReleaseResponse> {
        let count = request.count.unwrap_or(1);
        if count == 0 {
            return Err(bad_request_error("count must be at least 1"));
        }

        match self.ledger.release(request.route_id, count).await {
            Ok(load) => {
                log::info!(
                    "↩️ Liberada capacidad de ruta {} por tarea {} (carga {})",
                    request.route_id, request.task_id, load
                );
                let snapshot = self.ledger.snapshot(request.route_id).await.ok();
                Ok(ReleaseResponse {
                    released: true,
                    task_id: request.task_id,
                    snapshot,
                })
            }
            Err(CapacityError::RouteNotFound(route_id)) => {
                log::warn!(
                    "⚠️ Liberación para ruta desconocida {} (tarea {}); se ignora",
                    route_id, request.task_id
                );
                Ok(ReleaseResponse {
                    released: false,
                    task_id: request.task_id,
                    snapshot: None,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

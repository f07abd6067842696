use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::route_dto::{CreateRouteRequest, RouteResponse, UpdateCapacityRequest};
use crate::models::geo::GeoPoint;
use crate::models::route::NewRoute;
use crate::repositories::route_repository::RouteRepository;
use crate::services::capacity_ledger::{CapacityError, CapacityLedger};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::geometry::{normalize_closed_polygon, validate_simple};

pub struct RouteController {
    ledger: CapacityLedger,
    repository: Arc<dyn RouteRepository>,
}

impl RouteController {
    pub fn new(ledger: CapacityLedger, repository: Arc<dyn RouteRepository>) -> Self {
        Self { ledger, repository }
    }

    pub async fn create(&self, request: CreateRouteRequest) -> AppResult<RouteResponse> {
        request.validate()?;

        let points = request
            .geofence
            .iter()
            .map(|pair| GeoPoint::from_pair(*pair, request.coordinate_order))
            .collect::<Result<Vec<_>, _>>()?;
        let geofence = normalize_closed_polygon(&points)?;
        validate_simple(&geofence)?;

        let route = self
            .repository
            .create_route(NewRoute {
                depot_id: request.depot_id,
                name: request.name,
                color: request.color,
                geofence,
                capacity: request.capacity,
                service_date: request.service_date,
            })
            .await?;

        self.ledger.register(&route, 0).await;
        log::info!("🆕 Ruta {} creada para depósito {}", route.id, route.depot_id);
        Ok(route.into())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<RouteResponse> {
        let route = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(AppError::RouteNotFound(id))?;
        Ok(route.into())
    }

    /// Cambiar límites de capacidad. El ledger valida primero que el nuevo
    /// máximo no quede por debajo de la carga actual.
    pub async fn update_capacity(&self, id: Uuid, request: UpdateCapacityRequest) -> AppResult<RouteResponse> {
        request.validate()?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(AppError::RouteNotFound(id))?;

        self.ledger.set_max_orders(id, request.capacity.max_orders).await?;

        match self.repository.update_capacity(id, request.capacity).await {
            Ok(route) => Ok(route.into()),
            Err(e) => {
                if let Err(restore) = self.ledger.set_max_orders(id, current.capacity.max_orders).await {
                    log::error!("❌ No se pudo restaurar la capacidad de ruta {}: {}", id, restore);
                }
                Err(e)
            }
        }
    }

    /// Activar o desactivar (baja lógica). Las asignaciones existentes no se tocan.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<RouteResponse> {
        let route = self.repository.set_active(id, is_active).await?;

        match self.ledger.set_active(id, is_active).await {
            Ok(()) => {}
            Err(CapacityError::RouteNotFound(_)) => {
                log::warn!("⚠️ Ruta {} no estaba en el ledger; se registra con carga 0", id);
                self.ledger.register(&route, 0).await;
            }
            Err(e) => return Err(e.into()),
        }

        log::info!("🔁 Ruta {} {}", id, if is_active { "activada" } else { "desactivada" });
        Ok(route.into())
    }

    /// Borrar una ruta. Se cierra a nuevas reservas antes de comprobar que no
    /// tiene carga; si el borrado no procede se restaura su estado.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let route = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(AppError::RouteNotFound(id))?;

        match self.ledger.set_active(id, false).await {
            Ok(()) | Err(CapacityError::RouteNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let load = self.ledger.snapshot(id).await.map(|s| s.current_load).unwrap_or(0);
        let result = if load > 0 {
            Err(AppError::Conflict(format!("Route '{}' still carries {} reserved tasks", id, load)))
        } else {
            self.repository.delete_route(id).await
        };

        if let Err(e) = result {
            if let Err(restore) = self.ledger.set_active(id, route.is_active).await {
                log::warn!("⚠️ No se pudo restaurar el estado de ruta {}: {}", id, restore);
            }
            return Err(e);
        }

        self.ledger.remove(id).await;
        log::info!("🗑️ Ruta {} borrada", id);
        Ok(())
    }
}

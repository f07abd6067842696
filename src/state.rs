//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. El único estado mutable compartido es el del
//! `CapacityLedger`.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::route_repository::RouteRepository;
use crate::services::assignment_coordinator::AssignmentCoordinator;
use crate::services::capacity_ledger::CapacityLedger;
use crate::services::geocoding_service::Geocoder;
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repository: Arc<dyn RouteRepository>,
    pub ledger: CapacityLedger,
    pub coordinator: AssignmentCoordinator,
    pub geocoder: Option<Arc<dyn Geocoder>>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repository: Arc<dyn RouteRepository>,
        geocoder: Option<Arc<dyn Geocoder>>,
    ) -> Self {
        let ledger = CapacityLedger::new(config.capacity_thresholds);
        let coordinator = AssignmentCoordinator::new(ledger.clone(), repository.clone());

        Self {
            config,
            repository,
            ledger,
            coordinator,
            geocoder,
        }
    }

    /// Reconstruir el ledger desde las tareas persistidas. Solo en el arranque,
    /// antes de aceptar peticiones.
    pub async fn seed_ledger(&self) -> AppResult<usize> {
        let routes = self.repository.list_all().await?;
        let counts = self.repository.assigned_task_counts().await?;
        self.ledger.seed(&routes, &counts).await;
        Ok(routes.len())
    }

    /// Alinear el ledger con el repositorio con el servicio en marcha, sin perder
    /// reservas pendientes de persistir
    pub async fn reconcile_ledger(&self) -> AppResult<usize> {
        let routes = self.repository.list_all().await?;
        let counts = self.repository.assigned_task_counts().await?;
        Ok(self.ledger.reconcile(&routes, &counts).await)
    }
}

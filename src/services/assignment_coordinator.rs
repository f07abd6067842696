//! Coordinador de asignaciones
//!
//! Orquesta la asignación de tareas a rutas: resuelve territorio (o acepta una
//! ruta destino explícita), reserva capacidad en el ledger y devuelve el
//! resultado por tarea. No persiste nada: el llamador guarda el vínculo
//! tarea→ruta y, si eso falla, llama a `release` como compensación.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::Task;
use crate::repositories::route_repository::RouteRepository;
use crate::services::capacity_ledger::{CapacityError, CapacityLedger};
use crate::services::territory_resolver::resolve;
use crate::utils::errors::{AppError, AppResult};

/// Motivo por el que una tarea no pudo asignarse
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnassignableReason {
    /// Ninguna geocerca activa contiene el punto
    NoContainingRoute,
    /// Hay geocercas que contienen el punto, pero todas están llenas
    NoCapacityAvailable,
    /// La ruta destino explícita está llena
    CapacityExceeded,
    /// La ruta destino explícita está inactiva
    RouteInactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentResult {
    Assigned { route_id: Uuid },
    Unassignable { reason: UnassignableReason },
}

/// Resultado de una reasignación. `previous_route_released` es falso cuando la
/// ruta anterior no estaba en el ledger y no se liberó nada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignOutcome {
    pub result: AssignmentResult,
    pub previous_route_released: bool,
}

/// Estado por tarea dentro de un lote
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BatchTaskStatus {
    Assigned,
    CapacityExceeded,
    RouteInactive,
    /// El lote se canceló antes de llegar a esta tarea
    NotProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTaskResult {
    pub task_id: Uuid,
    pub status: BatchTaskStatus,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub target_route_id: Uuid,
    pub notes: Option<String>,
    pub results: Vec<BatchTaskResult>,
}

impl BatchOutcome {
    pub fn assigned_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == BatchTaskStatus::Assigned)
            .count()
    }

    pub fn rejected_count(&self) -> usize {
        self.results.len() - self.assigned_count()
    }
}

/// Bandera compartida para detener un lote entre tareas
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct AssignmentCoordinator {
    ledger: CapacityLedger,
    repository: Arc<dyn RouteRepository>,
}

impl AssignmentCoordinator {
    pub fn new(ledger: CapacityLedger, repository: Arc<dyn RouteRepository>) -> Self {
        Self { ledger, repository }
    }

    /// Asignar una tarea.
    ///
    /// Con `target_route_id` se omite la resolución de territorio. Sin él, se
    /// prueban en orden las rutas activas (opcionalmente de `depot_scope`) cuya
    /// geocerca contiene la tarea, hasta que una reserva tiene éxito.
    pub async fn assign_single(
        &self,
        task: &Task,
        target_route_id: Option<Uuid>,
        depot_scope: Option<Uuid>,
    ) -> AppResult<AssignmentResult> {
        match target_route_id {
            Some(route_id) => self.assign_to_target(task, route_id).await,
            None => self.assign_by_territory(task, depot_scope).await,
        }
    }

    async fn assign_to_target(&self, task: &Task, route_id: Uuid) -> AppResult<AssignmentResult> {
        let route = self
            .repository
            .find_by_id(route_id)
            .await?
            .ok_or(AppError::RouteNotFound(route_id))?;

        if !route.is_active {
            log::info!("⛔ Tarea {} rechazada: ruta {} inactiva", task.id, route_id);
            return Ok(AssignmentResult::Unassignable { reason: UnassignableReason::RouteInactive });
        }

        match self.ledger.reserve(route_id, 1).await {
            Ok(load) => {
                log::info!("✅ Tarea {} asignada a ruta {} (carga {})", task.id, route_id, load);
                Ok(AssignmentResult::Assigned { route_id })
            }
            Err(CapacityError::CapacityExceeded { .. }) => {
                log::info!("📦 Tarea {} rechazada: ruta {} llena", task.id, route_id);
                Ok(AssignmentResult::Unassignable { reason: UnassignableReason::CapacityExceeded })
            }
            Err(CapacityError::RouteInactive(_)) => {
                Ok(AssignmentResult::Unassignable { reason: UnassignableReason::RouteInactive })
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn assign_by_territory(&self, task: &Task, depot_scope: Option<Uuid>) -> AppResult<AssignmentResult> {
        let candidates = self.repository.find_active(depot_scope).await?;
        let matches = resolve(&task.location, &candidates);

        if matches.is_empty() {
            log::info!(
                "🗺️ Tarea {} en ({}, {}) fuera de toda geocerca activa",
                task.id, task.location.lat, task.location.lng
            );
            return Ok(AssignmentResult::Unassignable { reason: UnassignableReason::NoContainingRoute });
        }

        for route_id in matches {
            match self.ledger.reserve(route_id, 1).await {
                Ok(load) => {
                    log::info!("✅ Tarea {} asignada por territorio a ruta {} (carga {})", task.id, route_id, load);
                    return Ok(AssignmentResult::Assigned { route_id });
                }
                Err(CapacityError::CapacityExceeded { .. }) | Err(CapacityError::RouteInactive(_)) => continue,
                Err(e) => {
                    log::warn!("⚠️ Ruta candidata {} omitida: {}", route_id, e);
                    continue;
                }
            }
        }

        log::info!("📦 Tarea {}: todas las rutas que la contienen están llenas", task.id);
        Ok(AssignmentResult::Unassignable { reason: UnassignableReason::NoCapacityAvailable })
    }

    /// Asignar un lote de tareas a una ruta, en orden de entrada.
    ///
    /// No es todo-o-nada: cada tarea reserva por separado. Cuando la ruta se
    /// llena, todas las tareas siguientes quedan `CapacityExceeded` sin más
    /// intentos. La cancelación detiene el lote entre tareas y nunca revierte las
    /// reservas ya hechas.
    pub async fn assign_batch(
        &self,
        tasks: &[Task],
        target_route_id: Uuid,
        notes: Option<String>,
        cancellation: Option<&CancellationFlag>,
    ) -> AppResult<BatchOutcome> {
        let route = self
            .repository
            .find_by_id(target_route_id)
            .await?
            .ok_or(AppError::RouteNotFound(target_route_id))?;

        let mut stopped: Option<BatchTaskStatus> = if route.is_active {
            None
        } else {
            Some(BatchTaskStatus::RouteInactive)
        };
        let mut results = Vec::with_capacity(tasks.len());

        for task in tasks {
            if stopped.is_none() && cancellation.map_or(false, |flag| flag.is_cancelled()) {
                log::info!("🛑 Lote para ruta {} cancelado tras {} tareas", target_route_id, results.len());
                stopped = Some(BatchTaskStatus::NotProcessed);
            }

            if let Some(status) = stopped {
                results.push(BatchTaskResult { task_id: task.id, status });
                continue;
            }

            let status = match self.ledger.reserve(target_route_id, 1).await {
                Ok(_) => BatchTaskStatus::Assigned,
                Err(CapacityError::CapacityExceeded { .. }) => {
                    stopped = Some(BatchTaskStatus::CapacityExceeded);
                    BatchTaskStatus::CapacityExceeded
                }
                Err(CapacityError::RouteInactive(_)) => {
                    stopped = Some(BatchTaskStatus::RouteInactive);
                    BatchTaskStatus::RouteInactive
                }
                Err(e) => return Err(e.into()),
            };
            results.push(BatchTaskResult { task_id: task.id, status });
        }

        let outcome = BatchOutcome { target_route_id, notes, results };
        log::info!(
            "📋 Lote para ruta {}: {} asignadas, {} rechazadas",
            target_route_id,
            outcome.assigned_count(),
            outcome.rejected_count()
        );
        Ok(outcome)
    }

    /// Reasignar una tarea: primero libera la ruta actual y luego asigna de nuevo.
    ///
    /// Si la nueva asignación falla, la tarea queda flotante.
    pub async fn reassign(
        &self,
        task: &Task,
        current_route_id: Uuid,
        target_route_id: Option<Uuid>,
        depot_scope: Option<Uuid>,
    ) -> AppResult<ReassignOutcome> {
        let previous_route_released = match self.ledger.release(current_route_id, 1).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("⚠️ Liberación previa a reasignación ignorada: {}", e);
                false
            }
        };

        let result = self.assign_single(task, target_route_id, depot_scope).await?;
        Ok(ReassignOutcome { result, previous_route_released })
    }
}

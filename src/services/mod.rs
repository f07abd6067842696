//! Services module
//!
//! Lógica del motor: resolución de territorio, ledger de capacidad,
//! coordinación de asignaciones, auditoría de cobertura y geocodificación.

pub mod assignment_coordinator;
pub mod capacity_ledger;
pub mod coverage_auditor;
pub mod geocoding_service;
pub mod territory_resolver;

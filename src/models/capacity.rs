//! Vista derivada de capacidad
//!
//! `CapacitySnapshot` es de solo lectura; se calcula a partir de los contadores
//! del ledger y de los umbrales configurados.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Umbral de "casi llena", en porcentaje de utilización.
///
/// "Llena" no es configurable: una ruta está llena cuando `carga ≥ máximo`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityThresholds {
    pub near_capacity_pct: u32,
}

impl Default for CapacityThresholds {
    fn default() -> Self {
        Self { near_capacity_pct: 80 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub route_id: Uuid,
    pub current_load: u32,
    pub max_capacity: u32,
    pub utilization_percentage: u32,
    pub available_capacity: u32,
    pub is_full: bool,
    pub is_near_capacity: bool,
    pub is_active: bool,
}

impl CapacitySnapshot {
    pub fn compute(
        route_id: Uuid,
        current_load: u32,
        max_capacity: u32,
        is_active: bool,
        thresholds: &CapacityThresholds,
    ) -> Self {
        let utilization_percentage = if max_capacity == 0 {
            100
        } else {
            (f64::from(current_load) / f64::from(max_capacity) * 100.0).round() as u32
        };
        // El porcentaje redondeado no decide: 199/200 muestra 100% y aún admite una tarea
        let is_full = current_load >= max_capacity;

        Self {
            route_id,
            current_load,
            max_capacity,
            utilization_percentage,
            available_capacity: max_capacity.saturating_sub(current_load),
            is_full,
            is_near_capacity: utilization_percentage >= thresholds.near_capacity_pct && !is_full,
            is_active,
        }
    }
}

//! Modelo de Route
//!
//! Una ruta de servicio con su territorio (geocerca) y su límite de capacidad.
//! El contador `current_load` persistido es informativo: la fuente de verdad en
//! tiempo de ejecución es el `CapacityLedger`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::geo::Polygon;

/// Límites de capacidad de una ruta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteCapacity {
    #[validate(range(min = 1))]
    pub max_orders: u32,

    #[validate(range(min = 0.0))]
    pub max_distance_km: f64,

    #[validate(range(min = 0.0))]
    pub max_duration_minutes: f64,
}

/// Route principal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub depot_id: Uuid,
    pub name: Option<String>,
    pub color: Option<String>,
    pub geofence: Polygon,
    pub capacity: RouteCapacity,
    pub current_load: u32,
    pub is_active: bool,
    pub service_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Datos para crear una ruta ya validados
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub depot_id: Uuid,
    pub name: Option<String>,
    pub color: Option<String>,
    pub geofence: Polygon,
    pub capacity: RouteCapacity,
    pub service_date: Option<NaiveDate>,
}

impl Route {
    /// Construir una ruta nueva con carga 0 y activa
    pub fn from_new(new_route: NewRoute) -> Self {
        Self {
            id: Uuid::new_v4(),
            depot_id: new_route.depot_id,
            name: new_route.name,
            color: new_route.color,
            geofence: new_route.geofence,
            capacity: new_route.capacity,
            current_load: 0,
            is_active: true,
            service_date: new_route.service_date,
            created_at: Utc::now(),
        }
    }
}

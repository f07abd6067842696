//! Modelo de Task
//!
//! Una tarea sin `route_id` es una tarea flotante (sin ruta).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::geo::GeoPoint;

/// Prioridad de la tarea
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub location: GeoPoint,
    pub route_id: Option<Uuid>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: Uuid, location: GeoPoint) -> Self {
        Self {
            id,
            location,
            route_id: None,
            priority: TaskPriority::default(),
            created_at: Utc::now(),
        }
    }
}

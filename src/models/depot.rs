//! Modelo de Depot
//!
//! Solo se modela lo que necesita la auditoría de cobertura: el límite de servicio.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::geo::Polygon;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depot {
    pub id: Uuid,
    pub name: String,
    pub boundary: Option<Polygon>,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Query para resolver territorio
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
    pub lat: f64,
    pub lng: f64,
    pub depot_id: Option<Uuid>,
}

// Rutas candidatas, en orden de preferencia
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub route_ids: Vec<Uuid>,
}

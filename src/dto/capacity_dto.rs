use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::capacity::CapacitySnapshot;

// `routeId` o bien `depotId` (+ `date` opcional)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    pub route_id: Option<Uuid>,
    pub depot_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub route_id: Uuid,
    pub task_id: Uuid,
    pub count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResponse {
    pub released: bool,
    pub task_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<CapacitySnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeResponse {
    pub routes: usize,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::geo::GeoPoint;
use crate::models::task::TaskPriority;
use crate::services::assignment_coordinator::{
    AssignmentResult, BatchOutcome, BatchTaskStatus, UnassignableReason,
};

// Request de asignación individual: `location` o `address` (se geocodifica)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SingleAssignmentRequest {
    pub task_id: Uuid,
    pub location: Option<GeoPoint>,
    #[validate(length(min = 3, max = 500))]
    pub address: Option<String>,
    pub depot_id: Option<Uuid>,
    pub target_route_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssignmentStatus {
    Assigned,
    Unassignable,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub task_id: Uuid,
    pub status: AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnassignableReason>,
    /// Solo en reasignaciones: si la ruta anterior liberó su reserva
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_route_released: Option<bool>,
}

impl AssignmentResponse {
    pub fn from_result(task_id: Uuid, result: AssignmentResult) -> Self {
        match result {
            AssignmentResult::Assigned { route_id } => Self {
                task_id,
                status: AssignmentStatus::Assigned,
                route_id: Some(route_id),
                reason: None,
                previous_route_released: None,
            },
            AssignmentResult::Unassignable { reason } => Self {
                task_id,
                status: AssignmentStatus::Unassignable,
                route_id: None,
                reason: Some(reason),
                previous_route_released: None,
            },
        }
    }
}

// Serialize: validator incluye el valor del Vec en el error de `length`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTaskInput {
    pub task_id: Uuid,
    pub location: GeoPoint,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchAssignmentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub tasks: Vec<BatchTaskInput>,
    pub target_route_id: Uuid,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTaskResponse {
    pub task_id: Uuid,
    pub status: BatchTaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAssignmentResponse {
    pub target_route_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub assigned: usize,
    pub rejected: usize,
    pub results: Vec<BatchTaskResponse>,
}

fn batch_reason(status: BatchTaskStatus) -> Option<String> {
    match status {
        BatchTaskStatus::Assigned => None,
        BatchTaskStatus::CapacityExceeded => Some("route is full".to_string()),
        BatchTaskStatus::RouteInactive => Some("route is inactive".to_string()),
        BatchTaskStatus::NotProcessed => Some("batch was cancelled before this task".to_string()),
    }
}

impl From<BatchOutcome> for BatchAssignmentResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let assigned = outcome.assigned_count();
        let rejected = outcome.rejected_count();

        Self {
            target_route_id: outcome.target_route_id,
            notes: outcome.notes,
            assigned,
            rejected,
            results: outcome
                .results
                .into_iter()
                .map(|r| BatchTaskResponse {
                    task_id: r.task_id,
                    status: r.status,
                    reason: batch_reason(r.status),
                })
                .collect(),
        }
    }
}

// Request de reasignación: liberar la ruta actual y asignar de nuevo
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
    pub task_id: Uuid,
    pub location: GeoPoint,
    pub current_route_id: Uuid,
    pub target_route_id: Option<Uuid>,
    pub depot_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(tasks: usize) -> BatchAssignmentRequest {
        BatchAssignmentRequest {
            tasks: (0..tasks)
                .map(|_| BatchTaskInput {
                    task_id: Uuid::new_v4(),
                    location: GeoPoint { lat: 1.0, lng: 1.0 },
                    priority: TaskPriority::default(),
                })
                .collect(),
            target_route_id: Uuid::new_v4(),
            notes: None,
        }
    }

    #[test]
    fn test_batch_request_task_count_bounds() {
        assert!(batch(1).validate().is_ok());

        let errors = batch(0).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("tasks"));

        assert!(batch(1001).validate().is_err());
    }

    #[test]
    fn test_reassign_flag_only_serialized_when_set() {
        let route_id = Uuid::new_v4();
        let mut response =
            AssignmentResponse::from_result(Uuid::new_v4(), AssignmentResult::Assigned { route_id });
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("previousRouteReleased").is_none());

        response.previous_route_released = Some(false);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["previousRouteReleased"], false);
    }
}

use std::sync::Arc;

use validator::Validate;

use crate::dto::assignment_dto::{
    AssignmentResponse, BatchAssignmentRequest, BatchAssignmentResponse, ReassignRequest,
    SingleAssignmentRequest,
};
use crate::models::geo::GeoPoint;
use crate::models::task::Task;
use crate::services::assignment_coordinator::{AssignmentCoordinator, CancellationFlag};
use crate::services::geocoding_service::Geocoder;
use crate::utils::errors::{bad_request_error, AppResult};

pub struct AssignmentController {
    coordinator: AssignmentCoordinator,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl AssignmentController {
    pub fn new(coordinator: AssignmentCoordinator, geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        Self { coordinator, geocoder }
    }

    /// Ubicación de la tarea: coordenadas explícitas o dirección geocodificada
    async fn locate(&self, location: Option<GeoPoint>, address: Option<&str>) -> AppResult<GeoPoint> {
        match (location, address) {
            (Some(point), _) => {
                point.validate()?;
                Ok(point)
            }
            (None, Some(address)) => {
                let geocoder = self
                    .geocoder
                    .as_ref()
                    .ok_or_else(|| bad_request_error("Address lookup is not configured; send a location"))?;

                geocoder
                    .geocode(address)
                    .await?
                    .ok_or_else(|| bad_request_error("Address could not be geocoded"))
            }
            (None, None) => Err(bad_request_error("Either location or address is required")),
        }
    }

    pub async fn assign_single(&self, request: SingleAssignmentRequest) -> AppResult<AssignmentResponse> {
        request.validate()?;

        let location = self.locate(request.location, request.address.as_deref()).await?;
        let task = Task::new(request.task_id, location);

        let result = self
            .coordinator
            .assign_single(&task, request.target_route_id, request.depot_id)
            .await?;

        Ok(AssignmentResponse::from_result(task.id, result))
    }

    pub async fn assign_batch(
        &self,
        request: BatchAssignmentRequest,
        cancellation: Option<&CancellationFlag>,
    ) -> AppResult<BatchAssignmentResponse> {
        request.validate()?;

        let mut tasks = Vec::with_capacity(request.tasks.len());
        for input in request.tasks {
            input.location.validate()?;
            let mut task = Task::new(input.task_id, input.location);
            task.priority = input.priority;
            tasks.push(task);
        }

        let outcome = self
            .coordinator
            .assign_batch(&tasks, request.target_route_id, request.notes, cancellation)
            .await?;

        Ok(outcome.into())
    }

    pub async fn reassign(&self, request: ReassignRequest) -> AppResult<AssignmentResponse> {
        request.location.validate()?;
        let mut task = Task::new(request.task_id, request.location);
        task.route_id = Some(request.current_route_id);

        let outcome = self
            .coordinator
            .reassign(&task, request.current_route_id, request.target_route_id, request.depot_id)
            .await?;

        let mut response = AssignmentResponse::from_result(task.id, outcome.result);
        response.previous_route_released = Some(outcome.previous_route_released);
        Ok(response)
    }
}

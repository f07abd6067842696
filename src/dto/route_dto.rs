use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::geo::{CoordinateOrder, GeoPoint};
use crate::models::route::{Route, RouteCapacity};
use crate::utils::geometry::centroid;

// Request para crear una ruta. La geocerca llega como pares crudos en el orden indicado.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    pub depot_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 20))]
    pub color: Option<String>,
    #[validate(length(min = 3, max = 10000))]
    pub geofence: Vec<[f64; 2]>,
    #[serde(default)]
    pub coordinate_order: CoordinateOrder,
    #[validate]
    pub capacity: RouteCapacity,
    pub service_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapacityRequest {
    #[validate]
    pub capacity: RouteCapacity,
}

// Response de ruta
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub id: Uuid,
    pub depot_id: Uuid,
    pub name: Option<String>,
    pub color: Option<String>,
    pub geofence: Vec<GeoPoint>,
    pub label_position: GeoPoint,
    pub capacity: RouteCapacity,
    pub is_active: bool,
    pub service_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        let label_position = centroid(&route.geofence);
        Self {
            id: route.id,
            depot_id: route.depot_id,
            name: route.name,
            color: route.color,
            geofence: route.geofence.into_ring(),
            label_position,
            capacity: route.capacity,
            is_active: route.is_active,
            service_date: route.service_date,
            created_at: route.created_at,
        }
    }
}

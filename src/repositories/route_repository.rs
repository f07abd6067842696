use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::depot::Depot;
use crate::models::geo::GeoPoint;
use crate::models::route::{NewRoute, Route, RouteCapacity};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::geometry::normalize_closed_polygon;

/// Almacenamiento de rutas, depósitos y conteo de tareas asignadas.
///
/// El motor lo consume; la persistencia real vive fuera.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn create_route(&self, new_route: NewRoute) -> AppResult<Route>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>>;

    /// Rutas activas, opcionalmente de un solo depósito, en orden de creación
    async fn find_active(&self, depot_id: Option<Uuid>) -> AppResult<Vec<Route>>;

    /// Rutas de un depósito (activas o no), filtradas por fecha de servicio si se indica
    async fn find_by_depot(&self, depot_id: Uuid, service_date: Option<NaiveDate>) -> AppResult<Vec<Route>>;

    async fn list_all(&self) -> AppResult<Vec<Route>>;

    async fn update_capacity(&self, id: Uuid, capacity: RouteCapacity) -> AppResult<Route>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Route>;

    /// Borrar una ruta sin tareas asignadas
    async fn delete_route(&self, id: Uuid) -> AppResult<()>;

    /// Número de tareas asignadas por ruta, según las tareas persistidas
    async fn assigned_task_counts(&self) -> AppResult<HashMap<Uuid, u32>>;

    async fn find_depot(&self, id: Uuid) -> AppResult<Option<Depot>>;
}

#[derive(Debug, sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    depot_id: Uuid,
    name: Option<String>,
    color: Option<String>,
    geofence: Json<Vec<GeoPoint>>,
    max_orders: i32,
    max_distance_km: f64,
    max_duration_minutes: f64,
    current_load: i32,
    is_active: bool,
    service_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RouteRow> for Route {
    type Error = AppError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        let geofence = normalize_closed_polygon(&row.geofence.0)?;
        let max_orders = u32::try_from(row.max_orders)
            .map_err(|_| AppError::Internal(format!("Route {} has negative max_orders", row.id)))?;

        Ok(Route {
            id: row.id,
            depot_id: row.depot_id,
            name: row.name,
            color: row.color,
            geofence,
            capacity: RouteCapacity {
                max_orders,
                max_distance_km: row.max_distance_km,
                max_duration_minutes: row.max_duration_minutes,
            },
            current_load: row.current_load.max(0) as u32,
            is_active: row.is_active,
            service_date: row.service_date,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DepotRow {
    id: Uuid,
    name: String,
    boundary: Option<Json<Vec<GeoPoint>>>,
}

const ROUTE_COLUMNS: &str = "id, depot_id, name, color, geofence, max_orders, max_distance_km, \
     max_duration_minutes, current_load, is_active, service_date, created_at";

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn into_routes(rows: Vec<RouteRow>) -> AppResult<Vec<Route>> {
        rows.into_iter().map(Route::try_from).collect()
    }
}

#[async_trait]
impl RouteRepository for PgRouteRepository {
    async fn create_route(&self, new_route: NewRoute) -> AppResult<Route> {
        let route = Route::from_new(new_route);
        let max_orders = i32::try_from(route.capacity.max_orders)
            .map_err(|_| AppError::BadRequest("maxOrders is too large".to_string()))?;

        let row = sqlx::query_as::<_, RouteRow>(&format!(
            r#"
            INSERT INTO routes (id, depot_id, name, color, geofence, max_orders, max_distance_km,
                                max_duration_minutes, current_load, is_active, service_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, TRUE, $9, $10)
            RETURNING {}
            "#,
            ROUTE_COLUMNS
        ))
        .bind(route.id)
        .bind(route.depot_id)
        .bind(&route.name)
        .bind(&route.color)
        .bind(Json(route.geofence.ring()))
        .bind(max_orders)
        .bind(route.capacity.max_distance_km)
        .bind(route.capacity.max_duration_minutes)
        .bind(route.service_date)
        .bind(route.created_at)
        .fetch_one(&self.pool)
        .await?;

        Route::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!("SELECT {} FROM routes WHERE id = $1", ROUTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Route::try_from).transpose()
    }

    async fn find_active(&self, depot_id: Option<Uuid>) -> AppResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE is_active AND ($1::uuid IS NULL OR depot_id = $1) ORDER BY created_at, id",
            ROUTE_COLUMNS
        ))
        .bind(depot_id)
        .fetch_all(&self.pool)
        .await?;

        Self::into_routes(rows)
    }

    async fn find_by_depot(&self, depot_id: Uuid, service_date: Option<NaiveDate>) -> AppResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE depot_id = $1 AND ($2::date IS NULL OR service_date = $2) ORDER BY created_at, id",
            ROUTE_COLUMNS
        ))
        .bind(depot_id)
        .bind(service_date)
        .fetch_all(&self.pool)
        .await?;

        Self::into_routes(rows)
    }

    async fn list_all(&self) -> AppResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!("SELECT {} FROM routes ORDER BY created_at, id", ROUTE_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Self::into_routes(rows)
    }

    async fn update_capacity(&self, id: Uuid, capacity: RouteCapacity) -> AppResult<Route> {
        let max_orders = i32::try_from(capacity.max_orders)
            .map_err(|_| AppError::BadRequest("maxOrders is too large".to_string()))?;

        let row = sqlx::query_as::<_, RouteRow>(&format!(
            r#"
            UPDATE routes
            SET max_orders = $2, max_distance_km = $3, max_duration_minutes = $4
            WHERE id = $1
            RETURNING {}
            "#,
            ROUTE_COLUMNS
        ))
        .bind(id)
        .bind(max_orders)
        .bind(capacity.max_distance_km)
        .bind(capacity.max_duration_minutes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::RouteNotFound(id))?;

        Route::try_from(row)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Route> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "UPDATE routes SET is_active = $2 WHERE id = $1 RETURNING {}",
            ROUTE_COLUMNS
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::RouteNotFound(id))?;

        Route::try_from(row)
    }

    async fn delete_route(&self, id: Uuid) -> AppResult<()> {
        let assigned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE route_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if assigned > 0 {
            return Err(AppError::Conflict(format!(
                "Route '{}' still has {} assigned tasks",
                id, assigned
            )));
        }

        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::RouteNotFound(id));
        }
        Ok(())
    }

    async fn assigned_task_counts(&self) -> AppResult<HashMap<Uuid, u32>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT route_id, COUNT(*)::BIGINT FROM tasks WHERE route_id IS NOT NULL GROUP BY route_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(route_id, count)| (route_id, u32::try_from(count).unwrap_or(u32::MAX)))
            .collect())
    }

    async fn find_depot(&self, id: Uuid) -> AppResult<Option<Depot>> {
        let row = sqlx::query_as::<_, DepotRow>("SELECT id, name, boundary FROM depots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let boundary = match row.boundary {
                    Some(points) => Some(normalize_closed_polygon(&points.0)?),
                    None => None,
                };
                Ok(Some(Depot { id: row.id, name: row.name, boundary }))
            }
            None => Ok(None),
        }
    }
}

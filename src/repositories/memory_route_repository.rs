//! Repositorio en memoria
//!
//! Se usa en desarrollo cuando no hay `DATABASE_URL` y en los tests.
//! Conserva el orden de inserción de las rutas.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::depot::Depot;
use crate::models::route::{NewRoute, Route, RouteCapacity};
use crate::models::task::Task;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{AppError, AppResult};

#[derive(Clone, Default)]
pub struct InMemoryRouteRepository {
    routes: Arc<RwLock<Vec<Route>>>,
    depots: Arc<RwLock<HashMap<Uuid, Depot>>>,
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl InMemoryRouteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_route(&self, route: Route) {
        let mut routes = self.routes.write().await;
        routes.retain(|r| r.id != route.id);
        routes.push(route);
    }

    pub async fn insert_depot(&self, depot: Depot) {
        self.depots.write().await.insert(depot.id, depot);
    }

    pub async fn upsert_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    async fn update_route<F>(&self, id: Uuid, apply: F) -> AppResult<Route>
    where
        F: FnOnce(&mut Route) + Send,
    {
        let mut routes = self.routes.write().await;
        let route = routes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AppError::RouteNotFound(id))?;
        apply(route);
        Ok(route.clone())
    }
}

#[async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn create_route(&self, new_route: NewRoute) -> AppResult<Route> {
        let route = Route::from_new(new_route);
        self.routes.write().await.push(route.clone());
        Ok(route)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>> {
        Ok(self.routes.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find_active(&self, depot_id: Option<Uuid>) -> AppResult<Vec<Route>> {
        Ok(self
            .routes
            .read()
            .await
            .iter()
            .filter(|r| r.is_active)
            .filter(|r| depot_id.map_or(true, |d| r.depot_id == d))
            .cloned()
            .collect())
    }

    async fn find_by_depot(&self, depot_id: Uuid, service_date: Option<NaiveDate>) -> AppResult<Vec<Route>> {
        Ok(self
            .routes
            .read()
            .await
            .iter()
            .filter(|r| r.depot_id == depot_id)
            .filter(|r| service_date.map_or(true, |date| r.service_date == Some(date)))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<Route>> {
        Ok(self.routes.read().await.clone())
    }

    async fn update_capacity(&self, id: Uuid, capacity: RouteCapacity) -> AppResult<Route> {
        self.update_route(id, |route| route.capacity = capacity).await
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Route> {
        self.update_route(id, |route| route.is_active = is_active).await
    }

    async fn delete_route(&self, id: Uuid) -> AppResult<()> {
        let assigned = self.tasks.read().await.values().filter(|t| t.route_id == Some(id)).count();
        if assigned > 0 {
            return Err(AppError::Conflict(format!(
                "Route '{}' still has {} assigned tasks",
                id, assigned
            )));
        }

        let mut routes = self.routes.write().await;
        let before = routes.len();
        routes.retain(|r| r.id != id);
        if routes.len() == before {
            return Err(AppError::RouteNotFound(id));
        }
        Ok(())
    }

    async fn assigned_task_counts(&self) -> AppResult<HashMap<Uuid, u32>> {
        let mut counts = HashMap::new();
        for route_id in self.tasks.read().await.values().filter_map(|t| t.route_id) {
            *counts.entry(route_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn find_depot(&self, id: Uuid) -> AppResult<Option<Depot>> {
        Ok(self.depots.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geo::GeoPoint;
    use crate::utils::geometry::normalize_closed_polygon;

    fn new_route(depot_id: Uuid, service_date: Option<NaiveDate>) -> NewRoute {
        NewRoute {
            depot_id,
            name: Some("Nord".to_string()),
            color: None,
            geofence: normalize_closed_polygon(&[
                GeoPoint { lat: 0.0, lng: 0.0 },
                GeoPoint { lat: 0.0, lng: 1.0 },
                GeoPoint { lat: 1.0, lng: 1.0 },
            ])
            .unwrap(),
            capacity: RouteCapacity { max_orders: 5, max_distance_km: 10.0, max_duration_minutes: 60.0 },
            service_date,
        }
    }

    #[tokio::test]
    async fn test_depot_and_date_filters() {
        let repo = InMemoryRouteRepository::new();
        let depot = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        let a = repo.create_route(new_route(depot, Some(day))).await.unwrap();
        let b = repo.create_route(new_route(depot, None)).await.unwrap();
        repo.create_route(new_route(Uuid::new_v4(), Some(day))).await.unwrap();
        repo.set_active(b.id, false).await.unwrap();

        assert_eq!(repo.find_by_depot(depot, None).await.unwrap().len(), 2);
        let dated = repo.find_by_depot(depot, Some(day)).await.unwrap();
        assert_eq!(dated.len(), 1);
        assert_eq!(dated[0].id, a.id);

        let active = repo.find_active(Some(depot)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(repo.find_active(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_assigned_task_counts() {
        let repo = InMemoryRouteRepository::new();
        let route = repo.create_route(new_route(Uuid::new_v4(), None)).await.unwrap();

        for _ in 0..3 {
            let mut task = Task::new(Uuid::new_v4(), GeoPoint { lat: 0.5, lng: 0.5 });
            task.route_id = Some(route.id);
            repo.upsert_task(task).await;
        }
        repo.upsert_task(Task::new(Uuid::new_v4(), GeoPoint { lat: 0.5, lng: 0.5 })).await;

        let counts = repo.assigned_task_counts().await.unwrap();
        assert_eq!(counts.get(&route.id), Some(&3));
        assert_eq!(counts.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_route_requires_no_assigned_tasks() {
        let repo = InMemoryRouteRepository::new();
        let route = repo.create_route(new_route(Uuid::new_v4(), None)).await.unwrap();
        let mut task = Task::new(Uuid::new_v4(), GeoPoint { lat: 0.5, lng: 0.5 });
        task.route_id = Some(route.id);
        repo.upsert_task(task.clone()).await;

        assert!(matches!(repo.delete_route(route.id).await, Err(AppError::Conflict(_))));

        task.route_id = None;
        repo.upsert_task(task).await;
        repo.delete_route(route.id).await.unwrap();
        assert!(repo.find_by_id(route.id).await.unwrap().is_none());
        assert!(matches!(repo.delete_route(route.id).await, Err(AppError::RouteNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_route() {
        let repo = InMemoryRouteRepository::new();
        let id = Uuid::new_v4();
        assert!(matches!(repo.set_active(id, false).await, Err(AppError::RouteNotFound(found)) if found == id));
    }
}

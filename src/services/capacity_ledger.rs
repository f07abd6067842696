//! Ledger de capacidad por ruta
//!
//! Único lugar donde se muta la carga de una ruta. Cada ruta tiene su propio
//! mutex: dos `reserve` sobre la misma ruta se serializan, y rutas distintas no
//! se bloquean entre sí. El mapa de rutas solo se toma en escritura para
//! registrar o eliminar rutas.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::capacity::{CapacitySnapshot, CapacityThresholds};
use crate::models::route::Route;

/// Errores del ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("route '{0}' is not registered in the capacity ledger")]
    RouteNotFound(Uuid),

    #[error("route '{0}' is inactive")]
    RouteInactive(Uuid),

    #[error("route '{route_id}' has capacity for {available} more, requested {requested}")]
    CapacityExceeded {
        route_id: Uuid,
        available: u32,
        requested: u32,
    },

    #[error("reservation amount must be at least 1")]
    InvalidAmount,

    #[error("route '{route_id}' carries {current_load} tasks, cannot lower max to {requested_max}")]
    BelowCurrentLoad {
        route_id: Uuid,
        current_load: u32,
        requested_max: u32,
    },
}

#[derive(Debug)]
struct RouteCounter {
    current_load: u32,
    max_orders: u32,
    is_active: bool,
}

#[derive(Clone)]
pub struct CapacityLedger {
    routes: Arc<RwLock<HashMap<Uuid, Arc<Mutex<RouteCounter>>>>>,
    thresholds: CapacityThresholds,
}

impl CapacityLedger {
    pub fn new(thresholds: CapacityThresholds) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            thresholds,
        }
    }

    async fn counter(&self, route_id: Uuid) -> Result<Arc<Mutex<RouteCounter>>, CapacityError> {
        let routes = self.routes.read().await;
        routes
            .get(&route_id)
            .cloned()
            .ok_or(CapacityError::RouteNotFound(route_id))
    }

    /// Registrar (o reemplazar) una ruta con una carga inicial
    pub async fn register(&self, route: &Route, current_load: u32) {
        let counter = RouteCounter {
            current_load,
            max_orders: route.capacity.max_orders,
            is_active: route.is_active,
        };
        let mut routes = self.routes.write().await;
        routes.insert(route.id, Arc::new(Mutex::new(counter)));
        log::debug!("📒 Ruta {} registrada en el ledger (carga {}/{})", route.id, current_load, route.capacity.max_orders);
    }

    /// Reconstruir todos los contadores desde los conteos persistidos.
    ///
    /// Se ignora el campo `current_load` guardado en cada ruta; solo cuenta el
    /// número de tareas asignadas. Sustituye el mapa completo, así que solo debe
    /// llamarse antes de atender peticiones (arranque o recuperación). Con el
    /// servicio en marcha se usa `reconcile`.
    pub async fn seed(&self, routes: &[Route], assigned_counts: &HashMap<Uuid, u32>) {
        let mut rebuilt = HashMap::with_capacity(routes.len());

        for route in routes {
            let load = assigned_counts.get(&route.id).copied().unwrap_or(0);

            if load != route.current_load {
                log::warn!(
                    "⚠️ Contador persistido desactualizado para ruta {}: guardado {}, tareas asignadas {}",
                    route.id, route.current_load, load
                );
            }
            if load > route.capacity.max_orders {
                log::error!(
                    "❌ Ruta {} tiene {} tareas asignadas con un máximo de {}; no aceptará reservas hasta liberar",
                    route.id, load, route.capacity.max_orders
                );
            }

            rebuilt.insert(
                route.id,
                Arc::new(Mutex::new(RouteCounter {
                    current_load: load,
                    max_orders: route.capacity.max_orders,
                    is_active: route.is_active,
                })),
            );
        }

        let mut current = self.routes.write().await;
        *current = rebuilt;
        log::info!("📒 Ledger inicializado con {} rutas", current.len());
    }

    /// Alinear el ledger con el repositorio mientras se atienden peticiones.
    ///
    /// Cada contador se actualiza en su sitio, bajo el mutex de su ruta, y nunca
    /// se sustituye. La carga solo sube: las reservas hechas y aún no persistidas
    /// por el llamador siguen contando. Las rutas que el ledger no conocía se
    /// registran; las que faltan en el repositorio se dejan como están (se
    /// quitan con `remove`). Devuelve el número de rutas revisadas.
    pub async fn reconcile(&self, routes: &[Route], assigned_counts: &HashMap<Uuid, u32>) -> usize {
        for route in routes {
            let persisted = assigned_counts.get(&route.id).copied().unwrap_or(0);

            let counter = {
                let mut map = self.routes.write().await;
                map.entry(route.id)
                    .or_insert_with(|| {
                        log::info!("📒 Ruta {} incorporada al ledger durante la reconciliación", route.id);
                        Arc::new(Mutex::new(RouteCounter {
                            current_load: 0,
                            max_orders: route.capacity.max_orders,
                            is_active: route.is_active,
                        }))
                    })
                    .clone()
            };

            let mut counter = counter.lock().await;
            if persisted > counter.current_load {
                log::warn!(
                    "⚠️ Ruta {}: {} tareas persistidas frente a carga {} en el ledger; se adopta la persistida",
                    route.id, persisted, counter.current_load
                );
                counter.current_load = persisted;
            }
            counter.max_orders = route.capacity.max_orders;
            counter.is_active = route.is_active;

            if counter.current_load > counter.max_orders {
                log::error!(
                    "❌ Ruta {} tiene carga {} con un máximo de {}; no aceptará reservas hasta liberar",
                    route.id, counter.current_load, counter.max_orders
                );
            }
        }

        log::info!("📒 Ledger reconciliado con {} rutas", routes.len());
        routes.len()
    }

    /// Reservar `n` unidades de capacidad en un único paso atómico.
    ///
    /// Devuelve la nueva carga.
    pub async fn reserve(&self, route_id: Uuid, n: u32) -> Result<u32, CapacityError> {
        if n == 0 {
            return Err(CapacityError::InvalidAmount);
        }

        let counter = self.counter(route_id).await?;
        let mut counter = counter.lock().await;

        if !counter.is_active {
            return Err(CapacityError::RouteInactive(route_id));
        }

        let available = counter.max_orders.saturating_sub(counter.current_load);
        if n > available {
            return Err(CapacityError::CapacityExceeded {
                route_id,
                available,
                requested: n,
            });
        }

        counter.current_load += n;
        Ok(counter.current_load)
    }

    /// Liberar `n` unidades; la carga nunca baja de 0.
    ///
    /// Una liberación de más (p. ej. compensación duplicada) se registra como
    /// advertencia y no falla.
    pub async fn release(&self, route_id: Uuid, n: u32) -> Result<u32, CapacityError> {
        let counter = self.counter(route_id).await?;
        let mut counter = counter.lock().await;

        if n > counter.current_load {
            log::warn!(
                "⚠️ Liberación de {} en ruta {} con carga {}; se deja en 0",
                n, route_id, counter.current_load
            );
        }

        counter.current_load = counter.current_load.saturating_sub(n);
        Ok(counter.current_load)
    }

    pub async fn snapshot(&self, route_id: Uuid) -> Result<CapacitySnapshot, CapacityError> {
        let counter = self.counter(route_id).await?;
        let counter = counter.lock().await;

        Ok(CapacitySnapshot::compute(
            route_id,
            counter.current_load,
            counter.max_orders,
            counter.is_active,
            &self.thresholds,
        ))
    }

    /// Snapshots de varias rutas; las no registradas se omiten
    pub async fn snapshots(&self, route_ids: &[Uuid]) -> Vec<CapacitySnapshot> {
        let reads = route_ids.iter().map(|route_id| self.snapshot(*route_id));

        futures::future::join_all(reads)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    log::warn!("⚠️ Snapshot omitido: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Activar o desactivar una ruta. La carga existente no se toca.
    pub async fn set_active(&self, route_id: Uuid, is_active: bool) -> Result<(), CapacityError> {
        let counter = self.counter(route_id).await?;
        counter.lock().await.is_active = is_active;
        Ok(())
    }

    pub async fn set_max_orders(&self, route_id: Uuid, max_orders: u32) -> Result<(), CapacityError> {
        if max_orders == 0 {
            return Err(CapacityError::InvalidAmount);
        }

        let counter = self.counter(route_id).await?;
        let mut counter = counter.lock().await;

        if max_orders < counter.current_load {
            return Err(CapacityError::BelowCurrentLoad {
                route_id,
                current_load: counter.current_load,
                requested_max: max_orders,
            });
        }

        counter.max_orders = max_orders;
        Ok(())
    }

    /// Quitar una ruta del ledger. Las reservas posteriores fallan con `RouteNotFound`.
    pub async fn remove(&self, route_id: Uuid) -> bool {
        let removed = self.routes.write().await.remove(&route_id).is_some();
        if removed {
            log::info!("🗑️ Ruta {} retirada del ledger", route_id);
        }
        removed
    }

    pub async fn route_count(&self) -> usize {
        self.routes.read().await.len()
    }
}

impl Default for CapacityLedger {
    fn default() -> Self {
        Self::new(CapacityThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geo::GeoPoint;
    use crate::models::route::{NewRoute, RouteCapacity};
    use crate::utils::geometry::normalize_closed_polygon;

    fn route_with_max(max_orders: u32) -> Route {
        let geofence = normalize_closed_polygon(&[
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 0.0, lng: 1.0 },
            GeoPoint { lat: 1.0, lng: 1.0 },
        ])
        .unwrap();

        Route::from_new(NewRoute {
            depot_id: Uuid::new_v4(),
            name: None,
            color: None,
            geofence,
            capacity: RouteCapacity {
                max_orders,
                max_distance_km: 100.0,
                max_duration_minutes: 480.0,
            },
            service_date: None,
        })
    }

    #[tokio::test]
    async fn test_reserve_until_full() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(3);
        ledger.register(&route, 0).await;

        assert_eq!(ledger.reserve(route.id, 2).await, Ok(2));
        assert_eq!(ledger.reserve(route.id, 1).await, Ok(3));
        assert_eq!(
            ledger.reserve(route.id, 1).await,
            Err(CapacityError::CapacityExceeded { route_id: route.id, available: 0, requested: 1 })
        );
        assert_eq!(ledger.snapshot(route.id).await.unwrap().current_load, 3);
    }

    #[tokio::test]
    async fn test_reserve_rejects_multi_unit_overflow() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(5);
        ledger.register(&route, 4).await;

        let err = ledger.reserve(route.id, 2).await.unwrap_err();
        assert!(matches!(err, CapacityError::CapacityExceeded { available: 1, .. }));
        assert_eq!(ledger.reserve(route.id, 0).await, Err(CapacityError::InvalidAmount));
        assert_eq!(ledger.snapshot(route.id).await.unwrap().current_load, 4);
    }

    #[tokio::test]
    async fn test_inactive_route_rejects_reserve_but_keeps_load() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(10);
        ledger.register(&route, 4).await;

        ledger.set_active(route.id, false).await.unwrap();
        assert_eq!(ledger.reserve(route.id, 1).await, Err(CapacityError::RouteInactive(route.id)));

        let snapshot = ledger.snapshot(route.id).await.unwrap();
        assert_eq!(snapshot.current_load, 4);
        assert!(!snapshot.is_active);

        // Liberar sigue permitido sobre rutas inactivas
        assert_eq!(ledger.release(route.id, 1).await, Ok(3));
    }

    #[tokio::test]
    async fn test_release_never_goes_below_zero() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(10);
        ledger.register(&route, 0).await;

        ledger.reserve(route.id, 1).await.unwrap();
        assert_eq!(ledger.release(route.id, 1).await, Ok(0));
        assert_eq!(ledger.release(route.id, 1).await, Ok(0));
        assert_eq!(ledger.release(route.id, 5).await, Ok(0));
        assert_eq!(ledger.snapshot(route.id).await.unwrap().current_load, 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let ledger = CapacityLedger::default();
        let id = Uuid::new_v4();
        assert_eq!(ledger.reserve(id, 1).await, Err(CapacityError::RouteNotFound(id)));
        assert_eq!(ledger.release(id, 1).await, Err(CapacityError::RouteNotFound(id)));
        assert!(ledger.snapshot(id).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reserves_respect_limit() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(10);
        ledger.register(&route, 9).await;

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let ledger = ledger.clone();
                let route_id = route.id;
                tokio::spawn(async move { ledger.reserve(route_id, 1).await })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let successes = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        let exceeded = results
            .iter()
            .filter(|r| matches!(r, Ok(Err(CapacityError::CapacityExceeded { .. }))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(exceeded, 4);
        assert_eq!(ledger.snapshot(route.id).await.unwrap().current_load, 10);
    }

    #[tokio::test]
    async fn test_seed_recomputes_from_assigned_counts() {
        let ledger = CapacityLedger::default();
        let mut stale = route_with_max(10);
        stale.current_load = 7;
        let empty = route_with_max(5);

        let counts = HashMap::from([(stale.id, 3)]);
        ledger.seed(&[stale.clone(), empty.clone()], &counts).await;

        assert_eq!(ledger.snapshot(stale.id).await.unwrap().current_load, 3);
        assert_eq!(ledger.snapshot(empty.id).await.unwrap().current_load, 0);
        assert_eq!(ledger.route_count().await, 2);
    }

    #[tokio::test]
    async fn test_reconcile_keeps_unpersisted_reservations() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(1);
        ledger.register(&route, 0).await;
        ledger.reserve(route.id, 1).await.unwrap();

        // Aún no hay tareas persistidas para la reserva anterior
        ledger.reconcile(&[route.clone()], &HashMap::new()).await;

        assert_eq!(ledger.snapshot(route.id).await.unwrap().current_load, 1);
        assert!(matches!(
            ledger.reserve(route.id, 1).await,
            Err(CapacityError::CapacityExceeded { available: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_reconcile_adopts_higher_counts_and_registers_new_routes() {
        let ledger = CapacityLedger::default();
        let known = route_with_max(10);
        let mut deactivated = known.clone();
        deactivated.is_active = false;
        let fresh = route_with_max(4);
        ledger.register(&known, 2).await;

        let counts = HashMap::from([(known.id, 5), (fresh.id, 1)]);
        let reviewed = ledger.reconcile(&[deactivated, fresh.clone()], &counts).await;

        assert_eq!(reviewed, 2);
        let snapshot = ledger.snapshot(known.id).await.unwrap();
        assert_eq!(snapshot.current_load, 5);
        assert!(!snapshot.is_active);
        assert_eq!(ledger.snapshot(fresh.id).await.unwrap().current_load, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reconcile_during_reserves_never_overbooks() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(20);
        ledger.register(&route, 0).await;

        let reserves: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                let route_id = route.id;
                tokio::spawn(async move { ledger.reserve(route_id, 1).await })
            })
            .collect();
        let reconciles: Vec<_> = (0..5)
            .map(|_| {
                let ledger = ledger.clone();
                let route = route.clone();
                tokio::spawn(async move { ledger.reconcile(&[route], &HashMap::new()).await })
            })
            .collect();

        let granted = futures::future::join_all(reserves)
            .await
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        futures::future::join_all(reconciles).await;

        assert_eq!(granted, 20);
        assert_eq!(ledger.snapshot(route.id).await.unwrap().current_load, 20);
    }

    #[tokio::test]
    async fn test_remove_route() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(3);
        ledger.register(&route, 0).await;

        assert!(ledger.remove(route.id).await);
        assert!(!ledger.remove(route.id).await);
        assert_eq!(ledger.reserve(route.id, 1).await, Err(CapacityError::RouteNotFound(route.id)));
        assert_eq!(ledger.route_count().await, 0);
    }

    #[tokio::test]
    async fn test_set_max_orders_below_load_rejected() {
        let ledger = CapacityLedger::default();
        let route = route_with_max(10);
        ledger.register(&route, 6).await;

        assert!(matches!(
            ledger.set_max_orders(route.id, 5).await,
            Err(CapacityError::BelowCurrentLoad { current_load: 6, requested_max: 5, .. })
        ));
        ledger.set_max_orders(route.id, 6).await.unwrap();
        assert!(ledger.reserve(route.id, 1).await.is_err());
    }
}

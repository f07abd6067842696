//! Resolución de territorio
//!
//! Dado un punto y un conjunto de rutas candidatas (ya acotado por depósito),
//! devuelve las rutas activas cuya geocerca contiene el punto, en el orden en
//! que se recibieron. Las geocercas pueden solaparse: se devuelven todas y el
//! coordinador elige por capacidad.

use uuid::Uuid;

use crate::models::geo::GeoPoint;
use crate::models::route::Route;
use crate::utils::geometry::contains_point;

/// Rutas activas que contienen `point`, en el orden de `candidates`.
///
/// Una lista vacía no es un error: el llamador pide selección manual.
pub fn resolve(point: &GeoPoint, candidates: &[Route]) -> Vec<Uuid> {
    let matches: Vec<Uuid> = candidates
        .iter()
        .filter(|route| route.is_active)
        .filter(|route| contains_point(&route.geofence, point))
        .map(|route| route.id)
        .collect();

    if matches.len() > 1 {
        log::debug!("🗺️ Punto ({}, {}) dentro de {} geocercas solapadas", point.lat, point.lng, matches.len());
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::route::{NewRoute, RouteCapacity};
    use crate::utils::geometry::normalize_closed_polygon;

    fn square_route(min_lat: f64, min_lng: f64, size: f64) -> Route {
        let geofence = normalize_closed_polygon(&[
            GeoPoint { lat: min_lat, lng: min_lng },
            GeoPoint { lat: min_lat, lng: min_lng + size },
            GeoPoint { lat: min_lat + size, lng: min_lng + size },
            GeoPoint { lat: min_lat + size, lng: min_lng },
        ])
        .unwrap();

        Route::from_new(NewRoute {
            depot_id: Uuid::nil(),
            name: None,
            color: None,
            geofence,
            capacity: RouteCapacity { max_orders: 10, max_distance_km: 50.0, max_duration_minutes: 240.0 },
            service_date: None,
        })
    }

    #[test]
    fn test_point_outside_every_route() {
        let routes = vec![square_route(0.0, 0.0, 1.0), square_route(5.0, 5.0, 1.0)];
        assert!(resolve(&GeoPoint { lat: 3.0, lng: 3.0 }, &routes).is_empty());
        assert!(resolve(&GeoPoint { lat: 3.0, lng: 3.0 }, &[]).is_empty());
    }

    #[test]
    fn test_overlapping_routes_keep_supplied_order() {
        let a = square_route(0.0, 0.0, 2.0);
        let b = square_route(1.0, 1.0, 2.0);
        let point = GeoPoint { lat: 1.5, lng: 1.5 };

        assert_eq!(resolve(&point, &[a.clone(), b.clone()]), vec![a.id, b.id]);
        assert_eq!(resolve(&point, &[b.clone(), a.clone()]), vec![b.id, a.id]);
    }

    #[test]
    fn test_inactive_routes_are_skipped() {
        let mut a = square_route(0.0, 0.0, 2.0);
        let b = square_route(0.0, 0.0, 2.0);
        a.is_active = false;

        assert_eq!(resolve(&GeoPoint { lat: 1.0, lng: 1.0 }, &[a, b.clone()]), vec![b.id]);
    }

    #[test]
    fn test_shared_border_belongs_to_both() {
        let west = square_route(0.0, 0.0, 1.0);
        let east = square_route(0.0, 1.0, 1.0);
        let on_border = GeoPoint { lat: 0.5, lng: 1.0 };

        assert_eq!(resolve(&on_border, &[west.clone(), east.clone()]), vec![west.id, east.id]);
    }
}

//! Auditoría de cobertura
//!
//! Aproxima las zonas del límite de un depósito que no cubre ninguna geocerca
//! activa. Se muestrea una rejilla sobre la caja envolvente del límite: una
//! celda cuenta si su centro está dentro del límite, y está cubierta si su centro
//! está dentro de alguna geocerca activa. Las celdas descubiertas contiguas de
//! una misma fila se devuelven como un rectángulo.

use serde::{Deserialize, Serialize};

use crate::models::geo::{GeoPoint, Polygon};
use crate::models::route::Route;
use crate::utils::geometry::{bounding_box, contains_point, normalize_closed_polygon, BoundingBox, GeometryError};

/// Resolución de la rejilla de muestreo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    pub cell_size_deg: f64,
    pub max_cells: u64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            cell_size_deg: 0.005, // ~500 m en latitudes medias
            max_cells: 250_000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub gaps: Vec<Polygon>,
    pub sampled_cells: u64,
    pub uncovered_cells: u64,
    pub coverage_percentage: f64,
    pub cell_size_deg: f64,
}

pub fn find_gaps(depot_boundary: &Polygon, routes: &[Route], grid: &GridSpec) -> Result<CoverageReport, GeometryError> {
    let cell = grid.cell_size_deg;
    if !(cell.is_finite() && cell > 0.0) {
        return Err(GeometryError::InvalidCellSize(cell));
    }

    let bbox = bounding_box(depot_boundary);
    let rows = (((bbox.max_lat - bbox.min_lat) / cell).ceil() as u64).max(1);
    let cols = (((bbox.max_lng - bbox.min_lng) / cell).ceil() as u64).max(1);
    let cells = rows.saturating_mul(cols);
    if cells > grid.max_cells {
        return Err(GeometryError::GridTooLarge { cells, max: grid.max_cells });
    }

    // Solo geocercas activas cuya caja toca la del depósito
    let active: Vec<(&Polygon, BoundingBox)> = routes
        .iter()
        .filter(|r| r.is_active)
        .map(|r| (&r.geofence, bounding_box(&r.geofence)))
        .filter(|(_, b)| overlaps(b, &bbox))
        .collect();

    let is_covered = |point: &GeoPoint| {
        active
            .iter()
            .any(|(polygon, b)| inside_box(point, b) && contains_point(polygon, point))
    };

    let mut gaps = Vec::new();
    let mut sampled_cells = 0u64;
    let mut uncovered_cells = 0u64;

    for row in 0..rows {
        let lat0 = bbox.min_lat + row as f64 * cell;
        let lat1 = (lat0 + cell).min(bbox.max_lat);
        let mut run_start: Option<u64> = None;

        for col in 0..=cols {
            let uncovered = col < cols && {
                let center = GeoPoint {
                    lat: lat0 + cell / 2.0,
                    lng: bbox.min_lng + (col as f64 + 0.5) * cell,
                };
                let in_scope = contains_point(depot_boundary, &center);
                if in_scope {
                    sampled_cells += 1;
                }
                in_scope && !is_covered(&center)
            };

            match (uncovered, run_start) {
                (true, None) => run_start = Some(col),
                (false, Some(start)) => {
                    uncovered_cells += col - start;
                    let lng0 = bbox.min_lng + start as f64 * cell;
                    let lng1 = (bbox.min_lng + col as f64 * cell).min(bbox.max_lng);
                    gaps.push(rectangle(lat0, lat1, lng0, lng1)?);
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    let coverage_percentage = if sampled_cells == 0 {
        100.0
    } else {
        let covered = (sampled_cells - uncovered_cells) as f64;
        (covered / sampled_cells as f64 * 10_000.0).round() / 100.0
    };

    log::info!(
        "🧭 Cobertura: {} celdas muestreadas, {} sin cubrir ({}%), {} huecos",
        sampled_cells, uncovered_cells, coverage_percentage, gaps.len()
    );

    Ok(CoverageReport {
        gaps,
        sampled_cells,
        uncovered_cells,
        coverage_percentage,
        cell_size_deg: cell,
    })
}

fn rectangle(lat0: f64, lat1: f64, lng0: f64, lng1: f64) -> Result<Polygon, GeometryError> {
    normalize_closed_polygon(&[
        GeoPoint { lat: lat0, lng: lng0 },
        GeoPoint { lat: lat0, lng: lng1 },
        GeoPoint { lat: lat1, lng: lng1 },
        GeoPoint { lat: lat1, lng: lng0 },
    ])
}

fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.min_lat <= b.max_lat && a.max_lat >= b.min_lat && a.min_lng <= b.max_lng && a.max_lng >= b.min_lng
}

fn inside_box(p: &GeoPoint, b: &BoundingBox) -> bool {
    p.lat >= b.min_lat && p.lat <= b.max_lat && p.lng >= b.min_lng && p.lng <= b.max_lng
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::route::{NewRoute, RouteCapacity};
    use uuid::Uuid;

    fn rect(lat0: f64, lat1: f64, lng0: f64, lng1: f64) -> Polygon {
        rectangle(lat0, lat1, lng0, lng1).unwrap()
    }

    fn route(geofence: Polygon) -> Route {
        Route::from_new(NewRoute {
            depot_id: Uuid::nil(),
            name: None,
            color: None,
            geofence,
            capacity: RouteCapacity { max_orders: 10, max_distance_km: 10.0, max_duration_minutes: 60.0 },
            service_date: None,
        })
    }

    fn grid() -> GridSpec {
        GridSpec { cell_size_deg: 0.25, max_cells: 1_000 }
    }

    #[test]
    fn test_full_coverage_has_no_gaps() {
        let boundary = rect(0.0, 1.0, 0.0, 1.0);
        let report = find_gaps(&boundary, &[route(boundary.clone())], &grid()).unwrap();

        assert!(report.gaps.is_empty());
        assert_eq!(report.sampled_cells, 16);
        assert_eq!(report.uncovered_cells, 0);
        assert_eq!(report.coverage_percentage, 100.0);
    }

    #[test]
    fn test_half_coverage_reports_row_runs() {
        let boundary = rect(0.0, 1.0, 0.0, 1.0);
        let west = route(rect(0.0, 1.0, 0.0, 0.5));
        let report = find_gaps(&boundary, &[west], &grid()).unwrap();

        assert_eq!(report.uncovered_cells, 8);
        assert_eq!(report.coverage_percentage, 50.0);
        assert_eq!(report.gaps.len(), 4);
        for gap in &report.gaps {
            let b = bounding_box(gap);
            assert_eq!(b.min_lng, 0.5);
            assert_eq!(b.max_lng, 1.0);
        }
    }

    #[test]
    fn test_inactive_routes_do_not_cover() {
        let boundary = rect(0.0, 1.0, 0.0, 1.0);
        let mut r = route(boundary.clone());
        r.is_active = false;
        let report = find_gaps(&boundary, &[r], &grid()).unwrap();

        assert_eq!(report.uncovered_cells, 16);
        assert_eq!(report.gaps.len(), 4);
        assert_eq!(report.coverage_percentage, 0.0);
    }

    #[test]
    fn test_grid_limits() {
        let boundary = rect(0.0, 1.0, 0.0, 1.0);
        let tiny = GridSpec { cell_size_deg: 0.001, max_cells: 1_000 };
        assert!(matches!(find_gaps(&boundary, &[], &tiny), Err(GeometryError::GridTooLarge { .. })));

        let zero = GridSpec { cell_size_deg: 0.0, max_cells: 1_000 };
        assert_eq!(find_gaps(&boundary, &[], &zero).unwrap_err(), GeometryError::InvalidCellSize(0.0));
    }
}

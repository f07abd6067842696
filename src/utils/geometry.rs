//! Núcleo geométrico
//!
//! Funciones puras sobre polígonos en orden (lat, lng): pertenencia de un punto,
//! centroide para etiquetas, cierre y validación de anillos.
//! Internamente x = longitud, y = latitud.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::geo::{GeoPoint, Polygon};

/// Tolerancia absoluta (grados) para considerar un punto sobre una arista
pub const BOUNDARY_EPSILON: f64 = 1e-12;

/// Errores de geometría inválida
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 distinct vertices, got {distinct}")]
    TooFewVertices { distinct: usize },

    #[error("consecutive vertices {index} and {next} are identical")]
    DuplicateConsecutiveVertex { index: usize, next: usize },

    #[error("polygon ring intersects itself")]
    SelfIntersecting,

    #[error("polygon has zero area")]
    ZeroArea,

    #[error("coordinate out of range (lat {lat}, lng {lng})")]
    CoordinateOutOfRange { lat: f64, lng: f64 },

    #[error("grid cell size must be positive, got {0}")]
    InvalidCellSize(f64),

    #[error("coverage grid of {cells} cells exceeds the limit of {max}")]
    GridTooLarge { cells: u64, max: u64 },
}

/// Caja envolvente de un polígono
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Cerrar y validar un anillo de vértices.
///
/// - Falla con menos de 3 vértices distintos.
/// - Falla si dos vértices consecutivos son idénticos (el duplicado de cierre no cuenta).
/// - Añade el primer vértice al final si el anillo está abierto.
///
/// Un anillo ya cerrado se devuelve sin cambios.
pub fn normalize_closed_polygon(points: &[GeoPoint]) -> Result<Polygon, GeometryError> {
    for point in points {
        point.validate()?;
    }

    let is_closed = points.len() >= 2 && points.first() == points.last();
    let open = if is_closed { &points[..points.len() - 1] } else { points };

    let distinct = count_distinct(open);
    if distinct < 3 {
        return Err(GeometryError::TooFewVertices { distinct });
    }

    for (index, pair) in open.windows(2).enumerate() {
        if pair[0] == pair[1] {
            return Err(GeometryError::DuplicateConsecutiveVertex { index, next: index + 1 });
        }
    }
    // Doble cierre: [A, B, C, A, A]
    if open.last() == open.first() {
        return Err(GeometryError::DuplicateConsecutiveVertex { index: open.len() - 1, next: 0 });
    }

    let mut ring = open.to_vec();
    ring.push(open[0]);
    Ok(Polygon::from_closed_ring(ring))
}

fn count_distinct(points: &[GeoPoint]) -> usize {
    // `+ 0.0` unifica -0.0 y 0.0 antes de comparar bits
    points
        .iter()
        .map(|p| ((p.lat + 0.0).to_bits(), (p.lng + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Test punto-en-polígono por regla par-impar (ray casting).
///
/// Los puntos sobre una arista o un vértice se consideran contenidos, así un punto
/// en la frontera entre dos territorios adyacentes pertenece a ambos de forma estable.
/// El resultado no depende del sentido de giro del anillo.
pub fn contains_point(polygon: &Polygon, point: &GeoPoint) -> bool {
    if polygon.edges().any(|(a, b)| is_on_segment(&a, &b, point)) {
        return true;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;

    for (a, b) in polygon.edges() {
        let (xi, yi) = (a.lng, a.lat);
        let (xj, yj) = (b.lng, b.lat);

        if (yi > y) != (yj > y) {
            let x_cross = xi + (y - yi) * (xj - xi) / (yj - yi);
            if x < x_cross {
                inside = !inside;
            }
        }
    }

    inside
}

fn is_on_segment(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> bool {
    let cross = (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng);
    if cross.abs() > BOUNDARY_EPSILON {
        return false;
    }

    p.lng >= a.lng.min(b.lng) - BOUNDARY_EPSILON
        && p.lng <= a.lng.max(b.lng) + BOUNDARY_EPSILON
        && p.lat >= a.lat.min(b.lat) - BOUNDARY_EPSILON
        && p.lat <= a.lat.max(b.lat) + BOUNDARY_EPSILON
}

/// Media aritmética de los vértices (sin el de cierre).
///
/// Solo sirve para colocar etiquetas: NO es el centroide ponderado por área.
pub fn centroid(polygon: &Polygon) -> GeoPoint {
    let vertices = polygon.vertices();
    let count = vertices.len() as f64;
    let (lat_sum, lng_sum) = vertices
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));

    GeoPoint {
        lat: lat_sum / count,
        lng: lng_sum / count,
    }
}

/// Área del anillo (fórmula del cordón), en grados cuadrados
pub fn ring_area(polygon: &Polygon) -> f64 {
    let twice_area: f64 = polygon
        .edges()
        .map(|(a, b)| a.lng * b.lat - b.lng * a.lat)
        .sum();
    twice_area.abs() / 2.0
}

pub fn bounding_box(polygon: &Polygon) -> BoundingBox {
    polygon.vertices().iter().fold(
        BoundingBox {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
        },
        |bbox, p| BoundingBox {
            min_lat: bbox.min_lat.min(p.lat),
            max_lat: bbox.max_lat.max(p.lat),
            min_lng: bbox.min_lng.min(p.lng),
            max_lng: bbox.max_lng.max(p.lng),
        },
    )
}

/// Rechazar anillos de área nula o que se cortan a sí mismos.
///
/// Se aplica al ingresar geocercas y límites de depósito.
pub fn validate_simple(polygon: &Polygon) -> Result<(), GeometryError> {
    let edges: Vec<(GeoPoint, GeoPoint)> = polygon.edges().collect();
    let n = edges.len();

    for i in 0..n {
        for j in (i + 1)..n {
            // Aristas adyacentes comparten un vértice por construcción
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            if segments_intersect(&edges[i].0, &edges[i].1, &edges[j].0, &edges[j].1) {
                return Err(GeometryError::SelfIntersecting);
            }
        }
    }

    if ring_area(polygon) <= BOUNDARY_EPSILON {
        return Err(GeometryError::ZeroArea);
    }

    Ok(())
}

fn orientation(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint) -> f64 {
    (b.lng - a.lng) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lng - a.lng)
}

fn segments_intersect(p1: &GeoPoint, p2: &GeoPoint, q1: &GeoPoint, q2: &GeoPoint) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    let straddles = |a: f64, b: f64| {
        (a > BOUNDARY_EPSILON && b < -BOUNDARY_EPSILON) || (a < -BOUNDARY_EPSILON && b > BOUNDARY_EPSILON)
    };
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    is_on_segment(q1, q2, p1)
        || is_on_segment(q1, q2, p2)
        || is_on_segment(p1, p2, q1)
        || is_on_segment(p1, p2, q2)
}

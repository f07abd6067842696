//! Modelo de coordenadas y polígonos
//!
//! Todo el motor trabaja en un único orden interno: (latitud, longitud).
//! Los pares crudos solo se aceptan a través de `GeoPoint::from_pair`, que
//! recibe el orden explícito en que llegan desde fuera.

use serde::{Deserialize, Serialize};

use crate::utils::geometry::{normalize_closed_polygon, GeometryError};

/// Orden de un par de coordenadas crudo en la entrada
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateOrder {
    /// `[lat, lng]`, el orden interno
    #[default]
    LatLng,
    /// `[lng, lat]`, el orden de GeoJSON y Mapbox
    LngLat,
}

/// Punto geográfico en grados decimales
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Crear un punto validando rangos de latitud y longitud
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeometryError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    /// Convertir un par crudo al orden interno
    pub fn from_pair(pair: [f64; 2], order: CoordinateOrder) -> Result<Self, GeometryError> {
        match order {
            CoordinateOrder::LatLng => Self::new(pair[0], pair[1]),
            CoordinateOrder::LngLat => Self::new(pair[1], pair[0]),
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        let in_range = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);

        if in_range {
            Ok(())
        } else {
            Err(GeometryError::CoordinateOutOfRange { lat: self.lat, lng: self.lng })
        }
    }
}

/// Anillo cerrado (primer vértice == último) con al menos 3 vértices distintos.
///
/// Solo se construye vía `normalize_closed_polygon`, también al deserializar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct Polygon {
    ring: Vec<GeoPoint>,
}

impl Polygon {
    pub(crate) fn from_closed_ring(ring: Vec<GeoPoint>) -> Self {
        Self { ring }
    }

    /// Anillo completo, incluyendo el vértice de cierre
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// Vértices sin el vértice de cierre
    pub fn vertices(&self) -> &[GeoPoint] {
        &self.ring[..self.ring.len() - 1]
    }

    /// Aristas como pares consecutivos del anillo cerrado
    pub fn edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        self.ring.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn into_ring(self) -> Vec<GeoPoint> {
        self.ring
    }
}

impl TryFrom<Vec<GeoPoint>> for Polygon {
    type Error = GeometryError;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self, Self::Error> {
        normalize_closed_polygon(&points)
    }
}

impl From<Polygon> for Vec<GeoPoint> {
    fn from(polygon: Polygon) -> Self {
        polygon.into_ring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pair_orders() {
        let a = GeoPoint::from_pair([48.85, 2.35], CoordinateOrder::LatLng).unwrap();
        let b = GeoPoint::from_pair([2.35, 48.85], CoordinateOrder::LngLat).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.lat, 48.85);
    }

    #[test]
    fn test_out_of_range_rejected() {
        // Un par [lng, lat] leído como [lat, lng] por error
        assert!(GeoPoint::from_pair([120.0, 45.0], CoordinateOrder::LatLng).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_polygon_deserialize_closes_ring() {
        let json = r#"[{"lat":0.0,"lng":0.0},{"lat":0.0,"lng":1.0},{"lat":1.0,"lng":1.0}]"#;
        let polygon: Polygon = serde_json::from_str(json).unwrap();
        assert_eq!(polygon.ring().len(), 4);
        assert_eq!(polygon.ring().first(), polygon.ring().last());
        assert_eq!(polygon.vertices().len(), 3);
    }

    #[test]
    fn test_polygon_deserialize_rejects_degenerate() {
        let json = r#"[{"lat":0.0,"lng":0.0},{"lat":0.0,"lng":1.0}]"#;
        assert!(serde_json::from_str::<Polygon>(json).is_err());
    }
}

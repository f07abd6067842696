//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las variables tienen un valor por defecto salvo las opcionales
//! (`DATABASE_URL`, `MAPBOX_TOKEN`), cuya ausencia cambia el backend usado.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::models::capacity::CapacityThresholds;
use crate::services::coverage_auditor::GridSpec;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub mapbox_token: Option<String>,
    pub geocoding_country: Option<String>,
    pub capacity_thresholds: CapacityThresholds,
    pub coverage_grid: GridSpec,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            cors_origins: Vec::new(),
            mapbox_token: None,
            geocoding_country: None,
            capacity_thresholds: CapacityThresholds::default(),
            coverage_grid: GridSpec::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid value, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl EnvironmentConfig {
    /// Leer la configuración del entorno (tras `dotenvy`)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let capacity_thresholds = CapacityThresholds {
            near_capacity_pct: parse_var("NEAR_CAPACITY_THRESHOLD", defaults.capacity_thresholds.near_capacity_pct)?,
        };
        if capacity_thresholds.near_capacity_pct > 100 {
            return Err(anyhow!("NEAR_CAPACITY_THRESHOLD must be a percentage between 0 and 100"));
        }

        let coverage_grid = GridSpec {
            cell_size_deg: parse_var("COVERAGE_CELL_SIZE_DEG", defaults.coverage_grid.cell_size_deg)?,
            max_cells: parse_var("COVERAGE_MAX_CELLS", defaults.coverage_grid.max_cells)?,
        };
        if coverage_grid.cell_size_deg <= 0.0 {
            return Err(anyhow!("COVERAGE_CELL_SIZE_DEG must be positive"));
        }

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            database_url: optional_var("DATABASE_URL"),
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| origins.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_default(),
            mapbox_token: optional_var("MAPBOX_TOKEN"),
            geocoding_country: optional_var("GEOCODING_COUNTRY"),
            capacity_thresholds,
            coverage_grid,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

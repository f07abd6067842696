use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use territory_allocation::config::database::{mask_database_url, DatabaseConfig};
use territory_allocation::config::environment::EnvironmentConfig;
use territory_allocation::repositories::{InMemoryRouteRepository, PgRouteRepository, RouteRepository};
use territory_allocation::routes::create_router;
use territory_allocation::services::geocoding_service::{Geocoder, MapboxGeocoder};
use territory_allocation::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(if config.is_development() {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    info!("🗺️ Route Territory & Capacity Allocation Engine");
    info!("================================================");

    // Repositorio: PostgreSQL si hay DATABASE_URL, memoria en otro caso
    let repository: Arc<dyn RouteRepository> = match &config.database_url {
        Some(url) => {
            info!("🐘 Conectando a {}", mask_database_url(url));
            let pool = match DatabaseConfig::new(url.clone()).create_pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            Arc::new(PgRouteRepository::new(pool))
        }
        None => {
            warn!("⚠️ DATABASE_URL no configurada, usando repositorio en memoria");
            Arc::new(InMemoryRouteRepository::new())
        }
    };

    let geocoder: Option<Arc<dyn Geocoder>> = match &config.mapbox_token {
        Some(token) => {
            let geocoder = MapboxGeocoder::new(token.clone(), config.geocoding_country.clone())?;
            info!("📍 Geocodificación Mapbox habilitada");
            Some(Arc::new(geocoder))
        }
        None => {
            info!("📍 Sin MAPBOX_TOKEN: las asignaciones requieren coordenadas");
            None
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(config, repository, geocoder);

    // Reconstruir cargas desde las tareas persistidas
    let seeded = app_state.seed_ledger().await?;
    info!("✅ Ledger inicializado con {} rutas", seeded);

    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🧭 Territorio:");
    info!("   GET  /territory/resolve?lat&lng[&depotId] - Rutas que contienen el punto");
    info!("📦 Asignaciones:");
    info!("   POST /assignments/single - Asignar una tarea");
    info!("   POST /assignments/batch - Asignar un lote a una ruta");
    info!("   POST /assignments/reassign - Mover una tarea de ruta");
    info!("📊 Capacidad:");
    info!("   GET  /capacity/snapshot?routeId | depotId[&date] - Estado de capacidad");
    info!("   POST /capacity/release - Liberar capacidad");
    info!("   POST /capacity/recompute - Reconciliar cargas con tareas persistidas");
    info!("🛣️ Rutas:");
    info!("   POST /routes - Crear ruta");
    info!("   GET  /routes/:id - Obtener ruta");
    info!("   DELETE /routes/:id - Borrar ruta sin carga");
    info!("   PUT  /routes/:id/capacity - Cambiar capacidad");
    info!("   POST /routes/:id/deactivate - Desactivar ruta");
    info!("   POST /routes/:id/activate - Reactivar ruta");
    info!("🕳️ Cobertura:");
    info!("   GET  /coverage/gaps?depotId - Huecos de cobertura del depósito");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

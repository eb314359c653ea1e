use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn, Level};

use shiteni_transit::cache::{redis_client::RedisClient, CacheConfig};
use shiteni_transit::config::{EnvironmentConfig, StoreBackend};
use shiteni_transit::database::DatabaseConnection;
use shiteni_transit::routes::create_app;
use shiteni_transit::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚌 Shiteni Transit - API de reservas de autobús");
    info!("================================================");
    info!("🌍 Entorno: {} (backend {:?})", config.environment, config.store_backend);
    if config.cors_origins.is_empty() && !config.is_development() {
        warn!("⚠️ CORS_ORIGINS vacío fuera de desarrollo: se aceptan todos los orígenes");
    }

    let redis = connect_redis(&config).await;

    let app_state = match config.store_backend {
        StoreBackend::Postgres => {
            let db_connection = DatabaseConnection::new(&config.database)
                .await
                .context("Error de base de datos")?;
            AppState::with_postgres(db_connection.pool().clone(), config.clone(), redis)
        }
        StoreBackend::Memory => {
            warn!("⚠️ Usando almacén en memoria: los datos se pierden al reiniciar");
            if redis.is_some() {
                info!("ℹ️ Redis ignorado con el almacén en memoria");
            }
            AppState::in_memory(config.clone())
        }
    };

    let app = create_app(app_state);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("🛣️ Rutas:");
    info!("   POST  /api/routes - Crear ruta");
    info!("   GET   /api/routes - Listar rutas");
    info!("   GET   /api/routes/:id - Obtener ruta");
    info!("   PATCH /api/routes/:id/status - Cambiar estado");
    info!("   GET   /api/routes/:id/fare?from=&to= - Cotizar tarifa");
    info!("   GET   /api/routes/:id/schedules - Salidas de la ruta");
    info!("🗓️ Salidas:");
    info!("   POST  /api/schedules - Programar salida");
    info!("   GET   /api/schedules/:id - Obtener salida");
    info!("   PATCH /api/schedules/:id/status - Cambiar estado");
    info!("   GET   /api/schedules/:id/bookings - Reservas de la salida");
    info!("🎫 Reservas:");
    info!("   POST  /api/bookings - Crear reserva");
    info!("   GET   /api/bookings/:booking_number - Obtener reserva");
    info!("   POST  /api/bookings/:booking_number/confirm-payment");
    info!("   POST  /api/bookings/:booking_number/complete");
    info!("   POST  /api/bookings/:booking_number/cancel");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Redis es opcional: sin URL o sin conexión se sirve sin cache
async fn connect_redis(config: &EnvironmentConfig) -> Option<RedisClient> {
    let redis_url = config.redis_url.clone()?;

    let cache_config = CacheConfig {
        redis_url,
        default_ttl: config.route_cache_ttl,
        ..CacheConfig::default()
    };

    match RedisClient::new(cache_config).await {
        Ok(client) => {
            info!("✅ Redis conectado exitosamente");
            Some(client)
        }
        Err(e) => {
            warn!("⚠️ Redis no disponible, se continúa sin cache: {}", e);
            None
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
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
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
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

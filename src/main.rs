use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn, Level};

use fleet_maintenance::config::environment::EnvironmentConfig;
use fleet_maintenance::services::session_registry::JANITOR_INTERVAL;
use fleet_maintenance::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env();

    // Configurar logging
    let level = match &config {
        Ok(config) => config.log_level.parse().unwrap_or(Level::INFO),
        Err(_) => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚛 Engine Armour - Mantenimiento de flotas");
    info!("==========================================");

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuración inválida: {}", e);
            return Err(anyhow::anyhow!("Error de configuración: {}", e));
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("⚙️ Entorno: {} | backend: {}", config.environment, config.backend.name());

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Error inicializando el backend: {}", e);
            return Err(anyhow::anyhow!("Error de backend: {}", e));
        }
    };

    let connectivity = state.connectivity.check_connection().await;
    if connectivity.connected {
        info!("✅ Servicio de datos accesible");
    } else {
        warn!(
            "⚠️ Servicio de datos no accesible: {}",
            connectivity.last_error.as_deref().unwrap_or("unknown error")
        );
    }

    let janitor = state.sessions.spawn_janitor(JANITOR_INTERVAL);
    let app = create_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Páginas disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("   GET  /login, /register - Acceso");
    info!("   GET  / - Dashboard");
    info!("   GET  /trucks, /trucks/add, /trucks/:id - Camiones");
    info!("   GET  /trucks/:id/maintenance - Nuevo mantenimiento");
    info!("   GET  /scan - Buscar camión por QR");
    info!("   GET  /company - Perfil de empresa");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    janitor.abort();
    info!("👋 Servidor terminado");
    Ok(())
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

//! Comprobación de conectividad con el servicio remoto
//!
//! Se ejecuta al arrancar. Mientras falle, cada petición de página vuelve a
//! comprobar una vez antes de mostrar la pantalla de reintento.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::clients::{RemoteClient, TableQuery};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectivityStatus {
    pub connected: bool,
    pub last_error: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ConnectivityMonitor {
    client: Arc<dyn RemoteClient>,
    status: Arc<RwLock<ConnectivityStatus>>,
}

impl ConnectivityMonitor {
    /// `client` debe ser un cliente anónimo dedicado a esta comprobación
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            client,
            status: Arc::new(RwLock::new(ConnectivityStatus::default())),
        }
    }

    pub async fn status(&self) -> ConnectivityStatus {
        self.status.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.status.read().await.connected
    }

    /// Consulta mínima contra `companies`; actualiza y devuelve el estado
    pub async fn check_connection(&self) -> ConnectivityStatus {
        let query = TableQuery::table("companies").select("id").limit(1);
        let result = self.client.select(&query).await;

        let status = ConnectivityStatus {
            connected: result.is_ok(),
            last_error: result.err().map(|e| e.to_string()),
            checked_at: Some(Utc::now()),
        };
        match &status.last_error {
            None => info!("✅ Conexión con el servicio remoto verificada"),
            Some(e) => error!("❌ Sin conexión con el servicio remoto: {}", e),
        }

        *self.status.write().await = status.clone();
        status
    }
}

//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::clients::{ClientFactory, MemoryBackend, SupabaseConnector};
use crate::config::environment::{BackendConfig, EnvironmentConfig};
use crate::services::{ConnectivityMonitor, SessionLimits, SessionRegistry, SessionSettings};
use crate::utils::errors::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub sessions: SessionRegistry,
    pub connectivity: ConnectivityMonitor,
}

impl AppState {
    /// Construir el estado con una fábrica de clientes ya creada
    pub fn new(config: EnvironmentConfig, factory: Arc<dyn ClientFactory>) -> Self {
        let settings = SessionSettings {
            init_timeout: config.session_init_timeout,
        };
        Self {
            connectivity: ConnectivityMonitor::new(factory.connect()),
            sessions: SessionRegistry::new(factory, settings, SessionLimits::from_config(&config)),
            config: Arc::new(config),
        }
    }

    /// Construir el estado según el backend configurado
    pub fn from_config(config: EnvironmentConfig) -> Result<Self, AppError> {
        let factory: Arc<dyn ClientFactory> = match &config.backend {
            BackendConfig::Supabase { url, anon_key } => Arc::new(
                SupabaseConnector::new(url, anon_key).map_err(|e| {
                    AppError::Internal(format!("Error creating Supabase client: {}", e))
                })?,
            ),
            BackendConfig::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::new(config, factory))
    }
}

//! Clientes del servicio remoto (auth + tablas)
//!
//! Este módulo define el contrato con el backend-as-a-service: sesión de
//! autenticación, notificaciones de cambio de sesión y operaciones genéricas
//! sobre tablas con filtros de igualdad.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::auth::{AuthEvent, AuthSession, SignUpOutcome};

pub use memory::{MemoryBackend, MemoryClient};
pub use supabase::{SupabaseClient, SupabaseConnector};

/// Código PostgREST para "se esperaba una sola fila"
pub const SINGLE_ROW_CODE: &str = "PGRST116";

/// Errores del servicio remoto
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Auth(String),

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Expected a single row but found {0}")]
    NotSingle(usize),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// "No encontrado" en el sentido de PostgREST (`PGRST116`)
    pub fn is_not_found(&self) -> bool {
        match self {
            RemoteError::NotSingle(_) => true,
            RemoteError::Api { code: Some(code), .. } => code == SINGLE_ROW_CODE,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}

/// Filtro de igualdad `columna = valor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Consulta de lectura sobre una tabla remota
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl TableQuery {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Contrato con el servicio remoto de auth + datos.
///
/// Cada instancia representa la sesión de auth de UN navegador: `sign_in`
/// guarda la sesión dentro del cliente y las operaciones de tabla viajan con
/// ese token.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Sesión actual (refrescando el token si expiró)
    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError>;

    /// Suscripción a cambios de sesión. Soltar el receiver cancela la suscripción.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, RemoteError>;

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError>;

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, RemoteError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, RemoteError>;

    /// Select que espera exactamente una fila
    async fn select_single(&self, query: &TableQuery) -> Result<Value, RemoteError> {
        let mut rows = self.select(query).await?;
        if rows.len() == 1 {
            Ok(rows.remove(0))
        } else {
            Err(RemoteError::NotSingle(rows.len()))
        }
    }
}

/// Crea un cliente remoto por cada sesión de navegador
pub trait ClientFactory: Send + Sync {
    fn connect(&self) -> Arc<dyn RemoteClient>;

    fn backend_name(&self) -> &'static str;
}

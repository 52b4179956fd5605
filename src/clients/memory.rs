//! Backend en memoria
//!
//! Implementa el mismo contrato que el servicio remoto (auth + tablas) dentro
//! del proceso. Se usa para desarrollo local (`BACKEND=memory`) y en los tests.
//! `MemoryBackend` guarda cuentas y tablas compartidas; cada `MemoryClient`
//! representa la sesión de auth de un navegador.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ClientFactory, Filter, RemoteClient, RemoteError, SortOrder, TableQuery};
use crate::models::auth::{AuthEvent, AuthSession, AuthUser, SignUpOutcome};

const EVENT_CAPACITY: usize = 16;
/// Duración de las sesiones emitidas por el backend en memoria
const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password_hash: String,
}

/// Estado compartido por todos los clientes en memoria
pub struct MemoryBackend {
    accounts: RwLock<HashMap<String, Account>>,
    tables: RwLock<HashMap<String, Vec<Value>>>,
    hash_cost: u32,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Self::with_hash_cost(DEFAULT_COST)
    }

    /// Coste de bcrypt configurable (los tests usan el mínimo, 4)
    pub fn with_hash_cost(hash_cost: u32) -> Arc<Self> {
        Arc::new(Self {
            accounts: RwLock::new(HashMap::new()),
            tables: RwLock::new(HashMap::new()),
            hash_cost,
            offline: AtomicBool::new(false),
        })
    }

    /// Simular caída del servicio: toda operación falla con error de red
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    pub fn client(self: &Arc<Self>) -> MemoryClient {
        MemoryClient::new(Arc::clone(self))
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Copia de las filas de una tabla, para inspección
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            Err(RemoteError::Network("backend offline".to_string()))
        } else {
            Ok(())
        }
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        let key = email.trim().to_lowercase();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(RemoteError::Auth("User already registered".to_string()));
        }

        let password_hash = hash(password, self.hash_cost)
            .map_err(|e| RemoteError::Auth(format!("Error hashing password: {}", e)))?;
        let account = Account {
            id: Uuid::new_v4(),
            email: key.clone(),
            password_hash,
        };
        let user = AuthUser {
            id: account.id,
            email: Some(account.email.clone()),
        };
        accounts.insert(key, account);
        info!("👤 Cuenta creada en memoria: {}", user.id);
        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        let invalid = || RemoteError::Auth("Invalid login credentials".to_string());
        let key = email.trim().to_lowercase();
        let account = self.accounts.read().await.get(&key).cloned().ok_or_else(invalid)?;

        let valid = verify(password, &account.password_hash)
            .map_err(|e| RemoteError::Auth(format!("Error verifying password: {}", e)))?;
        if !valid {
            return Err(invalid());
        }
        Ok(AuthUser {
            id: account.id,
            email: Some(account.email),
        })
    }

    async fn select_rows(&self, query: &TableQuery) -> Vec<Value> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filters(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((column, order)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        rows.into_iter()
            .map(|row| project(row, &query.columns))
            .collect()
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let mut object = match row {
                Value::Object(object) => object,
                other => {
                    return Err(RemoteError::Api {
                        status: 400,
                        code: Some("PGRST102".to_string()),
                        message: format!("Expected a JSON object, got {}", other),
                    })
                }
            };
            object
                .entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            object
                .entry("created_at")
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
            prepared.push(Value::Object(object));
        }

        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(prepared.iter().cloned());
        debug!("📝 {} filas insertadas en {}", prepared.len(), table);
        Ok(prepared)
    }

    async fn update_rows(&self, table: &str, patch: &Map<String, Value>, filters: &[Filter]) -> Vec<Value> {
        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches_filters(row, filters)) {
                if let Value::Object(object) = row {
                    for (key, value) in patch {
                        object.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        updated
    }

    async fn delete_rows(&self, table: &str, filters: &[Filter]) -> Vec<Value> {
        let mut tables = self.tables.write().await;
        let mut removed = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| {
                if matches_filters(row, filters) {
                    removed.push(row.clone());
                    false
                } else {
                    true
                }
            });
        }
        removed
    }
}

impl ClientFactory for Arc<MemoryBackend> {
    fn connect(&self) -> Arc<dyn RemoteClient> {
        Arc::new(self.client())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Cliente en memoria con la sesión de auth de un navegador
pub struct MemoryClient {
    backend: Arc<MemoryBackend>,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl MemoryClient {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            session: RwLock::new(None),
            events,
        }
    }

    async fn start_session(&self, user: AuthUser) -> AuthSession {
        let session = AuthSession {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now().timestamp() + SESSION_TTL_SECS),
            user,
        };
        *self.session.write().await = Some(session.clone());
        // Sin suscriptores el envío falla, lo cual es válido
        let _ = self.events.send(AuthEvent::signed_in(session.clone()));
        session
    }
}

#[async_trait]
impl RemoteClient for MemoryClient {
    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        self.backend.ensure_online()?;
        Ok(self.session.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        self.backend.ensure_online()?;
        let user = self.backend.authenticate(email, password).await?;
        Ok(self.start_session(user).await)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        self.backend.ensure_online()?;
        let user = self.backend.create_account(email, password).await?;
        let session = self.start_session(user.clone()).await;
        Ok(SignUpOutcome {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.backend.ensure_online()?;
        let previous = self.session.write().await.take();
        if previous.is_some() {
            let _ = self.events.send(AuthEvent::signed_out());
        }
        Ok(())
    }

    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, RemoteError> {
        self.backend.ensure_online()?;
        Ok(self.backend.select_rows(query).await)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        self.backend.ensure_online()?;
        self.backend.insert_rows(table, rows).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, RemoteError> {
        self.backend.ensure_online()?;
        match patch {
            Value::Object(patch) => Ok(self.backend.update_rows(table, &patch, filters).await),
            other => Err(RemoteError::Api {
                status: 400,
                code: Some("PGRST102".to_string()),
                message: format!("Expected a JSON object, got {}", other),
            }),
        }
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, RemoteError> {
        self.backend.ensure_online()?;
        Ok(self.backend.delete_rows(table, filters).await)
    }
}

/// Representación textual de un valor, tal como llegaría en `col=eq.<valor>`
fn filter_repr(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn matches_filters(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        row.get(&filter.column)
            .map_or(false, |value| filter_repr(value) == filter.value)
    })
}

/// Orden ascendente con nulos al final
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => filter_repr(x).cmp(&filter_repr(y)),
    }
}

/// Aplica la lista de columnas de un `select`
fn project(row: Value, columns: &str) -> Value {
    let wanted: Vec<&str> = columns.split(',').map(str::trim).collect();
    if wanted.iter().any(|c| *c == "*") {
        return row;
    }
    match row {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(key, _)| wanted.contains(&key.as_str()))
                .collect(),
        ),
        other => other,
    }
}

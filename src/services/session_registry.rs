//! Registro de sesiones de navegador
//!
//! Asocia la cookie `fleet_session` a su `SessionStore`. Solo el registro
//! emite ids: una cookie con un id desconocido no crea nada. Un janitor
//! periódico elimina los stores inactivos, con un TTL más corto para los
//! que nunca llegaron a autenticarse.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::ClientFactory;
use crate::config::EnvironmentConfig;
use crate::services::session_store::{SessionSettings, SessionStore};

pub const JANITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Límites de vida y tamaño del registro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub idle_ttl: Duration,
    pub anonymous_ttl: Duration,
    pub max_sessions: usize,
}

impl SessionLimits {
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self {
            idle_ttl: config.session_idle_ttl,
            anonymous_ttl: config.session_anonymous_ttl,
            max_sessions: config.max_sessions.max(1),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::from_config(&EnvironmentConfig::default())
    }
}

struct Entry {
    store: Arc<SessionStore>,
    last_seen: Instant,
}

impl Entry {
    fn is_authenticated(&self) -> bool {
        self.store.snapshot().is_authenticated()
    }

    fn ttl(&self, limits: &SessionLimits) -> Duration {
        if self.is_authenticated() {
            limits.idle_ttl
        } else {
            limits.anonymous_ttl
        }
    }

    fn expired(&self, now: Instant, limits: &SessionLimits) -> bool {
        now.duration_since(self.last_seen) > self.ttl(limits)
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    factory: Arc<dyn ClientFactory>,
    settings: SessionSettings,
    limits: SessionLimits,
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn ClientFactory>, settings: SessionSettings, limits: SessionLimits) -> Self {
        Self {
            factory,
            settings,
            limits,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.factory.backend_name()
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Nueva sesión con un id emitido por el servidor
    pub async fn create(&self) -> (Uuid, Arc<SessionStore>) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.limits.max_sessions {
            make_room(&mut entries, &self.limits);
        }

        let id = loop {
            let candidate = Uuid::new_v4();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        let store = Arc::new(SessionStore::start(self.factory.connect(), self.settings));
        entries.insert(
            id,
            Entry {
                store: Arc::clone(&store),
                last_seen: Instant::now(),
            },
        );
        debug!("🆕 Nuevo store de sesión {}", id);
        (id, store)
    }

    /// Store de una sesión existente; marca la actividad
    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionStore>> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.store))
    }

    /// Mueve el store a un id nuevo. El id anterior deja de ser válido.
    pub async fn rotate(&self, id: Uuid) -> Option<Uuid> {
        let mut entries = self.entries.write().await;
        let mut entry = entries.remove(&id)?;
        let new_id = loop {
            let candidate = Uuid::new_v4();
            if candidate != id && !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        entry.last_seen = Instant::now();
        entries.insert(new_id, entry);
        debug!("🔄 Sesión {} rotada a {}", id, new_id);
        Some(new_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Elimina los stores inactivos: `idle_ttl` con usuario, `anonymous_ttl` sin él
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| {
            let expired = entry.expired(now, &self.limits);
            if expired {
                entry.store.shutdown();
            }
            !expired
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            info!("🧹 {} sesiones inactivas eliminadas", evicted);
        }
        evicted
    }

    /// Tarea periódica de limpieza
    pub fn spawn_janitor(&self, interval: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.evict_idle().await;
            }
        })
    }
}

/// Libera sitio con el registro lleno: primero los caducados, luego la
/// sesión anónima más antigua y, si no hay, la más antigua de todas
fn make_room(entries: &mut HashMap<Uuid, Entry>, limits: &SessionLimits) {
    let now = Instant::now();
    entries.retain(|_, entry| {
        let expired = entry.expired(now, limits);
        if expired {
            entry.store.shutdown();
        }
        !expired
    });
    if entries.len() < limits.max_sessions {
        return;
    }

    let oldest = |anonymous_only: bool| {
        entries
            .iter()
            .filter(|(_, entry)| !anonymous_only || !entry.is_authenticated())
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(id, _)| *id)
    };
    let victim = oldest(true).or_else(|| oldest(false));
    if let Some(entry) = victim.and_then(|id| entries.remove(&id)) {
        warn!("⚠️ Registro de sesiones lleno, se descarta la más antigua");
        entry.store.shutdown();
    }
}

//! Store de sesión por navegador
//!
//! Refleja la sesión del servicio remoto de auth y la empresa del usuario.
//! El estado vive en un canal `watch`: los handlers leen snapshots sin
//! bloquear y los guards esperan a que la inicialización termine.
//!
//! Una tarea de sincronización por store:
//! 1. se suscribe a los eventos de auth,
//! 2. pide la sesión actual una vez (acotado por `init_timeout`),
//! 3. aplica los eventos en orden hasta que el store se apaga.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::clients::RemoteClient;
use crate::models::auth::{AuthEvent, AuthUser};
use crate::models::company::{Company, NewCompany};
use crate::repositories::CompanyRepository;
use crate::utils::errors::AppError;

pub const DEFAULT_INIT_TIMEOUT_MS: u64 = 3000;

/// Fase del ciclo de vida del store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Initializing,
    Ready,
}

/// Estado derivado para la UI y los guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Initializing,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<AuthUser>,
    pub company: Option<Company>,
    pub busy: bool,
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
            company: None,
            busy: false,
            error: None,
        }
    }
}

impl SessionSnapshot {
    /// Ocupado con una acción o todavía arrancando
    pub fn is_loading(&self) -> bool {
        self.busy || self.phase != SessionPhase::Ready
    }

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            SessionPhase::Uninitialized => SessionStatus::Uninitialized,
            SessionPhase::Initializing => SessionStatus::Initializing,
            SessionPhase::Ready if self.user.is_some() => SessionStatus::Authenticated,
            SessionPhase::Ready => SessionStatus::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn company_id(&self) -> Option<uuid::Uuid> {
        self.company.as_ref().map(|c| c.id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub init_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            init_timeout: Duration::from_millis(DEFAULT_INIT_TIMEOUT_MS),
        }
    }
}

struct Shared {
    client: Arc<dyn RemoteClient>,
    companies: CompanyRepository,
    state: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn record_error(&self, message: String) {
        self.state.send_modify(|s| s.error = Some(message));
    }

    /// Empresa del usuario; un fallo se registra y deja la empresa vacía
    async fn load_company(&self, user: Option<&AuthUser>) -> (Option<Company>, Option<String>) {
        let user = match user {
            Some(user) => user,
            None => return (None, None),
        };
        match self.companies.find_by_user(user.id).await {
            Ok(company) => (company, None),
            Err(e) => {
                error!("❌ Error cargando empresa del usuario {}: {}", user.id, e);
                (None, Some(e.to_string()))
            }
        }
    }

    async fn initial_sync(&self) {
        let session = match self.client.get_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("❌ Error obteniendo la sesión inicial: {}", e);
                self.record_error(e.to_string());
                return;
            }
        };

        let user = session.map(|s| s.user);
        let (company, error) = self.load_company(user.as_ref()).await;
        self.state.send_modify(|s| {
            s.user = user;
            s.company = company;
            if error.is_some() {
                s.error = error;
            }
        });
    }

    /// Callback de cambio de sesión: reemplaza usuario y empresa en un solo paso
    async fn apply_event(&self, event: AuthEvent) {
        debug!("🔔 Evento de auth: {:?}", event.kind);
        let user = event.session.map(|s| s.user);
        let (company, error) = self.load_company(user.as_ref()).await;
        self.state.send_modify(|s| {
            // Un fallo al recargar la empresa del mismo usuario conserva la anterior
            let same_user = s.user.as_ref().map(|u| u.id) == user.as_ref().map(|u| u.id);
            let keep_company = error.is_some() && same_user;
            s.user = user;
            if !keep_company {
                s.company = company;
            }
            if error.is_some() {
                s.error = error;
            }
            s.phase = SessionPhase::Ready;
        });
    }

    async fn run(self: Arc<Self>, mut events: broadcast::Receiver<AuthEvent>, init_timeout: Duration) {
        if timeout(init_timeout, self.initial_sync()).await.is_err() {
            warn!(
                "⏱️ Sincronización inicial de sesión excedió {:?}, se fuerza Ready",
                init_timeout
            );
        }
        self.state.send_modify(|s| s.phase = SessionPhase::Ready);

        loop {
            match events.recv().await {
                Ok(event) => self.apply_event(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("⚠️ {} eventos de auth perdidos, resincronizando", skipped);
                    self.initial_sync().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Marca `busy` mientras vive; se limpia también si el futuro se cancela
struct BusyGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
}

impl<'a> BusyGuard<'a> {
    fn new(state: &'a watch::Sender<SessionSnapshot>) -> Self {
        state.send_modify(|s| {
            s.busy = true;
            s.error = None;
        });
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.busy = false);
    }
}

/// Store de sesión de un navegador
pub struct SessionStore {
    shared: Arc<Shared>,
    settings: SessionSettings,
    sync_task: AbortHandle,
}

impl SessionStore {
    /// Crea el store y lanza su tarea de sincronización
    pub fn start(client: Arc<dyn RemoteClient>, settings: SessionSettings) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let shared = Arc::new(Shared {
            companies: CompanyRepository::new(Arc::clone(&client)),
            client,
            state,
        });

        // Suscribir antes de pedir la sesión: ningún evento se pierde
        let events = shared.client.subscribe();
        shared
            .state
            .send_modify(|s| s.phase = SessionPhase::Initializing);
        let task = tokio::spawn(Arc::clone(&shared).run(events, settings.init_timeout));

        Self {
            shared,
            settings,
            sync_task: task.abort_handle(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn client(&self) -> Arc<dyn RemoteClient> {
        Arc::clone(&self.shared.client)
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Espera hasta que `done` se cumpla o venza `limit`; devuelve el último snapshot
    async fn wait_for<F>(&self, limit: Duration, done: F) -> SessionSnapshot
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        let deadline = Instant::now() + limit;
        let mut rx = self.shared.state.subscribe();
        loop {
            let finished = done(&*rx.borrow_and_update());
            if finished {
                break;
            }
            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                _ => break,
            }
        }
        let snapshot = rx.borrow().clone();
        snapshot
    }

    /// Snapshot una vez que deja de estar cargando (o al vencer `limit`)
    pub async fn wait_until_settled(&self, limit: Duration) -> SessionSnapshot {
        self.wait_for(limit, |s| !s.is_loading()).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AppError> {
        let _busy = BusyGuard::new(&self.shared.state);

        let session = match self.shared.client.sign_in(email.trim(), password).await {
            Ok(session) => session,
            Err(e) => {
                warn!("🔒 Login fallido para {}: {}", email, e);
                self.shared.record_error(e.to_string());
                return Err(e.into());
            }
        };

        // El usuario lo fija el callback de eventos, no el login
        let user_id = session.user.id;
        self.wait_for(self.settings.init_timeout, |s| {
            s.user.as_ref().map(|u| u.id) == Some(user_id)
        })
        .await;
        info!("✅ Login correcto: {}", user_id);
        Ok(())
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        company_name: &str,
        address: &str,
        phone: &str,
    ) -> Result<(), AppError> {
        let _busy = BusyGuard::new(&self.shared.state);
        let result = self
            .register_steps(email.trim(), password, company_name, address, phone)
            .await;
        if let Err(e) = &result {
            warn!("⚠️ Registro fallido para {}: {}", email, e);
            self.shared.record_error(e.user_message());
        }
        result
    }

    async fn register_steps(
        &self,
        email: &str,
        password: &str,
        company_name: &str,
        address: &str,
        phone: &str,
    ) -> Result<(), AppError> {
        // Comprobación de email duplicado: solo orientativa
        match self.shared.companies.email_taken(email).await {
            Ok(true) => {
                return Err(AppError::Conflict(
                    "An account with this email already exists".to_string(),
                ))
            }
            Ok(false) => {}
            Err(e) => warn!("⚠️ No se pudo comprobar el email duplicado: {}", e),
        }

        let outcome = self.shared.client.sign_up(email, password).await?;
        let user = outcome
            .user
            .ok_or_else(|| AppError::Internal("User registration failed".to_string()))?;
        if outcome.session.is_some() {
            // Dejar que el evento de sign-in se aplique antes del sign-out
            let user_id = user.id;
            self.wait_for(self.settings.init_timeout, |s| {
                s.user.as_ref().map(|u| u.id) == Some(user_id)
            })
            .await;
        }

        let company = NewCompany {
            name: company_name.trim().to_string(),
            user_id: user.id,
            address: address.trim().to_string(),
            phone: phone.trim().to_string(),
            email: email.to_string(),
        };
        self.shared.companies.create(&company).await?;
        info!("🏢 Empresa '{}' registrada para {}", company.name, user.id);

        // El registro nunca deja el navegador autenticado
        self.shared.client.sign_out().await?;
        self.wait_for(self.settings.init_timeout, |s| s.user.is_none())
            .await;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        let _busy = BusyGuard::new(&self.shared.state);
        let result = self.shared.client.sign_out().await;

        self.shared.state.send_modify(|s| {
            s.user = None;
            s.company = None;
        });

        match result {
            Ok(()) => {
                info!("👋 Sesión cerrada");
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ Error cerrando sesión remota: {}", e);
                self.shared.record_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Reemplaza la empresa cacheada tras actualizar el perfil
    pub fn set_company(&self, company: Company) {
        self.shared.state.send_modify(|s| s.company = Some(company));
    }

    /// Detiene la tarea de sincronización
    pub fn shutdown(&self) {
        self.sync_task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.sync_task.is_finished()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.sync_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ClientFactory, Filter, MemoryBackend, RemoteError, TableQuery};
    use crate::models::auth::{AuthSession, SignUpOutcome};
    use async_trait::async_trait;
    use serde_json::Value;

    fn settings() -> SessionSettings {
        SessionSettings {
            init_timeout: Duration::from_millis(500),
        }
    }

    async fn seeded_backend() -> Arc<MemoryBackend> {
        let backend = MemoryBackend::with_hash_cost(4);
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;
        store
            .register("a@b.com", "secret1", "Acme Haulage", "12 Depot Road", "5551234567")
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_initializes_to_anonymous() {
        let backend = MemoryBackend::with_hash_cost(4);
        let store = SessionStore::start(backend.connect(), settings());
        let snapshot = store.wait_until_settled(Duration::from_secs(1)).await;
        assert_eq!(snapshot.phase, SessionPhase::Ready);
        assert_eq!(snapshot.status(), SessionStatus::Anonymous);
        assert!(!snapshot.is_loading());
    }

    #[tokio::test]
    async fn test_login_sets_user_and_company() {
        let backend = seeded_backend().await;
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;

        store.login("a@b.com", "secret1").await.unwrap();
        let snapshot = store.snapshot();
        assert!(!snapshot.is_loading());
        assert_eq!(snapshot.status(), SessionStatus::Authenticated);
        assert_eq!(snapshot.company.unwrap().name, "Acme Haulage");
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_company_kept_when_reload_fails() {
        let backend = seeded_backend().await;
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;
        store.login("a@b.com", "secret1").await.unwrap();
        let user = store.snapshot().user.unwrap();

        backend.set_offline(true);
        store
            .shared
            .apply_event(AuthEvent::token_refreshed(AuthSession {
                access_token: "refreshed".to_string(),
                refresh_token: None,
                expires_at: None,
                user,
            }))
            .await;

        let snapshot = store.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.company.unwrap().name, "Acme Haulage");
    }

    #[tokio::test]
    async fn test_invalid_credentials_leave_user_unchanged() {
        let backend = seeded_backend().await;
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;

        let err = store.login("a@b.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Remote(RemoteError::Auth(_))));
        let snapshot = store.snapshot();
        assert!(snapshot.user.is_none());
        assert!(!snapshot.busy);
        assert_eq!(snapshot.error.as_deref(), Some("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_register_leaves_browser_anonymous() {
        let backend = MemoryBackend::with_hash_cost(4);
        let client = backend.connect();
        let store = SessionStore::start(Arc::clone(&client), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;

        store
            .register("new@fleet.test", "secret1", "Fleet Co", "1 Main Street", "5550001111")
            .await
            .unwrap();

        assert!(client.get_session().await.unwrap().is_none());
        assert!(store.snapshot().user.is_none());
        assert_eq!(backend.rows("companies").await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_before_sign_up() {
        let backend = seeded_backend().await;
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;

        let err = store
            .register("a@b.com", "secret2", "Other Co", "2 Side Street", "5559998888")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "An account with this email already exists");
        assert_eq!(backend.account_count().await, 1);
        assert_eq!(
            store.snapshot().error.as_deref(),
            Some("An account with this email already exists")
        );
    }

    #[tokio::test]
    async fn test_logout_clears_user_and_company() {
        let backend = seeded_backend().await;
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;
        store.login("a@b.com", "secret1").await.unwrap();

        store.logout().await.unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.user.is_none());
        assert!(snapshot.company.is_none());
    }

    #[tokio::test]
    async fn test_logout_failure_still_clears_locally() {
        let backend = seeded_backend().await;
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;
        store.login("a@b.com", "secret1").await.unwrap();

        backend.set_offline(true);
        assert!(store.logout().await.is_err());
        let snapshot = store.snapshot();
        assert!(snapshot.user.is_none());
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_initial_session_error_is_recorded() {
        let backend = MemoryBackend::with_hash_cost(4);
        backend.set_offline(true);
        let store = SessionStore::start(backend.connect(), settings());
        let snapshot = store.wait_until_settled(Duration::from_secs(1)).await;
        assert_eq!(snapshot.phase, SessionPhase::Ready);
        assert!(snapshot.error.is_some());
    }

    /// Cliente cuya sesión inicial nunca responde
    struct StalledClient {
        events: broadcast::Sender<AuthEvent>,
    }

    #[async_trait]
    impl RemoteClient for StalledClient {
        async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError> {
            std::future::pending().await
        }
        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
        async fn sign_in(&self, _: &str, _: &str) -> Result<AuthSession, RemoteError> {
            Err(RemoteError::Network("stalled".into()))
        }
        async fn sign_up(&self, _: &str, _: &str) -> Result<SignUpOutcome, RemoteError> {
            Err(RemoteError::Network("stalled".into()))
        }
        async fn sign_out(&self) -> Result<(), RemoteError> {
            Ok(())
        }
        async fn select(&self, _: &TableQuery) -> Result<Vec<Value>, RemoteError> {
            Ok(Vec::new())
        }
        async fn insert(&self, _: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
            Ok(rows)
        }
        async fn update(&self, _: &str, _: Value, _: &[Filter]) -> Result<Vec<Value>, RemoteError> {
            Ok(Vec::new())
        }
        async fn delete(&self, _: &str, _: &[Filter]) -> Result<Vec<Value>, RemoteError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_stalled_initial_sync_reaches_ready_after_timeout() {
        let (events, _) = broadcast::channel(4);
        let client: Arc<dyn RemoteClient> = Arc::new(StalledClient { events });
        let store = SessionStore::start(
            client,
            SessionSettings {
                init_timeout: Duration::from_millis(50),
            },
        );
        assert!(store.snapshot().is_loading());

        let snapshot = store.wait_until_settled(Duration::from_secs(2)).await;
        assert_eq!(snapshot.phase, SessionPhase::Ready);
        assert_eq!(snapshot.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_shutdown_stops_sync_task() {
        let backend = MemoryBackend::with_hash_cost(4);
        let store = SessionStore::start(backend.connect(), settings());
        store.wait_until_settled(Duration::from_secs(1)).await;
        assert!(store.is_running());

        store.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.is_running());
    }
}

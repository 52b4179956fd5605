//! Cliente HTTP para Supabase (GoTrue + PostgREST)
//!
//! `SupabaseConnector` comparte el pool HTTP entre todas las sesiones;
//! `SupabaseClient` guarda el token de un navegador y lo adjunta a cada
//! consulta de tabla.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{ClientFactory, Filter, RemoteClient, RemoteError, TableQuery};
use crate::models::auth::{AuthEvent, AuthSession, AuthUser, SignUpOutcome};

const EVENT_CAPACITY: usize = 16;
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// El token se renueva si expira dentro de este margen
const EXPIRY_MARGIN_SECS: i64 = 30;

/// Fábrica de clientes Supabase, uno por sesión de navegador
#[derive(Clone)]
pub struct SupabaseConnector {
    http: Client,
    url: String,
    anon_key: String,
}

impl SupabaseConnector {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("FleetMaintenance/1.0")
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }
}

impl ClientFactory for SupabaseConnector {
    fn connect(&self) -> Arc<dyn RemoteClient> {
        Arc::new(SupabaseClient::new(
            self.http.clone(),
            self.url.clone(),
            self.anon_key.clone(),
        ))
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}

/// Respuesta de `/auth/v1/token`
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Cliente Supabase con la sesión de un navegador
pub struct SupabaseClient {
    http: Client,
    url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    pub fn new(http: Client, url: String, anon_key: String) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http,
            url,
            anon_key,
            session: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    fn notify(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Petición con `apikey` y el token de la sesión (o la anon key)
    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, RemoteError> {
        let bearer = match self.current_session().await? {
            Some(session) => session.access_token,
            None => self.anon_key.clone(),
        };

        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer)))
    }

    /// Sesión vigente. Un token expirado (o a punto de expirar) se refresca
    /// una vez; si el refresh se rechaza la sesión se cierra.
    async fn current_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        match self.session.read().await.as_ref() {
            None => return Ok(None),
            Some(session) if !needs_refresh(session) => return Ok(Some(session.clone())),
            Some(_) => {}
        }

        // Los refresh tokens son de un solo uso: un refresh a la vez
        let _refreshing = self.refresh_lock.lock().await;
        let session = match self.session.read().await.clone() {
            None => return Ok(None),
            Some(session) if !needs_refresh(&session) => return Ok(Some(session)),
            Some(session) => session,
        };

        let refresh_token = match session.refresh_token.as_deref() {
            Some(token) => token,
            None => {
                warn!("🔒 Token expirado sin refresh token, sesión cerrada");
                *self.session.write().await = None;
                self.notify(AuthEvent::signed_out());
                return Ok(None);
            }
        };

        match self.refresh(refresh_token).await {
            Ok(refreshed) => {
                *self.session.write().await = Some(refreshed.clone());
                self.notify(AuthEvent::token_refreshed(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(RemoteError::Auth(message)) => {
                warn!("🔒 Refresh rechazado, sesión cerrada: {}", message);
                *self.session.write().await = None;
                self.notify(AuthEvent::signed_out());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<AuthSession, RemoteError> {
        let url = format!("{}/auth/v1/token?grant_type={}", self.url, grant_type);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let response = check_auth(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, RemoteError> {
        debug!("🔄 Refrescando token de Supabase");
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn send_table(&self, builder: RequestBuilder) -> Result<Vec<Value>, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (code, message) = parse_error_body(&body, status.as_u16());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            other => Ok(vec![other]),
        }
    }

    fn table_url(&self, table: &str, params: &[(String, String)]) -> String {
        build_url(&format!("{}/rest/v1/{}", self.url, table), params)
    }
}

#[async_trait]
impl RemoteClient for SupabaseClient {
    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        self.current_session().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        info!("🔐 Sesión iniciada en Supabase: {}", session.user.id);
        *self.session.write().await = Some(session.clone());
        self.notify(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        let url = format!("{}/auth/v1/signup", self.url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = check_auth(response).await?;
        let body: Value = response.json().await?;
        let outcome = parse_sign_up(body)?;

        if let Some(session) = &outcome.session {
            *self.session.write().await = Some(session.clone());
            self.notify(AuthEvent::signed_in(session.clone()));
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let previous = self.session.write().await.take();
        let session = match previous {
            Some(session) => session,
            None => return Ok(()),
        };
        self.notify(AuthEvent::signed_out());

        let url = format!("{}/auth/v1/logout", self.url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;
        check_auth(response).await.map(|_| ())
    }

    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(&query.table, &query_params(query));
        let builder = self.request(Method::GET, &url).await?;
        self.send_table(builder).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(table, &[]);
        let builder = self
            .request(Method::POST, &url)
            .await?
            .header("Prefer", "return=representation")
            .json(&rows);
        self.send_table(builder).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(table, &filter_params(filters));
        let builder = self
            .request(Method::PATCH, &url)
            .await?
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send_table(builder).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(table, &filter_params(filters));
        let builder = self
            .request(Method::DELETE, &url)
            .await?
            .header("Prefer", "return=representation");
        self.send_table(builder).await
    }
}

fn needs_refresh(session: &AuthSession) -> bool {
    session.is_expired(Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS))
}

/// Convierte respuestas de error de GoTrue en `RemoteError::Auth`
async fn check_auth(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let (_, message) = parse_error_body(&body, status.as_u16());
    if status.is_server_error() {
        Err(RemoteError::Api {
            status: status.as_u16(),
            code: None,
            message,
        })
    } else {
        Err(RemoteError::Auth(message))
    }
}

/// El signup devuelve una sesión completa o, con confirmación de email, solo el usuario
fn parse_sign_up(body: Value) -> Result<SignUpOutcome, RemoteError> {
    if body.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(body)?;
        let session = token.into_session();
        return Ok(SignUpOutcome {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    let user_value = match body.get("user").filter(|user| !user.is_null()).cloned() {
        Some(user) => user,
        None => body,
    };
    let user = if user_value.get("id").is_some() {
        Some(serde_json::from_value::<AuthUser>(user_value)?)
    } else {
        None
    };
    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

/// Extrae código y mensaje de un cuerpo de error de GoTrue o PostgREST
fn parse_error_body(body: &str, status: u16) -> (Option<String>, String) {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if body.trim().is_empty() => return (None, format!("HTTP error {}", status)),
        Err(_) => return (None, body.trim().to_string()),
    };

    let code = value.get("code").and_then(|code| match code {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let message = ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error {}", status));
    (code, message)
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

/// Parámetros PostgREST de una consulta de lectura
fn query_params(query: &TableQuery) -> Vec<(String, String)> {
    let columns: String = query.columns.chars().filter(|c| !c.is_whitespace()).collect();
    let mut params = vec![("select".to_string(), columns)];
    params.extend(filter_params(&query.filters));
    if let Some((column, order)) = &query.order {
        params.push(("order".to_string(), format!("{}.{}", column, order.as_str())));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn build_url(base: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, query)
}

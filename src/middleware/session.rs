//! Middleware de sesión de navegador
//!
//! Lee la cookie `fleet_session`, obtiene el `SessionStore` correspondiente
//! del registro y lo inserta en las extensiones de la petición. Sin cookie
//! válida se abre una sesión nueva y se envía su cookie.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;
use uuid::Uuid;

use crate::services::SessionStore;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "fleet_session";

/// Store de sesión del navegador que hizo la petición
#[derive(Clone)]
pub struct BrowserSession(pub Arc<SessionStore>);

#[async_trait]
impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BrowserSession>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

fn session_cookie(id: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Id de la sesión del navegador. Un handler que lo devuelve en las
/// extensiones de la respuesta pide reenviar la cookie con ese id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

/// Solo se aceptan ids emitidos por el registro; cualquier otro recibe uno nuevo
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let known = match presented {
        Some(id) => state.sessions.get(id).await.map(|store| (id, store)),
        None => None,
    };

    let (id, store, issued) = match known {
        Some((id, store)) => (id, store, false),
        None => {
            if presented.is_some() {
                debug!("🍪 Cookie de sesión desconocida, se emite una nueva");
            }
            let (id, store) = state.sessions.create().await;
            debug!("🍪 Nueva sesión de navegador {}", id);
            (id, store, true)
        }
    };
    request.extensions_mut().insert(BrowserSession(store));
    request.extensions_mut().insert(SessionId(id));

    let response = next.run(request).await;
    let current = response
        .extensions()
        .get::<SessionId>()
        .map_or(id, |session_id| session_id.0);
    if issued || current != id {
        (
            jar.add(session_cookie(current, state.config.is_production())),
            response,
        )
            .into_response()
    } else {
        response
    }
}

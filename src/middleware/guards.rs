//! Guards de rutas
//!
//! `require_user` protege las páginas de la aplicación y `require_anonymous`
//! las de login/registro. La decisión es una función pura sobre el snapshot
//! de sesión, tomada después de esperar (acotado) a que el store termine de
//! inicializar.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::session::BrowserSession;
use crate::services::SessionSnapshot;
use crate::views::errors::checking_auth_page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Sesión todavía cargando: "Checking authentication..."
    Placeholder,
    Redirect(&'static str),
    Proceed,
}

pub fn decide(kind: GuardKind, snapshot: &SessionSnapshot) -> GuardDecision {
    if snapshot.is_loading() {
        return GuardDecision::Placeholder;
    }
    match (kind, snapshot.is_authenticated()) {
        (GuardKind::Authenticated, false) => GuardDecision::Redirect("/login"),
        (GuardKind::Anonymous, true) => GuardDecision::Redirect("/"),
        _ => GuardDecision::Proceed,
    }
}

/// Snapshot de sesión ya verificado por el guard
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionSnapshot);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

async fn guard(kind: GuardKind, mut request: Request, next: Next) -> Response {
    let store = match request.extensions().get::<BrowserSession>() {
        Some(BrowserSession(store)) => store.clone(),
        None => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let snapshot = store
        .wait_until_settled(store.settings().init_timeout)
        .await;

    match decide(kind, &snapshot) {
        GuardDecision::Placeholder => Html(checking_auth_page()).into_response(),
        GuardDecision::Redirect(to) => {
            debug!("↪️ {} {} redirigido a {}", request.method(), request.uri().path(), to);
            Redirect::to(to).into_response()
        }
        GuardDecision::Proceed => {
            request.extensions_mut().insert(CurrentSession(snapshot));
            next.run(request).await
        }
    }
}

pub async fn require_user(request: Request, next: Next) -> Response {
    guard(GuardKind::Authenticated, request, next).await
}

pub async fn require_anonymous(request: Request, next: Next) -> Response {
    guard(GuardKind::Anonymous, request, next).await
}

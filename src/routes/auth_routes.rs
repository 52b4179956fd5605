use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use crate::middleware::{BrowserSession, SessionId};
use crate::models::auth::{LoginForm, RegisterForm};
use crate::state::AppState;
use crate::utils::validation::FormErrors;
use crate::views::auth::{login_page, register_page, REGISTERED_NOTICE};

/// Login y registro: solo para navegadores sin sesión
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(show_login).post(login))
        .route("/register", get(show_register).post(register))
}

pub fn create_logout_router() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    registered: Option<String>,
}

async fn show_login(Query(query): Query<LoginQuery>) -> Html<String> {
    let notice = query.registered.is_some().then_some(REGISTERED_NOTICE);
    Html(login_page(&LoginForm::default(), &FormErrors::new(), None, notice))
}

/// Un login correcto cambia el id de sesión del navegador
async fn login(
    State(state): State<AppState>,
    BrowserSession(store): BrowserSession,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(login_page(&form, &FormErrors::from(&errors), None, None)),
        )
            .into_response();
    }

    match store.login(&form.email, &form.password).await {
        Ok(()) => match state.sessions.rotate(id).await {
            Some(new_id) => (Extension(SessionId(new_id)), Redirect::to("/")).into_response(),
            None => Redirect::to("/").into_response(),
        },
        Err(e) => {
            let banner = format!("Failed to sign in. {}", e.user_message());
            (
                e.status_code(),
                Html(login_page(&form, &FormErrors::new(), Some(&banner), None)),
            )
                .into_response()
        }
    }
}

async fn show_register() -> Html<String> {
    Html(register_page(&RegisterForm::default(), &FormErrors::new(), None))
}

async fn register(BrowserSession(store): BrowserSession, Form(form): Form<RegisterForm>) -> Response {
    if let Err(errors) = form.check() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(register_page(&form, &FormErrors::from(&errors), None)),
        )
            .into_response();
    }

    let result = store
        .register(
            &form.email,
            &form.password,
            &form.company_name,
            &form.address,
            &form.phone,
        )
        .await;

    match result {
        Ok(()) => Redirect::to("/login?registered=1").into_response(),
        Err(e) => {
            let banner = format!("Failed to create an account. {}", e.user_message());
            (
                e.status_code(),
                Html(register_page(&form, &FormErrors::new(), Some(&banner))),
            )
                .into_response()
        }
    }
}

/// La sesión local se limpia aunque falle el cierre remoto
async fn logout(BrowserSession(store): BrowserSession) -> Redirect {
    if let Err(e) = store.logout().await {
        warn!("⚠️ Logout remoto fallido, sesión local limpiada: {}", e);
    }
    Redirect::to("/login")
}

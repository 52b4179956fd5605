//! Rutas de la aplicación
//!
//! Cada área tiene su propio router; `create_router` los une, aplica los
//! guards y envuelve todo con las capas de sesión, conectividad y HTTP.
//! El 404 y `/health` quedan fuera de la capa de sesión.

pub mod auth_routes;
pub mod company_routes;
pub mod dashboard_routes;
pub mod scan_routes;
pub mod truck_routes;

use std::any::Any;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::middleware::{
    connectivity_gate, cors_middleware_with_origins, require_anonymous, require_user,
    session_middleware,
};
use crate::services::SessionSnapshot;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::FormErrors;
use crate::views::{components::no_company_banner, errors, layout::page};

/// Router completo de la aplicación
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(dashboard_routes::create_dashboard_router())
        .merge(auth_routes::create_logout_router())
        .nest("/trucks", truck_routes::create_truck_router())
        .merge(scan_routes::create_scan_router())
        .merge(company_routes::create_company_router())
        .route_layer(from_fn(require_user));

    let public = auth_routes::create_auth_router().route_layer(from_fn(require_anonymous));

    let mut app = Router::new()
        .merge(protected)
        .merge(public)
        .route_layer(from_fn_with_state(state.clone(), session_middleware))
        .route_layer(from_fn_with_state(state.clone(), connectivity_gate))
        .fallback(not_found)
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    if !state.config.cors_origins.is_empty() {
        app = app.layer(cors_middleware_with_origins(&state.config.cors_origins));
    }

    app.with_state(state)
}

/// Estado del servicio, sin sesión ni guards
async fn health(State(state): State<AppState>) -> Json<Value> {
    let connectivity = state.connectivity.status().await;
    let status = if connectivity.connected { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "backend": state.sessions.backend_name(),
        "environment": state.config.environment,
        "connectivity": connectivity,
        "sessions": state.sessions.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(errors::not_found_page())).into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("💥 Panic atendiendo la petición: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(errors::retry_page(
            "An unexpected error occurred. Please try again.",
        )),
    )
        .into_response()
}

/// Ids de ruta mal formados se tratan como recurso inexistente
pub(crate) fn parse_id(resource: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found_error(resource, raw))
}

/// Página para usuarios autenticados sin empresa asociada
pub(crate) fn no_company_page(session: &SessionSnapshot, title: &str, path: &str) -> Response {
    Html(page(title, Some(session), path, &no_company_banner())).into_response()
}

/// Envío de formulario fallido que se vuelve a pintar
pub(crate) struct FormFailure {
    pub status: StatusCode,
    pub errors: FormErrors,
    pub banner: Option<String>,
}

/// Errores de validación van a los campos, el resto al banner. Un recurso
/// inexistente no tiene formulario que pintar y se propaga.
pub(crate) fn form_failure(err: AppError, banner: &str) -> Result<FormFailure, AppError> {
    match err {
        AppError::Validation(errors) => Ok(FormFailure {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            errors: FormErrors::from(&errors),
            banner: None,
        }),
        err if err.status_code() == StatusCode::NOT_FOUND => Err(err),
        err => {
            warn!("⚠️ Envío de formulario fallido: {}", err);
            Ok(FormFailure {
                status: err.status_code(),
                errors: FormErrors::new(),
                banner: Some(banner.to_string()),
            })
        }
    }
}

/// URL absoluta de la ficha del camión, para el código QR
pub(crate) fn truck_url(headers: &HeaderMap, secure: bool, id: Uuid) -> String {
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!(
            "{}://{}/trucks/{}",
            if secure { "https" } else { "http" },
            host,
            id
        ),
        None => format!("/trucks/{}", id),
    }
}

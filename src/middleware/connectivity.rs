//! Corta las peticiones de página mientras el servicio remoto no responde

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::state::AppState;
use crate::views::errors::retry_page;

pub const CONNECTION_FAILED_MESSAGE: &str =
    "Could not connect to the data service. Please check your connection and try again.";

/// Si la última comprobación falló, se vuelve a comprobar una vez
pub async fn connectivity_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.connectivity.is_connected().await {
        let status = state.connectivity.check_connection().await;
        if !status.connected {
            warn!(
                "🚫 {} bloqueado: servicio remoto no disponible",
                request.uri().path()
            );
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(retry_page(CONNECTION_FAILED_MESSAGE)),
            )
                .into_response();
        }
    }
    next.run(request).await
}

//! Sistema de manejo de errores
//!
//! Este módulo define los errores de la aplicación y su conversión a
//! páginas HTML con el código de estado apropiado.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::clients::RemoteError;
use crate::views;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Mensaje sin prefijo, para banners en formularios
    pub fn user_message(&self) -> String {
        match self {
            AppError::Remote(e) => e.to_string(),
            AppError::Validation(_) => "The provided data is invalid".to_string(),
            AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Remote(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Remote(RemoteError::Auth(_)) => StatusCode::UNAUTHORIZED,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("❌ {}", self);
        } else {
            warn!("⚠️ {}", self);
        }

        let body = if status == StatusCode::NOT_FOUND {
            views::errors::not_found_page()
        } else {
            views::errors::error_page(status, &self.user_message())
        };

        (status, Html(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, crate::utils::validation::field_error("custom", message));
    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

//! Modelos de autenticación
//!
//! Sesión del servicio remoto de auth, eventos de cambio de sesión y los
//! formularios de login / registro.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::utils::validation::{
    field_error, required_text, validate_phone, validate_required_email,
};

/// Usuario autenticado tal como lo devuelve el servicio de auth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sesión del servicio remoto. Se refleja, nunca se modifica localmente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Timestamp UNIX (segundos) de expiración del access token
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map_or(false, |expires_at| now.timestamp() >= expires_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Notificación de cambio de sesión
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<AuthSession>,
}

impl AuthEvent {
    pub fn signed_in(session: AuthSession) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: AuthSession) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }
}

/// Resultado de un sign-up: el usuario puede venir sin sesión si el servicio
/// exige confirmar el email.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignUpOutcome {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
}

/// Formulario de login
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(custom = "validate_required_email")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn validate_company_name(value: &str) -> Result<(), ValidationError> {
    required_text(value, 2, "Company name must be at least 2 characters")
}

fn validate_address(value: &str) -> Result<(), ValidationError> {
    required_text(value, 5, "Address must be at least 5 characters")
}

/// Formulario de registro de empresa
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(custom = "validate_company_name")]
    pub company_name: String,

    #[validate(custom = "validate_address")]
    pub address: String,

    #[validate(custom = "validate_phone")]
    pub phone: String,

    #[validate(custom = "validate_required_email")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub confirm_password: String,
}

impl RegisterForm {
    /// Validación de campos + confirmación de contraseña
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.confirm_password.is_empty() {
            errors.add(
                "confirm_password",
                field_error("required", "Confirm password is required"),
            );
        } else if self.confirm_password != self.password {
            errors.add(
                "confirm_password",
                field_error("must_match", "Passwords must match"),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

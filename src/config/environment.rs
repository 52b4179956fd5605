//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Las variables se cargan con `dotenvy` en `main` antes de llamar a `from_env`.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::services::session_store::DEFAULT_INIT_TIMEOUT_MS;

const DEFAULT_IDLE_TTL_SECS: u64 = 86_400;
const DEFAULT_ANONYMOUS_TTL_SECS: u64 = 900;
const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Errores de configuración (fatales al arrancar)
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Backend remoto de auth + datos
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Supabase { url: String, anon_key: String },
    Memory,
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Supabase { .. } => "supabase",
            BackendConfig::Memory => "memory",
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub backend: BackendConfig,
    pub session_init_timeout: Duration,
    pub session_idle_ttl: Duration,
    /// TTL de los stores sin usuario autenticado
    pub session_anonymous_ttl: Duration,
    pub max_sessions: usize,
    pub cors_origins: Vec<String>,
}

impl Default for EnvironmentConfig {
    /// Configuración de desarrollo con backend en memoria
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            log_level: "debug".to_string(),
            backend: BackendConfig::Memory,
            session_init_timeout: Duration::from_millis(DEFAULT_INIT_TIMEOUT_MS),
            session_idle_ttl: Duration::from_secs(DEFAULT_IDLE_TTL_SECS),
            session_anonymous_ttl: Duration::from_secs(DEFAULT_ANONYMOUS_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            cors_origins: Vec::new(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración de las variables de entorno del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Leer la configuración de una fuente arbitraria (tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match var("BACKEND").as_deref().map(str::trim) {
            None | Some("supabase") => BackendConfig::Supabase {
                url: var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: var("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            },
            Some("memory") => BackendConfig::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or("PORT", var("PORT"), defaults.port)?,
            host: var("HOST").unwrap_or(defaults.host),
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            backend,
            session_init_timeout: Duration::from_millis(parse_or(
                "SESSION_INIT_TIMEOUT_MS",
                var("SESSION_INIT_TIMEOUT_MS"),
                DEFAULT_INIT_TIMEOUT_MS,
            )?),
            session_idle_ttl: Duration::from_secs(parse_or(
                "SESSION_IDLE_TTL_SECS",
                var("SESSION_IDLE_TTL_SECS"),
                DEFAULT_IDLE_TTL_SECS,
            )?),
            session_anonymous_ttl: Duration::from_secs(parse_or(
                "SESSION_ANONYMOUS_TTL_SECS",
                var("SESSION_ANONYMOUS_TTL_SECS"),
                DEFAULT_ANONYMOUS_TTL_SECS,
            )?),
            max_sessions: parse_or("MAX_SESSIONS", var("MAX_SESSIONS"), DEFAULT_MAX_SESSIONS)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

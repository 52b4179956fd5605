//! Middleware del sistema
//!
//! Este módulo contiene el middleware de sesión de navegador, los guards de
//! rutas, la comprobación de conectividad y CORS.

pub mod connectivity;
pub mod cors;
pub mod guards;
pub mod session;

pub use connectivity::connectivity_gate;
pub use cors::*;
pub use guards::{decide, require_anonymous, require_user, CurrentSession, GuardDecision, GuardKind};
pub use session::{session_middleware, BrowserSession, SessionId, SESSION_COOKIE};

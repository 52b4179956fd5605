//! Services module
//!
//! Este módulo contiene la lógica de sesión y los servicios de la aplicación:
//! el store de sesión por navegador, su registro y la comprobación de
//! conectividad con el servicio remoto.

pub mod connectivity;
pub mod session_registry;
pub mod session_store;

pub use connectivity::{ConnectivityMonitor, ConnectivityStatus};
pub use session_registry::{SessionLimits, SessionRegistry};
pub use session_store::{
    SessionPhase, SessionSettings, SessionSnapshot, SessionStatus, SessionStore,
};

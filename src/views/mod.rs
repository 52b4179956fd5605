//! Vistas HTML renderizadas en el servidor
//!
//! Cada módulo expone funciones puras `fn(...) -> String`; los handlers las
//! envuelven en `axum::response::Html`. Todo texto de usuario pasa por
//! `utils::html::escape`.

pub mod auth;
pub mod company;
pub mod components;
pub mod dashboard;
pub mod errors;
pub mod layout;
pub mod maintenance;
pub mod qr;
pub mod scan;
pub mod trucks;

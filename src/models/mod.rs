//! Modelos del sistema
//!
//! Este módulo contiene los modelos que mapean a las tablas remotas
//! (`companies`, `trucks`, `maintenance_records`), la sesión de auth y los
//! formularios HTML con sus reglas de validación.

pub mod auth;
pub mod company;
pub mod maintenance;
pub mod truck;

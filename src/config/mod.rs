//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno y la selección del backend
//! remoto (Supabase o en memoria).

pub mod environment;

pub use environment::*;

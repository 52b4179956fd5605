//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación de
//! formularios y escapado HTML.

pub mod errors;
pub mod html;
pub mod validation;

//! Engine Armour - mantenimiento de flotas
//!
//! Aplicación web renderizada en servidor para gestionar camiones, sus
//! registros de mantenimiento y los datos de la empresa. Los datos viven en
//! Supabase (o en un backend en memoria para desarrollo y tests).

pub mod clients;
pub mod config;
pub mod controllers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod views;

pub use routes::create_router;
pub use state::AppState;

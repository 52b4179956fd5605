//! Controladores
//!
//! Lógica de cada página: validan formularios, aplican el alcance por
//! empresa y delegan en los repositorios.

pub mod company_controller;
pub mod dashboard_controller;
pub mod maintenance_controller;
pub mod truck_controller;

pub use company_controller::CompanyController;
pub use dashboard_controller::{DashboardController, DashboardSummary};
pub use maintenance_controller::MaintenanceController;
pub use truck_controller::{TruckController, TruckDetail};

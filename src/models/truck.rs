//! Modelo de Truck
//!
//! Camiones de la flota. Siempre pertenecen a una empresa y se consultan
//! filtrando por `company_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation::{
    optional_text, parse_mileage, required_text, validate_license_plate, validate_mileage,
    validate_vin, validate_year,
};

/// Truck principal - mapea a la tabla `trucks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: Uuid,
    pub company_id: Uuid,
    pub vin: String,
    pub license_plate: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub current_mileage: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Truck {
    /// "Freightliner Cascadia (2019)"
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.year)
    }

    /// Búsqueda sin distinguir mayúsculas en marca, modelo, VIN y matrícula
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.make, &self.model, &self.vin, &self.license_plate]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Campos editables de un camión, ya validados y tipados
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckFields {
    pub vin: String,
    pub license_plate: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub current_mileage: i64,
    pub notes: Option<String>,
}

/// Fila a insertar en `trucks`
#[derive(Debug, Clone, Serialize)]
pub struct NewTruck {
    pub company_id: Uuid,
    #[serde(flatten)]
    pub fields: TruckFields,
}

fn validate_make(value: &str) -> Result<(), ValidationError> {
    required_text(value, 1, "Make is required")
}

fn validate_model(value: &str) -> Result<(), ValidationError> {
    required_text(value, 1, "Model is required")
}

/// Formulario de alta / edición de camión (los navegadores envían todo como texto)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct TruckForm {
    #[validate(custom = "validate_vin")]
    pub vin: String,

    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,

    #[validate(custom = "validate_year")]
    pub year: String,

    #[validate(custom = "validate_make")]
    pub make: String,

    #[validate(custom = "validate_model")]
    pub model: String,

    #[validate(custom = "validate_mileage")]
    pub current_mileage: String,

    pub notes: String,
}

impl TruckForm {
    pub fn from_truck(truck: &Truck) -> Self {
        Self {
            vin: truck.vin.clone(),
            license_plate: truck.license_plate.clone(),
            year: truck.year.to_string(),
            make: truck.make.clone(),
            model: truck.model.clone(),
            current_mileage: truck.current_mileage.to_string(),
            notes: truck.notes.clone().unwrap_or_default(),
        }
    }

    /// Validar y convertir a campos tipados
    pub fn to_fields(&self) -> Result<TruckFields, AppError> {
        self.validate()?;

        let year = self
            .year
            .trim()
            .parse()
            .map_err(|_| validation_error("year", "Year is required"))?;
        let current_mileage = parse_mileage(&self.current_mileage)
            .map_err(|_| validation_error("current_mileage", "Mileage cannot be negative"))?;

        Ok(TruckFields {
            vin: self.vin.trim().to_uppercase(),
            license_plate: self.license_plate.trim().to_uppercase(),
            year,
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            current_mileage,
            notes: optional_text(&self.notes),
        })
    }
}

//! Modelo de MaintenanceRecord
//!
//! Registros de mantenimiento de un camión. Al crear uno con kilometraje
//! superior al del camión, el camión se actualiza.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::truck::Truck;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation::{
    optional_text, parse_mileage, required_text, validate_date, validate_mileage,
    validate_optional_mileage, validate_past_date,
};

/// Tipos ofrecidos en el formulario
pub const MAINTENANCE_TYPES: &[&str] = &[
    "Oil Change",
    "Tire Rotation",
    "Brake Service",
    "Air Filter",
    "Fuel Filter",
    "Transmission Service",
    "Coolant Flush",
    "Battery Replacement",
    "Wiper Blades",
    "Lights",
    "Other",
];

/// MaintenanceRecord - mapea a la tabla `maintenance_records`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub truck_id: Uuid,
    pub maintenance_type: String,
    pub performed_at: DateTime<Utc>,
    pub mileage: i64,
    #[serde(default)]
    pub next_due_mileage: Option<i64>,
    #[serde(default)]
    pub part_make_model: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl MaintenanceRecord {
    /// Vencido cuando el camión alcanzó el kilometraje del próximo servicio
    pub fn is_overdue(&self, current_mileage: i64) -> bool {
        self.next_due_mileage
            .map_or(false, |next_due| current_mileage >= next_due)
    }
}

/// Fila a insertar en `maintenance_records`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMaintenanceRecord {
    pub company_id: Uuid,
    pub truck_id: Uuid,
    pub maintenance_type: String,
    pub performed_at: DateTime<Utc>,
    pub mileage: i64,
    pub next_due_mileage: Option<i64>,
    pub part_make_model: Option<String>,
    pub notes: Option<String>,
}

fn validate_maintenance_type(value: &str) -> Result<(), ValidationError> {
    required_text(value, 1, "Maintenance type is required")
}

/// Formulario de nuevo registro de mantenimiento
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct MaintenanceForm {
    #[validate(custom = "validate_maintenance_type")]
    pub maintenance_type: String,

    #[validate(custom = "validate_past_date")]
    pub performed_at: String,

    #[validate(custom = "validate_mileage")]
    pub mileage: String,

    #[validate(custom = "validate_optional_mileage")]
    pub next_due_mileage: String,

    pub part_make_model: String,

    pub notes: String,
}

impl MaintenanceForm {
    /// Valores iniciales: fecha de hoy y el kilometraje actual del camión
    pub fn for_truck(truck: &Truck) -> Self {
        Self {
            performed_at: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            mileage: truck.current_mileage.to_string(),
            ..Self::default()
        }
    }

    pub fn to_record(&self, company_id: Uuid, truck_id: Uuid) -> Result<NewMaintenanceRecord, AppError> {
        self.validate()?;

        let date = validate_date(&self.performed_at)
            .map_err(|_| validation_error("performed_at", "Date is required"))?;
        let mileage = parse_mileage(&self.mileage)
            .map_err(|_| validation_error("mileage", "Mileage cannot be negative"))?;
        let next_due_mileage = match self.next_due_mileage.trim() {
            "" => None,
            value => Some(parse_mileage(value).map_err(|_| {
                validation_error("next_due_mileage", "Next due mileage cannot be negative")
            })?),
        };

        Ok(NewMaintenanceRecord {
            company_id,
            truck_id,
            maintenance_type: self.maintenance_type.trim().to_string(),
            performed_at: date.and_time(NaiveTime::MIN).and_utc(),
            mileage,
            next_due_mileage,
            part_make_model: optional_text(&self.part_make_model),
            notes: optional_text(&self.notes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> MaintenanceForm {
        MaintenanceForm {
            maintenance_type: "Oil Change".to_string(),
            performed_at: "2024-03-01".to_string(),
            mileage: "125000".to_string(),
            next_due_mileage: "135000".to_string(),
            part_make_model: "Mobil Delvac 15W-40".to_string(),
            notes: "".to_string(),
        }
    }

    #[test]
    fn test_to_record() {
        let company_id = Uuid::new_v4();
        let truck_id = Uuid::new_v4();
        let record = sample_form().to_record(company_id, truck_id).unwrap();

        assert_eq!(record.company_id, company_id);
        assert_eq!(record.truck_id, truck_id);
        assert_eq!(record.mileage, 125_000);
        assert_eq!(record.next_due_mileage, Some(135_000));
        assert_eq!(record.performed_at.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_blank_next_due_is_none() {
        let form = MaintenanceForm {
            next_due_mileage: " ".to_string(),
            ..sample_form()
        };
        let record = form.to_record(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(record.next_due_mileage, None);
    }

    #[test]
    fn test_missing_type_and_mileage() {
        let form = MaintenanceForm {
            maintenance_type: "".to_string(),
            mileage: "".to_string(),
            ..sample_form()
        };
        match form.to_record(Uuid::new_v4(), Uuid::new_v4()) {
            Err(AppError::Validation(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("maintenance_type"));
                assert!(fields.contains_key("mileage"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_type_is_rejected() {
        let form = MaintenanceForm {
            maintenance_type: "   ".to_string(),
            ..sample_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["maintenance_type"][0].message.as_deref(),
            Some("Maintenance type is required")
        );
    }

    #[test]
    fn test_overdue() {
        let record = MaintenanceRecord {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            truck_id: Uuid::new_v4(),
            maintenance_type: "Oil Change".to_string(),
            performed_at: Utc::now(),
            mileage: 100,
            next_due_mileage: Some(200),
            part_make_model: None,
            notes: None,
            created_at: None,
        };
        assert!(!record.is_overdue(199));
        assert!(record.is_overdue(200));
    }
}

//! Utilidades de validación
//!
//! Validadores custom para los formularios (VIN, kilometraje, fechas, email)
//! y la conversión de `ValidationErrors` a mensajes por campo.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::{ValidationError, ValidationErrors};

lazy_static! {
    // 17 caracteres, sin I, O ni Q
    static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9()\-.\s]+$").unwrap();
}

pub const MIN_TRUCK_YEAR: i32 = 1900;
pub const MAX_LICENSE_PLATE_LEN: usize = 15;

/// Crear un `ValidationError` con mensaje legible
pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        let mut error = field_error("date", "Date must use the YYYY-MM-DD format");
        error.add_param("value".into(), &value.to_string());
        error
    })
}

/// Fecha obligatoria que no puede estar en el futuro
pub fn validate_past_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("required", "Date is required"));
    }
    let date = validate_date(value)?;
    if date > Utc::now().date_naive() {
        return Err(field_error("future_date", "Date cannot be in the future"));
    }
    Ok(())
}

/// Texto obligatorio; los espacios exteriores no cuentan para `min_chars`
pub fn required_text(value: &str, min_chars: usize, message: &'static str) -> Result<(), ValidationError> {
    match value.trim().chars().count() {
        0 => Err(field_error("required", message)),
        len if len < min_chars => Err(field_error("length", message)),
        _ => Ok(()),
    }
}

/// Email obligatorio
pub fn validate_required_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("required", "Email is required"));
    }
    validate_optional_email(value)
}

/// Email opcional: vacío es válido
pub fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || validator::validate_email(value) {
        Ok(())
    } else {
        Err(field_error("email", "Invalid email address"))
    }
}

/// Teléfono con al menos 10 dígitos; se permiten espacios, guiones y paréntesis
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let phone = value.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !PHONE_REGEX.is_match(phone) || digits < 10 {
        return Err(field_error("phone", "Phone number must be at least 10 digits"));
    }
    Ok(())
}

pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    let vin = value.trim().to_uppercase();
    if vin.is_empty() {
        return Err(field_error("required", "VIN is required"));
    }
    if !VIN_REGEX.is_match(&vin) {
        return Err(field_error(
            "vin",
            "VIN must be 17 characters (letters and digits, no I, O or Q)",
        ));
    }
    Ok(())
}

pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    let plate = value.trim();
    if plate.is_empty() {
        return Err(field_error("required", "License plate is required"));
    }
    if plate.chars().count() > MAX_LICENSE_PLATE_LEN {
        return Err(field_error(
            "length",
            format!("License plate must be at most {} characters", MAX_LICENSE_PLATE_LEN),
        ));
    }
    Ok(())
}

pub fn validate_year(value: &str) -> Result<(), ValidationError> {
    let max_year = Utc::now().year() + 1;
    let year: i32 = value
        .trim()
        .parse()
        .map_err(|_| field_error("number", "Year is required"))?;
    if !(MIN_TRUCK_YEAR..=max_year).contains(&year) {
        return Err(field_error(
            "range",
            format!("Year must be between {} and {}", MIN_TRUCK_YEAR, max_year),
        ));
    }
    Ok(())
}

/// Kilometraje obligatorio, entero no negativo
pub fn validate_mileage(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("required", "Mileage is required"));
    }
    parse_mileage(value).map(|_| ())
}

/// Kilometraje opcional (próximo servicio)
pub fn validate_optional_mileage(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    parse_mileage(value)
        .map(|_| ())
        .map_err(|_| field_error("range", "Next due mileage cannot be negative"))
}

pub fn parse_mileage(value: &str) -> Result<i64, ValidationError> {
    let mileage: i64 = value
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| field_error("number", "Mileage must be a whole number"))?;
    if mileage < 0 {
        return Err(field_error("range", "Mileage cannot be negative"));
    }
    Ok(mileage)
}

/// Campo de texto opcional: vacío se guarda como `None`
pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Mensajes de error por campo, listos para pintar en el formulario
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    fields: HashMap<String, String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.fields.insert(field.to_string(), message.to_string());
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errors)| {
                errors.first().map(|error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field.replace('_', " ")));
                    (field.to_string(), message)
                })
            })
            .collect();
        Self { fields }
    }
}

//! Modelo de Company
//!
//! La empresa es el tenant: todos los camiones y registros de mantenimiento
//! se filtran por su `id`. Relación uno a uno con el usuario de auth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::validation::{optional_text, required_text, validate_optional_email};

/// Company principal - mapea a la tabla `companies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub user_id: Uuid,
}

/// Fila a insertar durante el registro
#[derive(Debug, Clone, Serialize)]
pub struct NewCompany {
    pub name: String,
    pub user_id: Uuid,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// Cambios del perfil de empresa (campos vacíos se guardan como null)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyPatch {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn validate_company_name(value: &str) -> Result<(), ValidationError> {
    required_text(value, 1, "Company name is required")
}

/// Formulario del perfil de empresa
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CompanyForm {
    #[validate(custom = "validate_company_name")]
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    #[validate(custom = "validate_optional_email")]
    pub email: String,
}

impl CompanyForm {
    pub fn from_company(company: &Company) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            name: company.name.clone(),
            address: text(&company.address),
            city: text(&company.city),
            state: text(&company.state),
            zip: text(&company.zip),
            phone: text(&company.phone),
            email: text(&company.email),
        }
    }

    pub fn to_patch(&self) -> CompanyPatch {
        CompanyPatch {
            name: self.name.trim().to_string(),
            address: optional_text(&self.address),
            city: optional_text(&self.city),
            state: optional_text(&self.state),
            zip: optional_text(&self.zip),
            phone: optional_text(&self.phone),
            email: optional_text(&self.email),
        }
    }
}

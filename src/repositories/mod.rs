pub mod company_repository;
pub mod maintenance_repository;
pub mod truck_repository;

pub use company_repository::CompanyRepository;
pub use maintenance_repository::MaintenanceRepository;
pub use truck_repository::TruckRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::RemoteError;

/// Convertir filas JSON del servicio remoto a modelos tipados
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, RemoteError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(RemoteError::from))
        .collect()
}

pub(crate) fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, RemoteError> {
    Ok(serde_json::from_value(row)?)
}

/// Primera fila devuelta por un insert/update con `return=representation`
pub(crate) fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<T, RemoteError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::NotSingle(0))?;
    decode_row(row)
}

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::clients::RemoteClient;
use crate::models::maintenance::{MaintenanceForm, MaintenanceRecord};
use crate::models::truck::Truck;
use crate::repositories::{MaintenanceRepository, TruckRepository};
use crate::utils::errors::{not_found_error, AppError};

pub struct MaintenanceController {
    trucks: TruckRepository,
    records: MaintenanceRepository,
}

impl MaintenanceController {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            trucks: TruckRepository::new(Arc::clone(&client)),
            records: MaintenanceRepository::new(client),
        }
    }

    /// Camión al que se le añade el registro (404 si no es de la empresa)
    pub async fn truck(&self, truck_id: Uuid, company_id: Uuid) -> Result<Truck, AppError> {
        self.trucks
            .find_by_id(truck_id, company_id)
            .await?
            .ok_or_else(|| not_found_error("Truck", &truck_id.to_string()))
    }

    /// Inserta el registro y sube el kilometraje del camión si el nuevo es mayor
    pub async fn add_record(
        &self,
        truck_id: Uuid,
        company_id: Uuid,
        form: &MaintenanceForm,
    ) -> Result<MaintenanceRecord, AppError> {
        let truck = self.truck(truck_id, company_id).await?;
        let new_record = form.to_record(company_id, truck.id)?;

        let record = self.records.create(&new_record).await?;
        info!(
            "🔧 Registro {} ({}) añadido al camión {}",
            record.id, record.maintenance_type, truck.id
        );

        if record.mileage > truck.current_mileage {
            self.trucks
                .update_mileage(truck.id, company_id, record.mileage)
                .await?;
            info!(
                "📈 Kilometraje del camión {} actualizado: {} -> {}",
                truck.id, truck.current_mileage, record.mileage
            );
        }
        Ok(record)
    }
}

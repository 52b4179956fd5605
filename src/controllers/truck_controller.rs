use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::clients::RemoteClient;
use crate::models::maintenance::MaintenanceRecord;
use crate::models::truck::{Truck, TruckForm};
use crate::repositories::{MaintenanceRepository, TruckRepository};
use crate::utils::errors::{not_found_error, AppError};

/// Camión con su historial de mantenimiento
#[derive(Debug, Clone)]
pub struct TruckDetail {
    pub truck: Truck,
    pub records: Vec<MaintenanceRecord>,
}

impl TruckDetail {
    pub fn overdue_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.is_overdue(self.truck.current_mileage))
            .count()
    }
}

pub struct TruckController {
    trucks: TruckRepository,
    records: MaintenanceRepository,
}

impl TruckController {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            trucks: TruckRepository::new(Arc::clone(&client)),
            records: MaintenanceRepository::new(client),
        }
    }

    /// Camiones de la empresa, filtrados por `search` si no está vacío
    pub async fn list(&self, company_id: Uuid, search: Option<&str>) -> Result<Vec<Truck>, AppError> {
        let trucks = self.trucks.list_by_company(company_id).await?;
        Ok(match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => trucks.into_iter().filter(|t| t.matches_search(term)).collect(),
            None => trucks,
        })
    }

    pub async fn get(&self, id: Uuid, company_id: Uuid) -> Result<Truck, AppError> {
        self.trucks
            .find_by_id(id, company_id)
            .await?
            .ok_or_else(|| not_found_error("Truck", &id.to_string()))
    }

    pub async fn detail(&self, id: Uuid, company_id: Uuid) -> Result<TruckDetail, AppError> {
        let truck = self.get(id, company_id).await?;
        let records = self.records.list_by_truck(id, company_id).await?;
        Ok(TruckDetail { truck, records })
    }

    pub async fn create(&self, company_id: Uuid, form: &TruckForm) -> Result<Truck, AppError> {
        let fields = form.to_fields()?;
        let truck = self.trucks.create(company_id, fields).await?;
        info!("🚛 Camión {} creado para empresa {}", truck.id, company_id);
        Ok(truck)
    }

    pub async fn update(&self, id: Uuid, company_id: Uuid, form: &TruckForm) -> Result<Truck, AppError> {
        let fields = form.to_fields()?;
        let truck = self
            .trucks
            .update(id, company_id, &fields)
            .await?
            .ok_or_else(|| not_found_error("Truck", &id.to_string()))?;
        info!("✏️ Camión {} actualizado", truck.id);
        Ok(truck)
    }

    pub async fn delete(&self, id: Uuid, company_id: Uuid) -> Result<(), AppError> {
        if !self.trucks.delete(id, company_id).await? {
            return Err(not_found_error("Truck", &id.to_string()));
        }
        info!("🗑️ Camión {} eliminado", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryBackend;

    fn form(vin: &str, make: &str) -> TruckForm {
        TruckForm {
            vin: vin.to_string(),
            license_plate: "ABC-1234".to_string(),
            year: "2019".to_string(),
            make: make.to_string(),
            model: "Cascadia".to_string(),
            current_mileage: "120000".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let backend = MemoryBackend::with_hash_cost(4);
        let controller = TruckController::new(Arc::new(backend.client()));
        let company = Uuid::new_v4();

        controller.create(company, &form("1FUJGLDR5CSBM1234", "Freightliner")).await.unwrap();
        controller.create(company, &form("4V4NC9EH5LN123456", "Volvo")).await.unwrap();

        assert_eq!(controller.list(company, None).await.unwrap().len(), 2);
        assert_eq!(controller.list(company, Some("  ")).await.unwrap().len(), 2);
        let found = controller.list(company, Some("volvo")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].make, "Volvo");
    }

    #[tokio::test]
    async fn test_other_company_gets_not_found() {
        let backend = MemoryBackend::with_hash_cost(4);
        let controller = TruckController::new(Arc::new(backend.client()));
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let truck = controller
            .create(owner, &form("1FUJGLDR5CSBM1234", "Freightliner"))
            .await
            .unwrap();

        assert!(matches!(controller.detail(truck.id, intruder).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            controller.update(truck.id, intruder, &form("1FUJGLDR5CSBM1234", "Mack")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(controller.delete(truck.id, intruder).await, Err(AppError::NotFound(_))));

        // Sigue intacto para su dueño
        let detail = controller.detail(truck.id, owner).await.unwrap();
        assert_eq!(detail.truck.make, "Freightliner");
        assert!(detail.records.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_is_validation_error() {
        let backend = MemoryBackend::with_hash_cost(4);
        let controller = TruckController::new(Arc::new(backend.client()));
        let result = controller.create(Uuid::new_v4(), &form("BAD", "")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backend.rows("trucks").await.is_empty());
    }
}

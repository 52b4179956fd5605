use std::sync::Arc;

use uuid::Uuid;

use super::{decode_rows, first_row};
use crate::clients::{RemoteClient, RemoteError, SortOrder, TableQuery};
use crate::models::maintenance::{MaintenanceRecord, NewMaintenanceRecord};

const TABLE: &str = "maintenance_records";

pub struct MaintenanceRepository {
    client: Arc<dyn RemoteClient>,
}

impl MaintenanceRepository {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Historial de un camión, el más reciente primero
    pub async fn list_by_truck(
        &self,
        truck_id: Uuid,
        company_id: Uuid,
    ) -> Result<Vec<MaintenanceRecord>, RemoteError> {
        let query = TableQuery::table(TABLE)
            .eq("truck_id", truck_id)
            .eq("company_id", company_id)
            .order("performed_at", SortOrder::Desc);
        decode_rows(self.client.select(&query).await?)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<MaintenanceRecord>, RemoteError> {
        let query = TableQuery::table(TABLE)
            .eq("company_id", company_id)
            .order("performed_at", SortOrder::Desc);
        decode_rows(self.client.select(&query).await?)
    }

    pub async fn create(&self, record: &NewMaintenanceRecord) -> Result<MaintenanceRecord, RemoteError> {
        let rows = self
            .client
            .insert(TABLE, vec![serde_json::to_value(record)?])
            .await?;
        first_row(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryBackend;
    use chrono::{TimeZone, Utc};

    fn record(company_id: Uuid, truck_id: Uuid, day: u32) -> NewMaintenanceRecord {
        NewMaintenanceRecord {
            company_id,
            truck_id,
            maintenance_type: "Oil Change".to_string(),
            performed_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            mileage: 100_000 + i64::from(day),
            next_due_mileage: None,
            part_make_model: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_records_are_scoped_and_ordered() {
        let backend = MemoryBackend::with_hash_cost(4);
        let repository = MaintenanceRepository::new(Arc::new(backend.client()));
        let company = Uuid::new_v4();
        let truck = Uuid::new_v4();

        repository.create(&record(company, truck, 1)).await.unwrap();
        repository.create(&record(company, truck, 15)).await.unwrap();
        repository
            .create(&record(Uuid::new_v4(), truck, 20))
            .await
            .unwrap();

        let records = repository.list_by_truck(truck, company).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mileage, 100_015);
        assert_eq!(repository.list_by_company(company).await.unwrap().len(), 2);
    }
}

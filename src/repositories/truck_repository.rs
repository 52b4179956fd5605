use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::{decode_row, decode_rows, first_row};
use crate::clients::{Filter, RemoteClient, RemoteError, SortOrder, TableQuery};
use crate::models::truck::{NewTruck, Truck, TruckFields};

const TABLE: &str = "trucks";

/// Acceso a `trucks`. Toda operación se filtra por `company_id`.
pub struct TruckRepository {
    client: Arc<dyn RemoteClient>,
}

impl TruckRepository {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    fn scope(id: Uuid, company_id: Uuid) -> [Filter; 2] {
        [Filter::eq("id", id), Filter::eq("company_id", company_id)]
    }

    /// Camiones de la empresa, los más recientes primero
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Truck>, RemoteError> {
        let query = TableQuery::table(TABLE)
            .eq("company_id", company_id)
            .order("created_at", SortOrder::Desc);
        decode_rows(self.client.select(&query).await?)
    }

    pub async fn find_by_id(&self, id: Uuid, company_id: Uuid) -> Result<Option<Truck>, RemoteError> {
        let query = TableQuery::table(TABLE)
            .eq("id", id)
            .eq("company_id", company_id);
        match self.client.select_single(&query).await {
            Ok(row) => Ok(Some(decode_row(row)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(&self, company_id: Uuid, fields: TruckFields) -> Result<Truck, RemoteError> {
        let row = serde_json::to_value(NewTruck { company_id, fields })?;
        first_row(self.client.insert(TABLE, vec![row]).await?)
    }

    /// `Ok(None)` si el camión no existe dentro de la empresa
    pub async fn update(
        &self,
        id: Uuid,
        company_id: Uuid,
        fields: &TruckFields,
    ) -> Result<Option<Truck>, RemoteError> {
        let rows = self
            .client
            .update(TABLE, json!(fields), &Self::scope(id, company_id))
            .await?;
        rows.into_iter().next().map(decode_row).transpose()
    }

    pub async fn update_mileage(
        &self,
        id: Uuid,
        company_id: Uuid,
        mileage: i64,
    ) -> Result<(), RemoteError> {
        self.client
            .update(
                TABLE,
                json!({ "current_mileage": mileage }),
                &Self::scope(id, company_id),
            )
            .await?;
        Ok(())
    }

    /// Devuelve `false` si no se borró ninguna fila
    pub async fn delete(&self, id: Uuid, company_id: Uuid) -> Result<bool, RemoteError> {
        let removed = self
            .client
            .delete(TABLE, &Self::scope(id, company_id))
            .await?;
        Ok(!removed.is_empty())
    }
}

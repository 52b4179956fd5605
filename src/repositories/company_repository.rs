use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{decode_row, first_row};
use crate::clients::{Filter, RemoteClient, RemoteError, TableQuery};
use crate::models::company::{Company, CompanyPatch, NewCompany};

const TABLE: &str = "companies";

pub struct CompanyRepository {
    client: Arc<dyn RemoteClient>,
}

impl CompanyRepository {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Empresa del usuario. `Ok(None)` si todavía no tiene fila.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Company>, RemoteError> {
        let query = TableQuery::table(TABLE).eq("user_id", user_id);
        match self.client.select_single(&query).await {
            Ok(row) => Ok(Some(decode_row(row)?)),
            Err(e) if e.is_not_found() => {
                debug!("🏢 Usuario {} sin empresa todavía", user_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// ¿Existe ya una empresa con este email?
    pub async fn email_taken(&self, email: &str) -> Result<bool, RemoteError> {
        let query = TableQuery::table(TABLE)
            .select("email")
            .eq("email", email)
            .limit(1);
        Ok(!self.client.select(&query).await?.is_empty())
    }

    pub async fn create(&self, company: &NewCompany) -> Result<Company, RemoteError> {
        let rows = self
            .client
            .insert(TABLE, vec![serde_json::to_value(company)?])
            .await?;
        first_row(rows)
    }

    pub async fn update(&self, company_id: Uuid, patch: &CompanyPatch) -> Result<Company, RemoteError> {
        let rows = self
            .client
            .update(
                TABLE,
                json!(patch),
                &[Filter::eq("id", company_id)],
            )
            .await?;
        first_row(rows)
    }
}

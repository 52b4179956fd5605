use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::clients::RemoteClient;
use crate::models::company::{Company, CompanyForm};
use crate::repositories::CompanyRepository;
use crate::utils::errors::AppError;

pub const COMPANY_UPDATED_MESSAGE: &str = "Company information updated successfully";

pub struct CompanyController {
    repository: CompanyRepository,
}

impl CompanyController {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            repository: CompanyRepository::new(client),
        }
    }

    /// Valida el formulario y actualiza la fila de la empresa
    pub async fn update_profile(&self, company_id: Uuid, form: &CompanyForm) -> Result<Company, AppError> {
        form.validate()?;
        let company = self.repository.update(company_id, &form.to_patch()).await?;
        info!("🏢 Perfil de empresa {} actualizado", company.id);
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryBackend;
    use crate::models::company::NewCompany;

    #[tokio::test]
    async fn test_update_profile() {
        let backend = MemoryBackend::with_hash_cost(4);
        let client: Arc<dyn RemoteClient> = Arc::new(backend.client());
        let company = CompanyRepository::new(Arc::clone(&client))
            .create(&NewCompany {
                name: "Acme Haulage".to_string(),
                user_id: Uuid::new_v4(),
                address: "12 Depot Road".to_string(),
                phone: "5551234567".to_string(),
                email: "ops@acme.test".to_string(),
            })
            .await
            .unwrap();

        let controller = CompanyController::new(client);
        let form = CompanyForm {
            name: "Acme Freight".to_string(),
            zip: "90210".to_string(),
            ..CompanyForm::from_company(&company)
        };
        let updated = controller.update_profile(company.id, &form).await.unwrap();
        assert_eq!(updated.name, "Acme Freight");
        assert_eq!(updated.zip.as_deref(), Some("90210"));
        assert_eq!(updated.address.as_deref(), Some("12 Depot Road"));

        let invalid = CompanyForm {
            name: String::new(),
            ..form
        };
        assert!(matches!(
            controller.update_profile(company.id, &invalid).await,
            Err(AppError::Validation(_))
        ));
    }
}

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};

use super::form_failure;
use crate::controllers::company_controller::COMPANY_UPDATED_MESSAGE;
use crate::controllers::CompanyController;
use crate::middleware::{BrowserSession, CurrentSession};
use crate::models::company::CompanyForm;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::FormErrors;
use crate::views::company::{company_page, CompanyPageState};

pub fn create_company_router() -> Router<AppState> {
    Router::new().route("/company", get(show_company).post(update_company))
}

async fn show_company(CurrentSession(session): CurrentSession) -> Html<String> {
    let form = session.company.as_ref().map(CompanyForm::from_company);
    Html(company_page(
        &session,
        CompanyPageState {
            form: form.as_ref(),
            errors: &FormErrors::new(),
            banner: None,
            success: None,
        },
    ))
}

async fn update_company(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Form(form): Form<CompanyForm>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(Html(company_page(
            &session,
            CompanyPageState {
                form: None,
                errors: &FormErrors::new(),
                banner: None,
                success: None,
            },
        ))
        .into_response());
    };

    let controller = CompanyController::new(store.client());
    match controller.update_profile(company_id, &form).await {
        Ok(company) => {
            store.set_company(company.clone());
            let session = store.snapshot();
            let form = CompanyForm::from_company(&company);
            Ok((
                StatusCode::OK,
                Html(company_page(
                    &session,
                    CompanyPageState {
                        form: Some(&form),
                        errors: &FormErrors::new(),
                        banner: None,
                        success: Some(COMPANY_UPDATED_MESSAGE),
                    },
                )),
            )
                .into_response())
        }
        Err(e) => {
            let failure = form_failure(e, "Failed to update company information. Please try again.")?;
            Ok((
                failure.status,
                Html(company_page(
                    &session,
                    CompanyPageState {
                        form: Some(&form),
                        errors: &failure.errors,
                        banner: failure.banner.as_deref(),
                        success: None,
                    },
                )),
            )
                .into_response())
        }
    }
}

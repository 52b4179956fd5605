use axum::{response::Html, routing::get, Router};

use crate::controllers::DashboardController;
use crate::middleware::{BrowserSession, CurrentSession};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::views::dashboard::dashboard_page;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

async fn dashboard(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    let company_id = match session.company_id() {
        Some(id) => id,
        None => return Ok(Html(dashboard_page(&session, None))),
    };

    let controller = DashboardController::new(store.client());
    let summary = controller.summary(company_id).await?;
    Ok(Html(dashboard_page(&session, Some(&summary))))
}

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use super::{form_failure, no_company_page, parse_id, truck_url};
use crate::controllers::{MaintenanceController, TruckController};
use crate::middleware::{BrowserSession, CurrentSession};
use crate::models::maintenance::MaintenanceForm;
use crate::models::truck::TruckForm;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::FormErrors;
use crate::views::{maintenance, trucks};

pub fn create_truck_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trucks))
        .route("/add", get(new_truck).post(create_truck))
        .route("/:id", get(truck_detail))
        .route("/:id/edit", get(edit_truck).post(update_truck))
        .route("/:id/delete", post(delete_truck))
        .route("/:id/maintenance", get(new_record).post(create_record))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn list_trucks(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Trucks", "/trucks"));
    };

    let controller = TruckController::new(store.client());
    let trucks = controller.list(company_id, Some(&query.q)).await?;
    Ok(Html(trucks::list_page(&session, &trucks, &query.q)).into_response())
}

async fn new_truck(CurrentSession(session): CurrentSession) -> Response {
    if session.company_id().is_none() {
        return no_company_page(&session, "Add truck", "/trucks");
    }
    Html(trucks::form_page(
        &session,
        None,
        &TruckForm::default(),
        &FormErrors::new(),
        None,
    ))
    .into_response()
}

async fn create_truck(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Form(form): Form<TruckForm>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Add truck", "/trucks"));
    };

    let controller = TruckController::new(store.client());
    match controller.create(company_id, &form).await {
        Ok(truck) => Ok(Redirect::to(&format!("/trucks/{}", truck.id)).into_response()),
        Err(e) => {
            let failure = form_failure(e, "Failed to save truck. Please try again.")?;
            Ok((
                failure.status,
                Html(trucks::form_page(
                    &session,
                    None,
                    &form,
                    &failure.errors,
                    failure.banner.as_deref(),
                )),
            )
                .into_response())
        }
    }
}

async fn truck_detail(
    State(state): State<AppState>,
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Truck", "/trucks"));
    };
    let id = parse_id("Truck", &id)?;

    let controller = TruckController::new(store.client());
    let detail = controller.detail(id, company_id).await?;
    let url = truck_url(&headers, state.config.is_production(), id);
    Ok(Html(trucks::detail_page(&session, &detail, &url)).into_response())
}

async fn edit_truck(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Edit truck", "/trucks"));
    };
    let id = parse_id("Truck", &id)?;

    let controller = TruckController::new(store.client());
    let truck = controller.get(id, company_id).await?;
    Ok(Html(trucks::form_page(
        &session,
        Some(truck.id),
        &TruckForm::from_truck(&truck),
        &FormErrors::new(),
        None,
    ))
    .into_response())
}

async fn update_truck(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Form(form): Form<TruckForm>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Edit truck", "/trucks"));
    };
    let id = parse_id("Truck", &id)?;

    let controller = TruckController::new(store.client());
    match controller.update(id, company_id, &form).await {
        Ok(truck) => Ok(Redirect::to(&format!("/trucks/{}", truck.id)).into_response()),
        Err(e) => {
            let failure = form_failure(e, "Failed to update truck. Please try again.")?;
            Ok((
                failure.status,
                Html(trucks::form_page(
                    &session,
                    Some(id),
                    &form,
                    &failure.errors,
                    failure.banner.as_deref(),
                )),
            )
                .into_response())
        }
    }
}

async fn delete_truck(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Trucks", "/trucks"));
    };
    let id = parse_id("Truck", &id)?;

    let controller = TruckController::new(store.client());
    controller.delete(id, company_id).await?;
    Ok(Redirect::to("/trucks").into_response())
}

async fn new_record(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Add maintenance", "/trucks"));
    };
    let id = parse_id("Truck", &id)?;

    let controller = MaintenanceController::new(store.client());
    let truck = controller.truck(id, company_id).await?;
    Ok(Html(maintenance::form_page(
        &session,
        &truck,
        &MaintenanceForm::for_truck(&truck),
        &FormErrors::new(),
        None,
    ))
    .into_response())
}

async fn create_record(
    BrowserSession(store): BrowserSession,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Form(form): Form<MaintenanceForm>,
) -> Result<Response, AppError> {
    let Some(company_id) = session.company_id() else {
        return Ok(no_company_page(&session, "Add maintenance", "/trucks"));
    };
    let id = parse_id("Truck", &id)?;

    let controller = MaintenanceController::new(store.client());
    match controller.add_record(id, company_id, &form).await {
        Ok(_) => Ok(Redirect::to(&format!("/trucks/{}", id)).into_response()),
        Err(e) => {
            let failure = form_failure(e, "Failed to add maintenance record. Please try again.")?;
            // El formulario necesita los datos del camión para volver a pintarse
            let truck = controller.truck(id, company_id).await?;
            Ok((
                failure.status,
                Html(maintenance::form_page(
                    &session,
                    &truck,
                    &form,
                    &failure.errors,
                    failure.banner.as_deref(),
                )),
            )
                .into_response())
        }
    }
}

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::CurrentSession;
use crate::state::AppState;
use crate::views::scan::{scan_page, INVALID_TRUCK_ID};

pub fn create_scan_router() -> Router<AppState> {
    Router::new().route("/scan", get(show_scan).post(submit_scan))
}

#[derive(Debug, Default, Deserialize)]
struct ScanForm {
    #[serde(default)]
    truck_id: String,
}

/// Acepta el id tal cual o la URL codificada en el QR (`.../trucks/<id>`)
pub fn parse_truck_reference(input: &str) -> Option<Uuid> {
    let input = input.trim();
    if let Ok(id) = Uuid::parse_str(input) {
        return Some(id);
    }
    let (_, rest) = input.rsplit_once("/trucks/")?;
    let segment = rest.split(['/', '?', '#']).next()?;
    Uuid::parse_str(segment).ok()
}

async fn show_scan(CurrentSession(session): CurrentSession) -> Html<String> {
    Html(scan_page(&session, "", None))
}

async fn submit_scan(CurrentSession(session): CurrentSession, Form(form): Form<ScanForm>) -> Response {
    match parse_truck_reference(&form.truck_id) {
        Some(id) => Redirect::to(&format!("/trucks/{}", id)).into_response(),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(scan_page(&session, &form.truck_id, Some(INVALID_TRUCK_ID))),
        )
            .into_response(),
    }
}

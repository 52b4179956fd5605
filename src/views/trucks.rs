//! Listado, detalle y formularios de camiones

use uuid::Uuid;

use super::components::{alert, optional_alert, textarea, AlertKind, Input};
use super::layout::page;
use super::qr::qr_block;
use crate::controllers::TruckDetail;
use crate::models::truck::{Truck, TruckForm};
use crate::services::SessionSnapshot;
use crate::utils::html::{escape, format_miles};
use crate::utils::validation::FormErrors;

pub fn list_page(session: &SessionSnapshot, trucks: &[Truck], search: &str) -> String {
    let content = if trucks.is_empty() && search.trim().is_empty() {
        r#"<div class="card" style="text-align:center"><p>No trucks yet.</p><a class="btn" href="/trucks/add">Add your first truck</a></div>"#.to_string()
    } else if trucks.is_empty() {
        format!(
            r#"<div class="card"><p class="muted">No trucks match "{}".</p></div>"#,
            escape(search)
        )
    } else {
        let rows: String = trucks
            .iter()
            .map(|truck| {
                format!(
                    r#"<tr><td><a href="/trucks/{id}">{label}</a></td><td>{plate}</td><td>{vin}</td><td>{miles}</td></tr>"#,
                    id = truck.id,
                    label = escape(&truck.label()),
                    plate = escape(&truck.license_plate),
                    vin = escape(&truck.vin),
                    miles = format_miles(truck.current_mileage),
                )
            })
            .collect();
        format!(
            r#"<div class="card"><table><thead><tr><th>Truck</th><th>License plate</th><th>VIN</th><th>Mileage</th></tr></thead><tbody>{}</tbody></table></div>"#,
            rows
        )
    };

    let body = format!(
        r#"<h1>Trucks</h1>
<form method="get" action="/trucks" style="display:flex;gap:.5rem;margin-bottom:1rem">
<input name="q" value="{search}" placeholder="Search by make, model, VIN or plate" style="flex:1;padding:.5rem">
<button class="btn btn-secondary" type="submit">Search</button>
<a class="btn" href="/trucks/add">Add truck</a>
</form>
{content}"#,
        search = escape(search),
        content = content,
    );
    page("Trucks", Some(session), "/trucks", &body)
}

pub fn detail_page(session: &SessionSnapshot, detail: &TruckDetail, detail_url: &str) -> String {
    let truck = &detail.truck;

    let history = if detail.records.is_empty() {
        r#"<p class="muted">No maintenance records yet.</p>"#.to_string()
    } else {
        let rows: String = detail
            .records
            .iter()
            .map(|record| {
                let overdue = if record.is_overdue(truck.current_mileage) {
                    r#" <span class="badge badge-overdue">Overdue</span>"#
                } else {
                    ""
                };
                format!(
                    "<tr><td>{date}</td><td>{kind}{overdue}</td><td>{miles}</td><td>{next}</td><td>{part}</td><td>{notes}</td></tr>",
                    date = record.performed_at.format("%Y-%m-%d"),
                    kind = escape(&record.maintenance_type),
                    overdue = overdue,
                    miles = format_miles(record.mileage),
                    next = record.next_due_mileage.map(format_miles).unwrap_or_else(|| "-".to_string()),
                    part = escape(record.part_make_model.as_deref().unwrap_or("-")),
                    notes = escape(record.notes.as_deref().unwrap_or("")),
                )
            })
            .collect();
        format!(
            "<table><thead><tr><th>Date</th><th>Type</th><th>Mileage</th><th>Next due</th><th>Part</th><th>Notes</th></tr></thead><tbody>{}</tbody></table>",
            rows
        )
    };

    let overdue_banner = match detail.overdue_count() {
        0 => String::new(),
        n => alert(
            AlertKind::Warning,
            &format!("{} maintenance item{} overdue", n, if n == 1 { " is" } else { "s are" }),
        ),
    };

    let body = format!(
        r#"<h1>{label}</h1>
{overdue_banner}
<div class="card" style="display:flex;justify-content:space-between;gap:1rem;flex-wrap:wrap">
<dl>
<dt class="muted">VIN</dt><dd>{vin}</dd>
<dt class="muted">License plate</dt><dd>{plate}</dd>
<dt class="muted">Current mileage</dt><dd>{miles}</dd>
<dt class="muted">Notes</dt><dd>{notes}</dd>
</dl>
{qr}
</div>
<p>
<a class="btn" href="/trucks/{id}/maintenance">Add maintenance record</a>
<a class="btn btn-secondary" href="/trucks/{id}/edit">Edit</a>
</p>
<form method="post" action="/trucks/{id}/delete" onsubmit="return confirm('Delete this truck?')"><button class="btn btn-danger" type="submit">Delete truck</button></form>
<div class="card"><h2>Maintenance history</h2>{history}</div>"#,
        label = escape(&truck.label()),
        overdue_banner = overdue_banner,
        vin = escape(&truck.vin),
        plate = escape(&truck.license_plate),
        miles = format_miles(truck.current_mileage),
        notes = escape(truck.notes.as_deref().unwrap_or("-")),
        qr = qr_block(detail_url),
        id = truck.id,
        history = history,
    );
    page(&truck.label(), Some(session), "/trucks", &body)
}

/// Formulario de alta (`truck_id = None`) o edición
pub fn form_page(
    session: &SessionSnapshot,
    truck_id: Option<Uuid>,
    form: &TruckForm,
    errors: &FormErrors,
    banner: Option<&str>,
) -> String {
    let (title, action, cancel) = match truck_id {
        Some(id) => (
            "Edit truck",
            format!("/trucks/{}/edit", id),
            format!("/trucks/{}", id),
        ),
        None => ("Add truck", "/trucks/add".to_string(), "/trucks".to_string()),
    };

    let body = format!(
        r#"<div class="card" style="max-width:40rem">
<h1>{title}</h1>
{banner}
<form method="post" action="{action}" novalidate>
{vin}{plate}{year}{make}{model}{mileage}{notes}
<button class="btn" type="submit">Save truck</button> <a class="btn btn-secondary" href="{cancel}">Cancel</a>
</form>
</div>"#,
        title = title,
        banner = optional_alert(AlertKind::Error, banner),
        action = action,
        vin = Input::text("VIN", "vin", &form.vin)
            .required()
            .placeholder("17 characters")
            .render(errors),
        plate = Input::text("License plate", "license_plate", &form.license_plate)
            .required()
            .render(errors),
        year = Input::text("Year", "year", &form.year)
            .kind("number")
            .required()
            .render(errors),
        make = Input::text("Make", "make", &form.make).required().render(errors),
        model = Input::text("Model", "model", &form.model).required().render(errors),
        mileage = Input::text("Current mileage", "current_mileage", &form.current_mileage)
            .kind("number")
            .required()
            .render(errors),
        notes = textarea("Notes", "notes", &form.notes, errors),
        cancel = cancel,
    );
    page(title, Some(session), "/trucks", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::maintenance::MaintenanceRecord;
    use chrono::Utc;

    fn truck() -> Truck {
        Truck {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            vin: "1FUJGLDR5CSBM1234".to_string(),
            license_plate: "ABC-1234".to_string(),
            year: 2019,
            make: "Freightliner".to_string(),
            model: "Cascadia".to_string(),
            current_mileage: 150_000,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn test_list_empty_states() {
        let session = SessionSnapshot::default();
        assert!(list_page(&session, &[], "").contains("No trucks yet."));
        assert!(list_page(&session, &[], "volvo").contains("No trucks match"));
        let html = list_page(&session, &[truck()], "");
        assert!(html.contains("Freightliner Cascadia (2019)"));
        assert!(html.contains("150,000"));
    }

    #[test]
    fn test_detail_flags_overdue_records() {
        let truck = truck();
        let record = MaintenanceRecord {
            id: Uuid::new_v4(),
            company_id: truck.company_id,
            truck_id: truck.id,
            maintenance_type: "Oil Change".to_string(),
            performed_at: Utc::now(),
            mileage: 140_000,
            next_due_mileage: Some(145_000),
            part_make_model: None,
            notes: None,
            created_at: None,
        };
        let detail = TruckDetail {
            truck,
            records: vec![record],
        };
        let html = detail_page(&SessionSnapshot::default(), &detail, "http://localhost/trucks/x");
        assert!(html.contains("badge-overdue"));
        assert!(html.contains("1 maintenance item is overdue"));
        assert!(html.contains("Scan to view truck details"));
    }

    #[test]
    fn test_form_actions() {
        let session = SessionSnapshot::default();
        let add = form_page(&session, None, &TruckForm::default(), &FormErrors::new(), None);
        assert!(add.contains(r#"action="/trucks/add""#));

        let id = Uuid::new_v4();
        let edit = form_page(&session, Some(id), &TruckForm::default(), &FormErrors::new(), None);
        assert!(edit.contains(&format!(r#"action="/trucks/{}/edit""#, id)));
    }
}

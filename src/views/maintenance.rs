use super::components::{optional_alert, select, textarea, AlertKind, Input};
use super::layout::page;
use crate::models::maintenance::{MaintenanceForm, MAINTENANCE_TYPES};
use crate::models::truck::Truck;
use crate::services::SessionSnapshot;
use crate::utils::html::{escape, format_miles};
use crate::utils::validation::FormErrors;

pub fn form_page(
    session: &SessionSnapshot,
    truck: &Truck,
    form: &MaintenanceForm,
    errors: &FormErrors,
    banner: Option<&str>,
) -> String {
    let body = format!(
        r#"<div class="card" style="max-width:40rem">
<h1>Add maintenance record</h1>
<p class="muted">{label} · current mileage {miles}</p>
{banner}
<form method="post" action="/trucks/{id}/maintenance" novalidate>
{kind}{date}{mileage}{next_due}{part}{notes}
<button class="btn" type="submit">Save record</button> <a class="btn btn-secondary" href="/trucks/{id}">Cancel</a>
</form>
</div>"#,
        label = escape(&truck.label()),
        miles = format_miles(truck.current_mileage),
        banner = optional_alert(AlertKind::Error, banner),
        id = truck.id,
        kind = select(
            "Maintenance type",
            "maintenance_type",
            MAINTENANCE_TYPES,
            &form.maintenance_type,
            errors
        ),
        date = Input::text("Date performed", "performed_at", &form.performed_at)
            .kind("date")
            .required()
            .render(errors),
        mileage = Input::text("Mileage", "mileage", &form.mileage)
            .kind("number")
            .required()
            .render(errors),
        next_due = Input::text("Next due mileage", "next_due_mileage", &form.next_due_mileage)
            .kind("number")
            .render(errors),
        part = Input::text("Part make / model", "part_make_model", &form.part_make_model)
            .render(errors),
        notes = textarea("Notes", "notes", &form.notes, errors),
    );
    page("Add maintenance record", Some(session), "/trucks", &body)
}

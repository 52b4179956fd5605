use super::components::{optional_alert, AlertKind};
use super::layout::page;
use crate::services::SessionSnapshot;
use crate::utils::html::escape;

pub const INVALID_TRUCK_ID: &str = "Please enter a valid truck ID";

/// Sin cámara: solo entrada manual del id del camión
pub fn scan_page(session: &SessionSnapshot, value: &str, error: Option<&str>) -> String {
    let body = format!(
        r#"<div class="card" style="max-width:32rem">
<h1>Scan QR code</h1>
<p class="muted">Camera scanning is not available. Enter the truck ID printed under the QR code.</p>
{error}
<form method="post" action="/scan">
<div class="field"><label for="truck_id">Truck ID</label><input id="truck_id" name="truck_id" value="{value}"></div>
<button class="btn" type="submit">Go to truck</button>
</form>
</div>"#,
        error = optional_alert(AlertKind::Error, error),
        value = escape(value),
    );
    page("Scan QR", Some(session), "/scan", &body)
}

use super::components::no_company_banner;
use super::layout::page;
use crate::controllers::DashboardSummary;
use crate::services::SessionSnapshot;
use crate::utils::html::escape;

fn stat(label: &str, value: usize) -> String {
    format!(
        r#"<div class="card"><div class="muted">{}</div><div class="stat">{}</div></div>"#,
        label, value
    )
}

pub fn dashboard_page(session: &SessionSnapshot, summary: Option<&DashboardSummary>) -> String {
    let summary = match summary {
        Some(summary) => summary,
        None => return page("Dashboard", Some(session), "/", &no_company_banner()),
    };

    let recent = if summary.recent_maintenance.is_empty() {
        r#"<p class="muted">No maintenance records yet.</p>"#.to_string()
    } else {
        let rows: String = summary
            .recent_maintenance
            .iter()
            .map(|item| {
                format!(
                    r#"<tr><td>{date}</td><td><a href="/trucks/{truck_id}">{truck}</a></td><td>{kind}</td></tr>"#,
                    date = item.record.performed_at.format("%Y-%m-%d"),
                    truck_id = item.record.truck_id,
                    truck = escape(&item.truck_label),
                    kind = escape(&item.record.maintenance_type),
                )
            })
            .collect();
        format!(
            "<table><thead><tr><th>Date</th><th>Truck</th><th>Type</th></tr></thead><tbody>{}</tbody></table>",
            rows
        )
    };

    let upcoming = if summary.upcoming_maintenance.is_empty() {
        r#"<p class="muted">No maintenance due in the next 30 days.</p>"#.to_string()
    } else {
        let items: String = summary
            .upcoming_maintenance
            .iter()
            .map(|item| {
                format!(
                    r#"<li><a href="/trucks/{id}">{truck}</a> due {date} ({days} day{plural})</li>"#,
                    id = item.truck_id,
                    truck = escape(&item.truck_label),
                    date = item.due_date.format("%Y-%m-%d"),
                    days = item.days_until,
                    plural = if item.days_until == 1 { "" } else { "s" },
                )
            })
            .collect();
        format!("<ul>{}</ul>", items)
    };

    let body = format!(
        r#"<h1>Dashboard</h1>
<div class="stats">{total}{needing}{recent_count}</div>
<div class="card"><h2>Recent maintenance</h2>{recent}</div>
<div class="card"><h2>Upcoming maintenance</h2>{upcoming}</div>
<p><a class="btn" href="/trucks/add">Add truck</a> <a class="btn btn-secondary" href="/scan">Scan QR</a></p>"#,
        total = stat("Total trucks", summary.total_trucks),
        needing = stat("Need maintenance", summary.trucks_needing_maintenance),
        recent_count = stat("Recent services", summary.recent_maintenance.len()),
        recent = recent,
        upcoming = upcoming,
    );
    page("Dashboard", Some(session), "/", &body)
}

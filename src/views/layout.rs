//! Plantilla común: cabecera con navegación, contenido y pie

use chrono::{Datelike, Utc};

use crate::services::SessionSnapshot;
use crate::utils::html::escape;

pub const APP_NAME: &str = "Engine Armour";

const STYLES: &str = r#"
body{margin:0;font-family:system-ui,sans-serif;background:#f9fafb;color:#111827}
header{background:#fff;box-shadow:0 1px 2px rgba(0,0,0,.08)}
.bar{max-width:72rem;margin:0 auto;padding:0 1rem;display:flex;justify-content:space-between;align-items:center;height:4rem}
.brand{font-weight:700;font-size:1.25rem}
nav a{margin-right:1.5rem;color:#6b7280;text-decoration:none;font-size:.9rem}
nav a.active{color:#2563eb;border-bottom:2px solid #3b82f6}
main{max-width:72rem;margin:0 auto;padding:1.5rem 1rem}
footer{border-top:1px solid #e5e7eb;background:#fff;padding:1rem;text-align:center;color:#6b7280;font-size:.85rem}
.card{background:#fff;border-radius:.5rem;box-shadow:0 1px 3px rgba(0,0,0,.1);padding:1.25rem;margin-bottom:1rem}
.alert{padding:.75rem 1rem;border-radius:.375rem;margin-bottom:1rem}
.alert-error{background:#fef2f2;color:#b91c1c}
.alert-success{background:#f0fdf4;color:#15803d}
.alert-info{background:#eff6ff;color:#1d4ed8}
.alert-warning{background:#fffbeb;color:#b45309}
.field{margin-bottom:.9rem}
.field label{display:block;font-size:.85rem;font-weight:500;margin-bottom:.25rem}
.field input,.field select,.field textarea{width:100%;padding:.5rem;border:1px solid #d1d5db;border-radius:.375rem;box-sizing:border-box}
.field-error{color:#dc2626;font-size:.8rem;margin-top:.25rem}
.btn{display:inline-block;padding:.5rem 1rem;border-radius:.375rem;border:0;background:#2563eb;color:#fff;text-decoration:none;cursor:pointer;font-size:.9rem}
.btn-secondary{background:#e5e7eb;color:#111827}
.btn-danger{background:#dc2626}
table{width:100%;border-collapse:collapse}
th,td{text-align:left;padding:.5rem;border-bottom:1px solid #e5e7eb;font-size:.9rem}
.badge{display:inline-block;padding:.1rem .5rem;border-radius:9999px;font-size:.75rem}
.badge-overdue{background:#fee2e2;color:#b91c1c}
.stats{display:grid;grid-template-columns:repeat(auto-fit,minmax(12rem,1fr));gap:1rem}
.stat{font-size:2rem;font-weight:700}
.muted{color:#6b7280}
"#;

const NAV_ITEMS: &[(&str, &str)] = &[
    ("Dashboard", "/"),
    ("Trucks", "/trucks"),
    ("Scan QR", "/scan"),
    ("Company", "/company"),
];

fn nav(session: &SessionSnapshot, current_path: &str) -> String {
    let links: String = NAV_ITEMS
        .iter()
        .map(|(name, path)| {
            let active = if *path == current_path
                || (*path != "/" && current_path.starts_with(path))
            {
                " class=\"active\""
            } else {
                ""
            };
            format!(r#"<a href="{}"{}>{}</a>"#, path, active, name)
        })
        .collect();

    let who = session
        .company
        .as_ref()
        .map(|c| c.name.clone())
        .or_else(|| session.user.as_ref().and_then(|u| u.email.clone()))
        .unwrap_or_else(|| "Your Company".to_string());

    format!(
        r#"<nav>{links}<span class="muted">{who}</span>
<form method="post" action="/logout" style="display:inline;margin-left:1rem"><button class="btn" type="submit">Logout</button></form></nav>"#,
        links = links,
        who = escape(&who),
    )
}

/// Documento HTML completo. Sin sesión no se muestra la navegación.
pub fn page(title: &str, session: Option<&SessionSnapshot>, current_path: &str, body: &str) -> String {
    let navigation = session
        .filter(|s| s.is_authenticated())
        .map(|s| nav(s, current_path))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · {app}</title>
<style>{styles}</style>
</head>
<body>
<header><div class="bar"><span class="brand">{app}</span>{navigation}</div></header>
<main>
{body}
</main>
<footer>&copy; {year} {app}. All rights reserved.</footer>
</body>
</html>"#,
        title = escape(title),
        app = APP_NAME,
        styles = STYLES,
        navigation = navigation,
        body = body,
        year = Utc::now().year(),
    )
}

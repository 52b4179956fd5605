//! Páginas de error, reintento y espera de autenticación

use axum::http::StatusCode;

use super::layout::page;
use crate::utils::html::escape;

pub fn not_found_page() -> String {
    page(
        "Page not found",
        None,
        "",
        r#"<div class="card"><h1>404</h1><p>The page you are looking for does not exist.</p><a class="btn" href="/">Back to dashboard</a></div>"#,
    )
}

/// Banner de error a nivel de página con enlace para reintentar
pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    page(
        title,
        None,
        "",
        &format!(
            r#"<div class="card"><h1>{title}</h1><div class="alert alert-error">{message}</div><a class="btn" href="javascript:location.reload()">Try again</a> <a class="btn btn-secondary" href="/">Dashboard</a></div>"#,
            title = escape(title),
            message = escape(message),
        ),
    )
}

/// Pantalla genérica con botón Retry (sin conexión o pánico al renderizar)
pub fn retry_page(message: &str) -> String {
    page(
        "Something went wrong",
        None,
        "",
        &format!(
            r#"<div class="card"><h1 style="color:#dc2626">Something went wrong</h1><p>{}</p><button class="btn" onclick="window.location.reload()">Retry</button></div>"#,
            escape(message),
        ),
    )
}

/// Marcador mientras la sesión termina de inicializar; se recarga solo
pub fn checking_auth_page() -> String {
    let document = page(
        "Checking authentication",
        None,
        "",
        r#"<div class="card" style="text-align:center"><p class="muted">Checking authentication...</p></div>"#,
    );
    document.replacen(
        "<meta charset=\"utf-8\">",
        "<meta charset=\"utf-8\">\n<meta http-equiv=\"refresh\" content=\"1\">",
        1,
    )
}

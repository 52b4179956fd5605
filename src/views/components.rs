//! Piezas reutilizables de formulario y avisos

use crate::utils::html::escape;
use crate::utils::validation::FormErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Error,
    Success,
    Info,
    Warning,
}

impl AlertKind {
    fn class(self) -> &'static str {
        match self {
            AlertKind::Error => "alert-error",
            AlertKind::Success => "alert-success",
            AlertKind::Info => "alert-info",
            AlertKind::Warning => "alert-warning",
        }
    }
}

pub fn alert(kind: AlertKind, message: &str) -> String {
    format!(
        r#"<div class="alert {}" role="alert">{}</div>"#,
        kind.class(),
        escape(message)
    )
}

/// Aviso opcional (vacío si no hay mensaje)
pub fn optional_alert(kind: AlertKind, message: Option<&str>) -> String {
    message.map(|m| alert(kind, m)).unwrap_or_default()
}

/// Aviso de usuario sin fila de empresa
pub fn no_company_banner() -> String {
    alert(
        AlertKind::Warning,
        "No company profile is linked to this account. Complete your company information to start tracking trucks.",
    ) + r#"<p><a class="btn" href="/company">Go to company profile</a></p>"#
}

fn field_error(errors: &FormErrors, name: &str) -> String {
    errors
        .get(name)
        .map(|message| format!(r#"<div class="field-error">{}</div>"#, escape(message)))
        .unwrap_or_default()
}

pub struct Input<'a> {
    pub label: &'a str,
    pub name: &'a str,
    pub value: &'a str,
    pub input_type: &'a str,
    pub required: bool,
    pub placeholder: &'a str,
}

impl<'a> Input<'a> {
    pub fn text(label: &'a str, name: &'a str, value: &'a str) -> Self {
        Self {
            label,
            name,
            value,
            input_type: "text",
            required: false,
            placeholder: "",
        }
    }

    pub fn kind(mut self, input_type: &'a str) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn render(&self, errors: &FormErrors) -> String {
        // Las contraseñas nunca se reenvían al navegador
        let value = if self.input_type == "password" { "" } else { self.value };
        format!(
            r#"<div class="field"><label for="{name}">{label}</label><input id="{name}" name="{name}" type="{kind}" value="{value}"{placeholder}{required}>{error}</div>"#,
            name = self.name,
            label = escape(self.label),
            kind = self.input_type,
            value = escape(value),
            placeholder = if self.placeholder.is_empty() {
                String::new()
            } else {
                format!(r#" placeholder="{}""#, escape(self.placeholder))
            },
            required = if self.required { " required" } else { "" },
            error = field_error(errors, self.name),
        )
    }
}

pub fn textarea(label: &str, name: &str, value: &str, errors: &FormErrors) -> String {
    format!(
        r#"<div class="field"><label for="{name}">{label}</label><textarea id="{name}" name="{name}" rows="3">{value}</textarea>{error}</div>"#,
        name = name,
        label = escape(label),
        value = escape(value),
        error = field_error(errors, name),
    )
}

pub fn select(label: &str, name: &str, options: &[&str], selected: &str, errors: &FormErrors) -> String {
    let options: String = std::iter::once(r#"<option value="">Select...</option>"#.to_string())
        .chain(options.iter().map(|option| {
            format!(
                r#"<option value="{value}"{selected}>{value}</option>"#,
                value = escape(option),
                selected = if *option == selected { " selected" } else { "" },
            )
        }))
        .collect();
    format!(
        r#"<div class="field"><label for="{name}">{label}</label><select id="{name}" name="{name}">{options}</select>{error}</div>"#,
        name = name,
        label = escape(label),
        options = options,
        error = field_error(errors, name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_renders_value_and_error() {
        let mut errors = FormErrors::new();
        errors.insert("vin", "VIN is required");
        let html = Input::text("VIN", "vin", "<x>").required().render(&errors);
        assert!(html.contains(r#"value="&lt;x&gt;""#));
        assert!(html.contains(" required"));
        assert!(html.contains("VIN is required"));
    }

    #[test]
    fn test_password_value_is_not_echoed() {
        let html = Input::text("Password", "password", "secret1")
            .kind("password")
            .render(&FormErrors::new());
        assert!(!html.contains("secret1"));
    }

    #[test]
    fn test_select_marks_selected_option() {
        let html = select("Type", "maintenance_type", &["Oil Change", "Other"], "Other", &FormErrors::new());
        assert!(html.contains(r#"<option value="Other" selected>Other</option>"#));
        assert!(html.contains(r#"<option value="Oil Change">Oil Change</option>"#));
    }
}

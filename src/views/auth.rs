//! Pantallas de login y registro

use super::components::{optional_alert, AlertKind, Input};
use super::layout::page;
use crate::models::auth::{LoginForm, RegisterForm};
use crate::utils::validation::FormErrors;

pub const REGISTERED_NOTICE: &str =
    "Registration successful! Please sign in with your new account.";

pub fn login_page(
    form: &LoginForm,
    errors: &FormErrors,
    banner: Option<&str>,
    notice: Option<&str>,
) -> String {
    let body = format!(
        r#"<div class="card" style="max-width:28rem;margin:2rem auto">
<h1>Sign in to your account</h1>
{notice}{banner}
<form method="post" action="/login" novalidate>
{email}{password}
<button class="btn" type="submit">Sign in</button>
</form>
<p class="muted">Don't have an account? <a href="/register">Register your company</a></p>
</div>"#,
        notice = optional_alert(AlertKind::Success, notice),
        banner = optional_alert(AlertKind::Error, banner),
        email = Input::text("Email address", "email", &form.email)
            .kind("email")
            .required()
            .render(errors),
        password = Input::text("Password", "password", "")
            .kind("password")
            .required()
            .render(errors),
    );
    page("Sign in", None, "/login", &body)
}

pub fn register_page(form: &RegisterForm, errors: &FormErrors, banner: Option<&str>) -> String {
    let body = format!(
        r#"<div class="card" style="max-width:32rem;margin:2rem auto">
<h1>Register your company</h1>
{banner}
<form method="post" action="/register" novalidate>
{company}{address}{phone}{email}{password}{confirm}
<button class="btn" type="submit">Create account</button>
</form>
<p class="muted">Already have an account? <a href="/login">Sign in</a></p>
</div>"#,
        banner = optional_alert(AlertKind::Error, banner),
        company = Input::text("Company name", "company_name", &form.company_name)
            .required()
            .render(errors),
        address = Input::text("Address", "address", &form.address)
            .required()
            .render(errors),
        phone = Input::text("Phone", "phone", &form.phone)
            .kind("tel")
            .required()
            .render(errors),
        email = Input::text("Email address", "email", &form.email)
            .kind("email")
            .required()
            .render(errors),
        password = Input::text("Password", "password", "")
            .kind("password")
            .required()
            .render(errors),
        confirm = Input::text("Confirm password", "confirm_password", "")
            .kind("password")
            .required()
            .render(errors),
    );
    page("Register", None, "/register", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_banner_and_notice() {
        let form = LoginForm {
            email: "a@b.com".to_string(),
            password: "wrong".to_string(),
        };
        let html = login_page(
            &form,
            &FormErrors::new(),
            Some("Failed to sign in. Invalid login credentials"),
            None,
        );
        assert!(html.contains("Failed to sign in. Invalid login credentials"));
        assert!(html.contains(r#"value="a@b.com""#));
        assert!(!html.contains("wrong"));

        let html = login_page(&LoginForm::default(), &FormErrors::new(), None, Some(REGISTERED_NOTICE));
        assert!(html.contains("Registration successful!"));
    }

    #[test]
    fn test_register_page_shows_field_errors() {
        let mut errors = FormErrors::new();
        errors.insert("confirm_password", "Passwords must match");
        let html = register_page(&RegisterForm::default(), &errors, None);
        assert!(html.contains("Passwords must match"));
        assert!(html.contains(r#"name="company_name""#));
    }
}

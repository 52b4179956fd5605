use super::components::{no_company_banner, optional_alert, AlertKind, Input};
use super::layout::page;
use crate::models::company::CompanyForm;
use crate::services::SessionSnapshot;
use crate::utils::validation::FormErrors;

pub struct CompanyPageState<'a> {
    pub form: Option<&'a CompanyForm>,
    pub errors: &'a FormErrors,
    pub banner: Option<&'a str>,
    pub success: Option<&'a str>,
}

pub fn company_page(session: &SessionSnapshot, state: CompanyPageState<'_>) -> String {
    let form = match state.form {
        Some(form) => form,
        None => return page("Company", Some(session), "/company", &no_company_banner_without_link()),
    };
    let errors = state.errors;

    let body = format!(
        r#"<div class="card" style="max-width:40rem">
<h1>Company profile</h1>
{success}{banner}
<form method="post" action="/company" novalidate>
{name}{address}{city}{state_field}{zip}{phone}{email}
<button class="btn" type="submit">Save changes</button>
</form>
</div>"#,
        success = optional_alert(AlertKind::Success, state.success),
        banner = optional_alert(AlertKind::Error, state.banner),
        name = Input::text("Company name", "name", &form.name)
            .required()
            .render(errors),
        address = Input::text("Address", "address", &form.address).render(errors),
        city = Input::text("City", "city", &form.city).render(errors),
        state_field = Input::text("State", "state", &form.state).render(errors),
        zip = Input::text("ZIP", "zip", &form.zip).render(errors),
        phone = Input::text("Phone", "phone", &form.phone)
            .kind("tel")
            .render(errors),
        email = Input::text("Email", "email", &form.email)
            .kind("email")
            .render(errors),
    );
    page("Company", Some(session), "/company", &body)
}

// En /company el enlace al perfil apuntaría a la misma página
fn no_company_banner_without_link() -> String {
    let banner = no_company_banner();
    match banner.find("<p>") {
        Some(index) => banner[..index].to_string(),
        None => banner,
    }
}

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use fleet_maintenance::clients::{ClientFactory, MemoryBackend};
use fleet_maintenance::config::environment::EnvironmentConfig;
use fleet_maintenance::{create_router, AppState};
use tower::ServiceExt;

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

/// Un navegador: conserva la cookie de sesión entre peticiones
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|l| l.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn builder(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.builder("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .builder("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn register(&mut self, company: &str, email: &str) -> TestResponse {
        self.post(
            "/register",
            &[
                ("company_name", company),
                ("address", "12 Depot Road"),
                ("phone", "555-123-4567"),
                ("email", email),
                ("password", "secret1"),
                ("confirm_password", "secret1"),
            ],
        )
        .await
    }

    async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post("/login", &[("email", email), ("password", password)])
            .await
    }

    async fn add_truck(&mut self, vin: &str) -> String {
        let response = self
            .post(
                "/trucks/add",
                &[
                    ("vin", vin),
                    ("license_plate", "abc-1234"),
                    ("year", "2019"),
                    ("make", "Freightliner"),
                    ("model", "Cascadia"),
                    ("current_mileage", "120500"),
                    ("notes", ""),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        response.location.unwrap()
    }
}

fn create_test_app() -> (Router, Arc<MemoryBackend>) {
    let backend = MemoryBackend::with_hash_cost(4);
    let factory: Arc<dyn ClientFactory> = Arc::new(backend.clone());
    let state = AppState::new(EnvironmentConfig::default(), factory);
    (create_router(state), backend)
}

async fn session_count(app: &Router) -> u64 {
    let response = Browser::new(app).get("/health").await;
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    body["sessions"].as_u64().unwrap()
}

async fn signed_in_browser(app: &Router, company: &str, email: &str) -> Browser {
    let mut browser = Browser::new(app);
    let response = browser.register(company, email).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let response = browser.login(email, "secret1").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
    browser
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app();
    let response = Browser::new(&app).get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_anonymous_user_is_redirected_to_login() {
    let (app, _) = create_test_app();
    let mut browser = Browser::new(&app);

    for path in ["/", "/trucks", "/company", "/scan"] {
        let response = browser.get(path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(response.location.as_deref(), Some("/login"));
    }
    assert!(browser.cookie.as_deref().unwrap().starts_with("fleet_session="));

    let response = browser.get("/login").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Sign in to your account"));
}

#[tokio::test]
async fn test_unknown_route_renders_not_found() {
    let (app, _) = create_test_app();
    let mut browser = Browser::new(&app);
    let response = browser.get("/no/such/page").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // Un 404 no abre sesión
    assert!(browser.cookie.is_none());
    assert_eq!(session_count(&app).await, 0);
}

#[tokio::test]
async fn test_unknown_session_cookie_is_replaced() {
    let (app, _) = create_test_app();
    let mut browser = Browser::new(&app);
    let forged = format!("fleet_session={}", uuid::Uuid::new_v4());
    browser.cookie = Some(forged.clone());

    let response = browser.get("/login").await;
    assert_eq!(response.status, StatusCode::OK);
    let issued = browser.cookie.clone().unwrap();
    assert!(issued.starts_with("fleet_session="));
    assert_ne!(issued, forged);
    assert_eq!(session_count(&app).await, 1);

    // El id emitido se reutiliza sin volver a enviar la cookie
    browser.get("/login").await;
    assert_eq!(browser.cookie.as_deref(), Some(issued.as_str()));
    assert_eq!(session_count(&app).await, 1);
}

#[tokio::test]
async fn test_login_rotates_session_cookie() {
    let (app, _) = create_test_app();
    let mut browser = Browser::new(&app);
    browser.register("Acme Haulage", "ops@acme.test").await;
    let before_login = browser.cookie.clone().unwrap();

    let response = browser.login("ops@acme.test", "secret1").await;
    assert_eq!(response.location.as_deref(), Some("/"));
    let after_login = browser.cookie.clone().unwrap();
    assert_ne!(after_login, before_login);

    let response = browser.get("/").await;
    assert_eq!(response.status, StatusCode::OK);

    // La cookie anterior al login ya no da acceso
    let mut stale = Browser::new(&app);
    stale.cookie = Some(before_login.clone());
    let response = stale.get("/").await;
    assert_eq!(response.location.as_deref(), Some("/login"));
    assert_ne!(stale.cookie.as_deref(), Some(before_login.as_str()));
}

#[tokio::test]
async fn test_register_then_login() {
    let (app, backend) = create_test_app();
    let mut browser = Browser::new(&app);

    let response = browser.register("Acme Haulage", "ops@acme.test").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/login?registered=1"));
    assert_eq!(backend.account_count().await, 1);
    assert_eq!(backend.rows("companies").await.len(), 1);

    // El registro no deja la sesión abierta
    let response = browser.get("/login?registered=1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Registration successful!"));

    let response = browser.login("ops@acme.test", "secret1").await;
    assert_eq!(response.location.as_deref(), Some("/"));

    let response = browser.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Acme Haulage"));

    // Autenticado: login redirige al dashboard
    let response = browser.get("/login").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_wrong_password_stays_on_login() {
    let (app, _) = create_test_app();
    let mut browser = Browser::new(&app);
    browser.register("Acme Haulage", "ops@acme.test").await;

    let response = browser.login("ops@acme.test", "wrong-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Failed to sign in."));
    assert!(response.body.contains("Invalid login credentials"));

    let response = browser.get("/").await;
    assert_eq!(response.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_invalid_registration_shows_field_errors() {
    let (app, backend) = create_test_app();
    let mut browser = Browser::new(&app);

    let response = browser
        .post(
            "/register",
            &[
                ("company_name", "A"),
                ("address", "12 Depot Road"),
                ("phone", "555"),
                ("email", "ops@acme.test"),
                ("password", "secret1"),
                ("confirm_password", "other"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Passwords must match"));
    assert!(response.body.contains("Phone number must be at least 10 digits"));
    assert_eq!(backend.account_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let (app, backend) = create_test_app();
    let mut first = Browser::new(&app);
    first.register("Acme Haulage", "ops@acme.test").await;

    let mut second = Browser::new(&app);
    let response = second.register("Acme Again", "ops@acme.test").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body.contains("Failed to create an account."));
    assert!(response.body.contains("An account with this email already exists"));
    assert_eq!(backend.rows("companies").await.len(), 1);
}

#[tokio::test]
async fn test_truck_and_maintenance_flow() {
    let (app, _) = create_test_app();
    let mut browser = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;

    let response = browser.get("/trucks").await;
    assert!(response.body.contains("No trucks yet."));

    let truck_path = browser.add_truck("1FUJGLDR5CSBM1234").await;
    let response = browser.get(&truck_path).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Freightliner Cascadia (2019)"));
    assert!(response.body.contains("ABC-1234"));
    assert!(response.body.contains("Scan to view truck details"));

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let response = browser
        .post(
            &format!("{}/maintenance", truck_path),
            &[
                ("maintenance_type", "Oil Change"),
                ("performed_at", &today),
                ("mileage", "125000"),
                ("next_due_mileage", "135000"),
                ("part_make_model", "Fleetguard LF9009"),
                ("notes", ""),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(truck_path.as_str()));

    // El kilometraje del camión sube al del registro
    let response = browser.get("/trucks").await;
    assert!(response.body.contains("125,000"));

    let response = browser.get("/trucks?q=cascadia").await;
    assert!(response.body.contains("Freightliner Cascadia (2019)"));
    let response = browser.get("/trucks?q=volvo").await;
    assert!(response.body.contains("No trucks match"));

    let response = browser.get("/").await;
    assert!(response.body.contains("Oil Change"));
}

#[tokio::test]
async fn test_invalid_truck_form_is_rerendered() {
    let (app, backend) = create_test_app();
    let mut browser = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;

    let response = browser
        .post(
            "/trucks/add",
            &[
                ("vin", "123"),
                ("license_plate", "ABC-1234"),
                ("year", "2019"),
                ("make", ""),
                ("model", "Cascadia"),
                ("current_mileage", "100"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("VIN must be 17 characters"));
    assert!(response.body.contains("Make is required"));
    assert!(backend.rows("trucks").await.is_empty());
}

#[tokio::test]
async fn test_trucks_are_scoped_to_company() {
    let (app, _) = create_test_app();
    let mut owner = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;
    let truck_path = owner.add_truck("1FUJGLDR5CSBM1234").await;

    let mut other = signed_in_browser(&app, "Other Freight", "ops@other.test").await;
    let response = other.get(&truck_path).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = other.post(&format!("{}/delete", truck_path), &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = other.get("/trucks").await;
    assert!(response.body.contains("No trucks yet."));

    // El dueño todavía lo ve y puede borrarlo
    let response = owner.post(&format!("{}/delete", truck_path), &[]).await;
    assert_eq!(response.location.as_deref(), Some("/trucks"));
    let response = owner.get(&truck_path).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_truck_id_is_not_found() {
    let (app, _) = create_test_app();
    let mut browser = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;
    let response = browser.get("/trucks/not-a-uuid").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scan_redirects_to_truck() {
    let (app, _) = create_test_app();
    let mut browser = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;
    let truck_path = browser.add_truck("1FUJGLDR5CSBM1234").await;

    let url = format!("http://localhost:3000{}", truck_path);
    let response = browser.post("/scan", &[("truck_id", &url)]).await;
    assert_eq!(response.location.as_deref(), Some(truck_path.as_str()));

    let response = browser.post("/scan", &[("truck_id", "truck 42")]).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please enter a valid truck ID"));
}

#[tokio::test]
async fn test_company_update() {
    let (app, _) = create_test_app();
    let mut browser = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;

    let response = browser
        .post(
            "/company",
            &[
                ("name", "Acme Logistics"),
                ("address", "12 Depot Road"),
                ("city", "Springfield"),
                ("state", "IL"),
                ("zip", "62701"),
                ("phone", "555-123-4567"),
                ("email", "ops@acme.test"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Company information updated successfully"));

    let response = browser.get("/").await;
    assert!(response.body.contains("Acme Logistics"));

    let response = browser.post("/company", &[("name", "")]).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Company name is required"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (app, _) = create_test_app();
    let mut browser = signed_in_browser(&app, "Acme Haulage", "ops@acme.test").await;

    let response = browser.post("/logout", &[]).await;
    assert_eq!(response.location.as_deref(), Some("/login"));

    let response = browser.get("/").await;
    assert_eq!(response.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_offline_backend_shows_retry_page() {
    let (app, backend) = create_test_app();
    backend.set_offline(true);

    let response = Browser::new(&app).get("/login").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.body.contains("Retry"));

    backend.set_offline(false);
    let response = Browser::new(&app).get("/login").await;
    assert_eq!(response.status, StatusCode::OK);
}

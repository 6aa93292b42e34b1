use axum::{
    body,
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use brewhouse::app_state::AppState;
use brewhouse::configuration::{DatabaseSettings, Settings};
use brewhouse::create_app;
use brewhouse::data_models::{ApiResponse, AuthResponse, AuthStatus, ContactResponse, UserProfile};
use brewhouse::db::Database;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::env;
use tower::ServiceExt;

pub async fn read_body(body: Body) -> String {
    let bytes = body::to_bytes(body, usize::MAX).await.expect("Failed");
    String::from_utf8(bytes.to_vec()).expect("response was not valid utf-8")
}

async fn create_db() -> Database {
    let directory = env::current_dir().expect("Failed to find current directory");
    let settings = DatabaseSettings {
        file_path: Some(format!("{}/tests/data.json", directory.to_str().unwrap())),
        ..Default::default()
    };
    Database::try_from(&settings)
        .await
        .expect("Failed to create in memory db")
}

struct TestResponse {
    status: StatusCode,
    set_cookies: Vec<String>,
    text: String,
}

impl TestResponse {
    fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_str(&self.text).expect("Failed to parse response body")
    }
}

/// Drives the router like a browser: keeps cookies between requests and can
/// echo the CSRF cookie back as a header.
struct Browser {
    app: Router,
    cookies: HashMap<String, String>,
}

impl Browser {
    async fn new() -> (Self, AppState) {
        let db = create_db().await;
        let (app, state) = create_app(db, &Settings::default()).expect("Failed to create an app");
        let browser = Self {
            app,
            cookies: HashMap::new(),
        };
        (browser, state)
    }

    fn cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        with_csrf: bool,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ACCEPT, "application/json");
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(header::COOKIE, cookie);
        }
        if with_csrf {
            if let Some(token) = self.cookie("XSRF-TOKEN") {
                request = request.header("X-XSRF-TOKEN", token.as_str());
            }
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let set_cookies: Vec<String> = parts
            .headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        for cookie in &set_cookies {
            let pair = cookie.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            self.cookies.insert(name.to_string(), value.to_string());
        }
        TestResponse {
            status: parts.status,
            set_cookies,
            text: read_body(body).await,
        }
    }

    async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, false).await
    }

    async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body), true).await
    }

    async fn register_and_login(&mut self) {
        let response = self.get("/csrf-cookie").await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        let response = self.post("/register", jane_registration()).await;
        assert_eq!(response.status, StatusCode::CREATED);
        let response = self
            .post(
                "/login",
                json!({"email": "jane@example.com", "password": "espresso"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
}

fn jane_registration() -> Value {
    json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "birthdate": "1990-06-15",
        "email": "jane@example.com",
        "password": "espresso",
        "password_confirmation": "espresso",
    })
}

fn great_coffee() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "message": "Great coffee!",
    })
}

#[tokio::test]
async fn health_check_works() {
    let (mut browser, _) = Browser::new().await;
    let response = browser.get("/health_check").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn health_check_does_not_start_a_session() {
    let (mut browser, state) = Browser::new().await;
    for _ in 0..3 {
        let response = browser.get("/health_check").await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.set_cookies.is_empty());
    }
    assert_eq!(state.sessions.active_count().unwrap(), 0);
}

#[tokio::test]
async fn session_cookie_is_refreshed_on_every_response() {
    let (mut browser, state) = Browser::new().await;
    browser.get("/csrf-cookie").await;
    let session = browser
        .cookie("brewhouse_session")
        .cloned()
        .expect("No session cookie");

    let response = browser.get("/check-auth").await;

    let refreshed = response
        .set_cookies
        .iter()
        .find(|cookie| cookie.starts_with("brewhouse_session="))
        .expect("Session cookie was not refreshed");
    assert!(refreshed.starts_with(&format!("brewhouse_session={session};")));
    assert!(refreshed.contains("Max-Age=7200"));
    assert_eq!(state.sessions.active_count().unwrap(), 1);
}

#[tokio::test]
async fn csrf_cookie_is_readable_by_scripts() {
    let (mut browser, _) = Browser::new().await;
    let response = browser.get("/csrf-cookie").await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let xsrf = response
        .set_cookies
        .iter()
        .find(|cookie| cookie.starts_with("XSRF-TOKEN="))
        .expect("No csrf cookie");
    assert!(!xsrf.contains("HttpOnly"));
    let session = response
        .set_cookies
        .iter()
        .find(|cookie| cookie.starts_with("brewhouse_session="))
        .expect("No session cookie");
    assert!(session.contains("HttpOnly"));
    assert_eq!(browser.cookie("XSRF-TOKEN").map(String::len), Some(40));
}

#[tokio::test]
async fn contact_without_csrf_token_is_forbidden() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    let response = browser
        .send(Method::POST, "/contact", Some(great_coffee()), false)
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    let body: ApiResponse = response.json();
    assert!(!body.success);
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn contact_with_wrong_csrf_token_is_forbidden() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;
    browser
        .cookies
        .insert("XSRF-TOKEN".to_string(), "forged".to_string());

    let response = browser.post("/contact", great_coffee()).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn contact_requires_authentication() {
    let (mut browser, state) = Browser::new().await;
    browser.get("/csrf-cookie").await;

    let response = browser.post("/contact", great_coffee()).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let body: ApiResponse = response.json();
    assert_eq!(body.message, "Unauthenticated.");
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn contact_submission_is_stored() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    let response = browser.post("/contact", great_coffee()).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body: ContactResponse = response.json();
    assert!(body.success);
    assert_eq!(
        body.message,
        "Thank you for your message! We will get back to you soon."
    );

    let user = state
        .db
        .find_user_by_email("jane@example.com")
        .await
        .unwrap()
        .expect("User not stored");
    let stored = state.db.all_messages().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Jane Doe");
    assert_eq!(stored[0].email, "jane@example.com");
    assert_eq!(stored[0].message, "Great coffee!");
    assert_eq!(stored[0].user_id, Some(user.id));
    assert_eq!(body.data, Some(stored[0].clone()));
}

#[tokio::test]
async fn identical_submissions_are_stored_twice() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    for _ in 0..2 {
        let response = browser.post("/contact", great_coffee()).await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let user = state
        .db
        .find_user_by_email("jane@example.com")
        .await
        .unwrap()
        .expect("User not stored");
    let stored = state.db.messages_for_user(user.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_ne!(stored[0].id, stored[1].id);
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    let response = browser
        .post(
            "/contact",
            json!({"name": "Jane Doe", "email": "not-an-email", "message": "Great coffee!"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: ContactResponse = response.json();
    assert!(!body.success);
    let errors = body.errors.expect("No field errors");
    assert_eq!(
        errors.get("email"),
        Some(&vec![
            "The email field must be a valid email address.".to_string()
        ])
    );
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_fields_are_required() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    let response = browser
        .post("/contact", json!({"name": "  ", "email": "jane@example.com"}))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: ContactResponse = response.json();
    let errors = body.errors.expect("No field errors");
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("message"));
    assert!(!errors.contains_key("email"));
    assert_eq!(
        body.message,
        "The name field is required. (and 1 more error)"
    );
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    let response = browser.post("/contact", json!(["not", "an", "object"])).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (mut browser, _) = Browser::new().await;
    browser.register_and_login().await;

    let response = browser.post("/register", jane_registration()).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: AuthResponse = response.json();
    assert_eq!(
        body.errors.expect("No field errors").get("email"),
        Some(&vec!["The email has already been taken.".to_string()])
    );
}

#[tokio::test]
async fn email_case_does_not_make_a_new_account() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;

    let mut registration = jane_registration();
    registration["email"] = json!("Jane@Example.com");
    let response = browser.post("/register", registration).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = browser
        .post(
            "/login",
            json!({"email": "JANE@example.com", "password": "espresso"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let user = state
        .db
        .find_user_by_email("jane@EXAMPLE.com")
        .await
        .unwrap()
        .expect("User not stored");
    assert_eq!(user.email, "jane@example.com");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (mut browser, _) = Browser::new().await;
    browser.get("/csrf-cookie").await;
    browser.post("/register", jane_registration()).await;

    let response = browser
        .post(
            "/login",
            json!({"email": "jane@example.com", "password": "decaf!"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let body: ApiResponse = response.json();
    assert_eq!(body.message, "The provided credentials are incorrect.");
}

#[tokio::test]
async fn login_rotates_the_session() {
    let (mut browser, _) = Browser::new().await;
    browser.get("/csrf-cookie").await;
    let anonymous = browser.cookie("brewhouse_session").cloned();
    browser.post("/register", jane_registration()).await;

    let response = browser
        .post(
            "/login",
            json!({"email": "jane@example.com", "password": "espresso"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body: AuthResponse = response.json();
    assert_eq!(body.user.expect("No user").first_name, "Jane");
    assert!(anonymous.is_some());
    assert_ne!(browser.cookie("brewhouse_session").cloned(), anonymous);
}

#[tokio::test]
async fn check_auth_and_user_follow_the_session() {
    let (mut browser, _) = Browser::new().await;

    let status: AuthStatus = browser.get("/check-auth").await.json();
    assert!(!status.authenticated);
    assert_eq!(browser.get("/user").await.status, StatusCode::UNAUTHORIZED);

    browser.register_and_login().await;

    let status: AuthStatus = browser.get("/check-auth").await.json();
    assert!(status.authenticated);
    let response = browser.get("/user").await;
    assert_eq!(response.status, StatusCode::OK);
    let profile: UserProfile = response.json();
    assert_eq!(profile.full_name(), "Jane Doe");
    assert_eq!(profile.email, "jane@example.com");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let (mut browser, state) = Browser::new().await;
    browser.register_and_login().await;
    let token = browser.cookie("XSRF-TOKEN").cloned();

    let response = browser.post("/logout", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_ne!(browser.cookie("XSRF-TOKEN").cloned(), token);

    let status: AuthStatus = browser.get("/check-auth").await.json();
    assert!(!status.authenticated);
    let response = browser.post("/contact", great_coffee()).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(state.db.all_messages().await.unwrap().is_empty());
}

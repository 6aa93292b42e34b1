pub mod app_state;
pub mod auth;
pub mod client;
pub mod configuration;
pub mod cookies;
pub mod csrf;
pub mod data_models;
pub mod db;
pub mod errors;
mod routes;
pub mod session;

use crate::app_state::AppState;
use crate::configuration::Settings;
use crate::db::Database;
use crate::errors::Error;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn create_app(db: Database, settings: &Settings) -> Result<(Router, AppState), Error> {
    let app_state = AppState::init(db, settings);

    let protected = Router::new()
        .route("/user", get(routes::user))
        .route("/contact", post(routes::contact))
        .route_layer(from_fn_with_state(app_state.clone(), auth::require_auth));

    let app = Router::new()
        .route("/csrf-cookie", get(routes::csrf_cookie))
        .route("/register", post(routes::register))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/check-auth", get(routes::check_auth))
        .merge(protected)
        .layer(from_fn_with_state(app_state.clone(), csrf::verify_csrf_token))
        .layer(from_fn_with_state(app_state.clone(), session::start_session))
        // outside the session layer: health checks never start a session
        .route("/health_check", get(routes::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());
    Ok((app, app_state))
}

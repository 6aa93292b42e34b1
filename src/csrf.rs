//! Anti-forgery tokens bound to the session.
//!
//! `GET /csrf-cookie` stores a token on the session and hands it to the
//! browser in a readable cookie. Every state-changing request has to send
//! the same value back in the CSRF header. The check says nothing about who
//! the caller is; authentication is enforced separately.

use crate::app_state::AppState;
use crate::errors::AppErrors;
use crate::session::Session;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use tracing::warn;

pub const CSRF_TOKEN_LENGTH: usize = 40;

pub fn generate_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Compares every byte, so timing does not reveal where the tokens differ.
fn same_token(expected: &str, provided: &str) -> bool {
    let diff = expected
        .bytes()
        .zip(provided.bytes())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b));
    expected.len() == provided.len() && diff == 0
}

pub fn token_matches(session: &Session, provided: Option<&str>) -> bool {
    match (session.csrf_token.as_deref(), provided) {
        (Some(expected), Some(provided)) => same_token(expected, provided),
        _ => false,
    }
}

/// Rejects state-changing requests whose CSRF header does not match the
/// session token. Runs inside `start_session`.
pub async fn verify_csrf_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppErrors> {
    if is_safe(request.method()) {
        return Ok(next.run(request).await);
    }
    let session = request
        .extensions()
        .get::<Session>()
        .ok_or(AppErrors::SessionUnavailable)?;
    let provided = request
        .headers()
        .get(state.settings.csrf.header_name.as_str())
        .and_then(|value| value.to_str().ok());
    if !token_matches(session, provided) {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "rejected request with a missing or invalid csrf token"
        );
        return Err(AppErrors::CsrfTokenMismatch);
    }
    Ok(next.run(request).await)
}

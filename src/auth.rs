use crate::app_state::AppState;
use crate::db::User;
use crate::errors::AppErrors;
use crate::session::Session;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

/// The user behind the current session, inserted by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

pub fn hash_password(password: &str) -> Result<String, AppErrors> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppErrors::PasswordHashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Route layer for endpoints that need a logged-in user. Requests without
/// one never reach the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppErrors> {
    let user_id = request
        .extensions()
        .get::<Session>()
        .and_then(|session| session.user_id);
    let Some(user_id) = user_id else {
        warn!(path = %request.uri().path(), "rejected unauthenticated request");
        return Err(AppErrors::Unauthenticated);
    };
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or(AppErrors::Unauthenticated)?;
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

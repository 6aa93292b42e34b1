use crate::app_state::AppState;
use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::cookies::{self, CookieOptions};
use crate::data_models::{
    ApiResponse, AuthResponse, AuthStatus, ContactResponse, FieldErrors, UserProfile,
};
use crate::db::traits::{DeclaredFields, ExternalText};
use crate::db::{Credentials, DatabaseError, NewContactMessage, NewUser, Registration};
use crate::errors::AppErrors;
use crate::session::{session_cookie, Session};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response, Result};
use axum::Extension;
use tracing::{info, warn};

pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

fn csrf_cookie_for(state: &AppState, token: &str) -> String {
    let options = CookieOptions {
        max_age: Some(state.settings.session.lifetime_minutes * 60),
        secure: state.settings.session.secure_cookie,
        // the browser script reads it to fill the header
        http_only: false,
        ..Default::default()
    };
    cookies::build(&state.settings.csrf.cookie_name, token, &options)
}

pub async fn csrf_cookie(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppErrors> {
    let token = state.sessions.ensure_csrf_token(&session.id)?;
    let mut response = StatusCode::NO_CONTENT.into_response();
    cookies::append(response.headers_mut(), csrf_cookie_for(&state, &token));
    Ok(response)
}

fn email_taken() -> AppErrors {
    let mut errors = FieldErrors::new();
    errors.insert(
        "email".to_string(),
        vec!["The email has already been taken.".to_string()],
    );
    AppErrors::invalid(errors, Registration::FIELDS)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppErrors> {
    let Json(registration) = payload?;
    let registration = registration.cleaned();
    registration.check()?;
    let birthdate = registration
        .birthdate()
        .ok_or_else(|| AppErrors::MalformedPayload("unreadable birthdate".to_string()))?;
    if state
        .db
        .find_user_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(email_taken());
    }

    let new_user = NewUser {
        first_name: registration.first_name,
        last_name: registration.last_name,
        email: registration.email,
        birthdate,
        password_hash: hash_password(&registration.password)?,
    };
    let user = match state.db.create_user(new_user).await {
        Ok(user) => user,
        Err(DatabaseError::DuplicateEmail) => return Err(email_taken()),
        Err(err) => return Err(err.into()),
    };
    info!(user = %user.id, "registered user");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::with_user(
            "Registration successful.",
            UserProfile::from(&user),
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AppErrors> {
    let Json(credentials) = payload?;
    let credentials = credentials.cleaned();
    credentials.check()?;

    let user = state
        .db
        .find_user_by_email(&credentials.email)
        .await?
        .filter(|user| verify_password(&credentials.password, &user.password_hash))
        .ok_or_else(|| {
            warn!("failed login attempt");
            AppErrors::InvalidCredentials
        })?;

    let session = state.sessions.login(&session.id, user.id)?;
    info!(user = %user.id, "user logged in");
    let mut response = Json(AuthResponse::with_user(
        "Login successful.",
        UserProfile::from(&user),
    ))
    .into_response();
    cookies::append(
        response.headers_mut(),
        session_cookie(&state.settings.session, &session),
    );
    Ok(response)
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppErrors> {
    let fresh = state.sessions.invalidate(&session.id)?;
    if let Some(user_id) = session.user_id {
        info!(user = %user_id, "user logged out");
    }
    let mut response = Json(ApiResponse::ok("Logged out successfully.")).into_response();
    cookies::append(
        response.headers_mut(),
        session_cookie(&state.settings.session, &fresh),
    );
    if let Some(token) = &fresh.csrf_token {
        cookies::append(response.headers_mut(), csrf_cookie_for(&state, token));
    }
    Ok(response)
}

pub async fn check_auth(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<AuthStatus>, AppErrors> {
    let user = match session.user_id {
        Some(id) => state.db.get_user(id).await?,
        None => None,
    };
    Ok(Json(AuthStatus {
        authenticated: user.is_some(),
        user: user.as_ref().map(UserProfile::from),
    }))
}

pub async fn user(Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

pub async fn contact(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    payload: Result<Json<NewContactMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResponse>), AppErrors> {
    let Json(message) = payload?;
    let message = message.cleaned();
    message.check()?;
    let stored = state
        .db
        .register_message(Some(user.id), message)
        .await
        .map_err(AppErrors::SubmissionFailed)?;
    info!(message = stored.id, user = %user.id, "stored contact message");
    Ok((StatusCode::CREATED, Json(ContactResponse::sent(stored))))
}

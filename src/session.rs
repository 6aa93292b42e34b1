//! Server-side sessions keyed by an opaque id carried in a cookie.

use crate::app_state::AppState;
use crate::configuration::SessionSettings;
use crate::cookies::{self, CookieOptions};
use crate::csrf::generate_token;
use crate::db::UserId;
use crate::errors::AppErrors;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: Option<UserId>,
    pub csrf_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn new(lifetime: Duration) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_id: None,
            csrf_token: None,
            expires_at: Utc::now() + lifetime,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(lifetime_minutes: i64) -> Self {
        Self {
            sessions: RwLock::default(),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    fn sessions(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Session>>, AppErrors> {
        self.sessions
            .write()
            .map_err(|_| AppErrors::SessionUnavailable)
    }

    pub fn start(&self) -> Result<Session, AppErrors> {
        let mut sessions = self.sessions()?;
        sessions.retain(|_, session| !session.is_expired());
        let session = Session::new(self.lifetime);
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Looks up a live session and extends its lifetime. Expired sessions
    /// are dropped.
    pub fn get(&self, id: &str) -> Result<Option<Session>, AppErrors> {
        let mut sessions = self.sessions()?;
        let Some(session) = sessions.get_mut(id) else {
            return Ok(None);
        };
        if session.is_expired() {
            sessions.remove(id);
            return Ok(None);
        }
        session.expires_at = Utc::now() + self.lifetime;
        Ok(Some(session.clone()))
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> Result<usize, AppErrors> {
        let sessions = self.sessions()?;
        Ok(sessions
            .values()
            .filter(|session| !session.is_expired())
            .count())
    }

    pub fn ensure_csrf_token(&self, id: &str) -> Result<String, AppErrors> {
        let mut sessions = self.sessions()?;
        let session = sessions
            .get_mut(id)
            .ok_or(AppErrors::SessionUnavailable)?;
        Ok(session
            .csrf_token
            .get_or_insert_with(generate_token)
            .clone())
    }

    /// Moves the session under a fresh id and binds it to `user_id`. The
    /// CSRF token carries over.
    pub fn login(&self, id: &str, user_id: UserId) -> Result<Session, AppErrors> {
        let mut sessions = self.sessions()?;
        let previous = sessions.remove(id).ok_or(AppErrors::SessionUnavailable)?;
        let session = Session {
            user_id: Some(user_id),
            csrf_token: previous.csrf_token,
            ..Session::new(self.lifetime)
        };
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Drops the session and starts an anonymous one with a new CSRF token.
    pub fn invalidate(&self, id: &str) -> Result<Session, AppErrors> {
        let mut sessions = self.sessions()?;
        sessions.remove(id);
        let session = Session {
            csrf_token: Some(generate_token()),
            ..Session::new(self.lifetime)
        };
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }
}

pub fn session_cookie(settings: &SessionSettings, session: &Session) -> String {
    let options = CookieOptions {
        max_age: Some(settings.lifetime_minutes * 60),
        secure: settings.secure_cookie,
        ..Default::default()
    };
    cookies::build(&settings.cookie_name, &session.id, &options)
}

/// Attaches the caller's session to the request, starting a new one when
/// the cookie is missing, unknown or expired. The session cookie is
/// refreshed on every response the handler did not set one on.
pub async fn start_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let settings = &state.settings.session;
    let existing = match cookies::read(request.headers(), &settings.cookie_name) {
        Some(id) => state.sessions.get(&id),
        None => Ok(None),
    };
    let (session, is_new) = match existing {
        Ok(Some(session)) => (session, false),
        Ok(None) => match state.sessions.start() {
            Ok(session) => (session, true),
            Err(err) => return err.into_response(),
        },
        Err(err) => return err.into_response(),
    };
    if is_new {
        debug!(session = %session.id, "started session");
    }
    // re-sent on every response so the browser's expiry slides with ours
    let cookie = session_cookie(settings, &session);
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if !cookies::is_set(response.headers(), &settings.cookie_name) {
        cookies::append(response.headers_mut(), cookie);
    }
    response
}

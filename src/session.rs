use crate::config::Credentials;
use crate::errors::{AppError, AppResult};
use crate::state::TablesState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "attendance_session";

/// A session unused for this long is dropped on its next use.
pub const SESSION_IDLE_HOURS: i64 = 12;

#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub last_seen: DateTime<Utc>,
}

/// Signed-in operators, keyed by the token stored in their cookie.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    idle_limit: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            sessions: Arc::default(),
            idle_limit: Duration::hours(SESSION_IDLE_HOURS),
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the submitted credentials and opens a session. Returns its token.
    pub async fn sign_in(
        &self,
        operator: &Credentials,
        email: &str,
        password: &str,
    ) -> AppResult<String> {
        let email = email.trim();
        if !email.eq_ignore_ascii_case(&operator.email) || password != operator.password {
            warn!(%email, "rejected sign-in");
            return Err(AppError::InvalidCredentials);
        }

        let token = Uuid::new_v4().simple().to_string();
        self.sessions.lock().await.insert(
            token.clone(),
            Session {
                email: email.to_string(),
                last_seen: Utc::now(),
            },
        );
        info!(%email, "operator signed in");
        Ok(token)
    }

    pub async fn current(&self, token: &str) -> Option<Session> {
        self.current_at(token, Utc::now()).await
    }

    /// Looks the token up as of `now`, refreshing its idle clock or dropping it
    /// when it has been idle past the limit.
    pub async fn current_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let idle = now - sessions.get(token)?.last_seen;
        if idle > self.idle_limit {
            if let Some(expired) = sessions.remove(token) {
                info!(email = %expired.email, "session expired");
            }
            return None;
        }
        let session = sessions.get_mut(token)?;
        session.last_seen = session.last_seen.max(now);
        Some(session.clone())
    }

    pub async fn sign_out(&self, token: &str) {
        if let Some(session) = self.sessions.lock().await.remove(token) {
            info!(email = %session.email, "operator signed out");
        }
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub async fn has_session(state: &TablesState, headers: &HeaderMap) -> bool {
    match session_token(headers) {
        Some(token) => state.sessions.current(&token).await.is_some(),
        None => false,
    }
}

/// Lets the request through only with a live session. Pages go to the login
/// form, API calls get 401.
pub async fn require_session(
    State(state): State<TablesState>,
    request: Request,
    next: Next,
) -> Response {
    if has_session(&state, request.headers()).await {
        return next.run(request).await;
    }

    if request.uri().path().starts_with("/api/") {
        AppError::Unauthorized.into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

//! Cookie-carried sessions and the middleware guarding protected routes.
//!
//! The cookie holds a signed JSON token with the user id, the username and
//! the issue time. The signature is checked by [`SignedCookieJar`]; the user
//! row is reloaded on every request so deleted users and role changes take
//! effect immediately.

use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use chrono::Utc;
use engine::Session;
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

pub const SESSION_COOKIE: &str = "checkin_session";

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SessionToken {
    user_id: i32,
    username: String,
    /// Unix timestamp, seconds.
    issued_at: i64,
}

impl SessionToken {
    fn is_fresh(&self, now: i64, ttl: time::Duration) -> bool {
        let age = now - self.issued_at;
        (0..=ttl.whole_seconds()).contains(&age)
    }
}

/// Store `session` in the cookie jar.
///
/// With `secure` set the browser only sends the cookie over HTTPS.
pub(crate) fn issue(
    jar: SignedCookieJar,
    session: &Session,
    ttl: time::Duration,
    secure: bool,
) -> SignedCookieJar {
    let token = SessionToken {
        user_id: session.user_id,
        username: session.username.clone(),
        issued_at: Utc::now().timestamp(),
    };
    let value = match serde_json::to_string(&token) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("failed to encode session token: {err}");
            return jar;
        }
    };

    jar.add(
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .max_age(ttl),
    )
}

pub(crate) fn clear(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn token(jar: &SignedCookieJar, ttl: time::Duration) -> Option<SessionToken> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let token: SessionToken = serde_json::from_str(cookie.value()).ok()?;
    token.is_fresh(Utc::now().timestamp(), ttl).then_some(token)
}

/// Resolve the session carried by the request, if any and still valid.
pub(crate) async fn current(
    state: &ServerState,
    jar: &SignedCookieJar,
) -> Result<Option<Session>, ServerError> {
    let Some(token) = token(jar, state.session_ttl) else {
        return Ok(None);
    };

    let session = state.engine.session(token.user_id).await?;
    Ok(session.filter(|session| session.username == token.username))
}

/// Reject requests without a valid session; expose the `Session` to handlers
/// as an extension.
pub(crate) async fn require_session(
    State(state): State<ServerState>,
    jar: SignedCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let session = current(&state, &jar)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Keep accounts with a pending forced password change out of the roster.
pub(crate) async fn require_password_rotated(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if session.must_change_password {
        return Err(ServerError::PasswordChangeRequired);
    }
    Ok(next.run(request).await)
}

pub(crate) async fn require_admin(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !session.is_admin() {
        tracing::warn!("user {} denied access to {}", session.username, request.uri());
        return Err(engine::EngineError::Forbidden("admin role required".to_string()).into());
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_at(issued_at: i64) -> SessionToken {
        SessionToken {
            user_id: 1,
            username: "desk".to_string(),
            issued_at,
        }
    }

    #[test]
    fn token_expires_after_ttl() {
        let ttl = time::Duration::hours(1);
        assert!(token_at(1_000).is_fresh(1_000, ttl));
        assert!(token_at(1_000).is_fresh(4_600, ttl));
        assert!(!token_at(1_000).is_fresh(4_601, ttl));
    }

    #[test]
    fn token_from_the_future_is_rejected() {
        assert!(!token_at(2_000).is_fresh(1_000, time::Duration::hours(1)));
    }

    #[test]
    fn token_survives_json() {
        let encoded = serde_json::to_string(&token_at(42)).unwrap();
        let decoded: SessionToken = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, token_at(42));
    }
}

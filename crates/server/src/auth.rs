//! Login, logout and password change endpoints.

use api_types::{Notice, account::PasswordChange, session::{Login, SessionView}};
use axum::{Extension, Json, extract::State, response::Redirect};
use axum_extra::extract::cookie::SignedCookieJar;
use engine::{EngineError, Session};

use crate::{ServerError, server::ServerState, session, views::session_view};

/// Who is logged in, or `null`.
pub async fn session_info(
    State(state): State<ServerState>,
    jar: SignedCookieJar,
) -> Result<Json<Option<SessionView>>, ServerError> {
    let session = session::current(&state, &jar).await?;
    Ok(Json(session.as_ref().map(session_view)))
}

pub async fn login(
    State(state): State<ServerState>,
    jar: SignedCookieJar,
    Json(payload): Json<Login>,
) -> Result<(SignedCookieJar, Json<SessionView>), ServerError> {
    let session = match state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await
    {
        Ok(session) => session,
        Err(EngineError::InvalidCredentials) => {
            tracing::warn!("failed login for {:?}", payload.username);
            return Err(EngineError::InvalidCredentials.into());
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("user {} logged in", session.username);
    if session.must_change_password {
        tracing::warn!(
            "user {} must change the bootstrap password before using the roster",
            session.username
        );
    }

    let jar = session::issue(jar, &session, state.session_ttl, state.secure_cookie);
    Ok((jar, Json(session_view(&session))))
}

/// Drop the session cookie and send the client back to the login route.
pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    (session::clear(jar), Redirect::to("/"))
}

pub async fn change_password(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<Notice>, ServerError> {
    state
        .engine
        .change_password(
            session.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    tracing::info!("user {} changed password", session.username);
    Ok(Json(Notice::new("Password aggiornata con successo!")))
}

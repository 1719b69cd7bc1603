use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::Key;

use std::sync::Arc;

use crate::{
    auth, dashboard, export, participants,
    session::{require_admin, require_password_rotated, require_session},
    users,
};
use engine::Engine;

/// Largest accepted roster upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Signs the session cookie.
    pub key: Key,
    pub session_ttl: time::Duration,
    /// Mark the session cookie `Secure`. On by default; turn off only when
    /// serving plain HTTP outside localhost.
    pub secure_cookie: bool,
}

impl ServerState {
    /// Build the state from the engine and the configured secret.
    ///
    /// The secret must be at least 64 bytes long.
    pub fn new(engine: Engine, secret: &[u8], session_ttl: time::Duration) -> Result<Self, String> {
        let key = Key::try_from(secret)
            .map_err(|err| format!("invalid session secret key: {err}"))?;
        Ok(Self {
            engine: Arc::new(engine),
            key,
            session_ttl,
            secure_cookie: true,
        })
    }
}

impl FromRef<ServerState> for Key {
    fn from_ref(state: &ServerState) -> Self {
        state.key.clone()
    }
}

pub fn router(state: ServerState) -> Router {
    let admin = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", put(users::update))
        .route_layer(middleware::from_fn(require_admin));

    let roster = Router::new()
        .route("/dashboard", get(dashboard::get))
        .route("/dashboard/attendance", post(dashboard::toggle_attendance))
        .route(
            "/dashboard/import",
            post(participants::import).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/participants",
            get(participants::list).post(participants::create),
        )
        .route(
            "/participants/{id}",
            put(participants::update).delete(participants::delete),
        )
        .route(
            "/participants/import",
            post(participants::import).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/export_excel", get(export::excel))
        .route("/export_csv", get(export::csv))
        .merge(admin)
        .route_layer(middleware::from_fn(require_password_rotated));

    let protected = Router::new()
        .route("/account/password", post(auth::change_password))
        .merge(roster)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(auth::session_info).post(auth::login))
        .route("/logout", get(auth::logout))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

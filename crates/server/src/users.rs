//! Staff account administration. Mounted behind the admin guard.

use api_types::user::{UserNew, UserSaved, UserUpdate, UserView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Session;

use crate::{
    ServerError,
    server::ServerState,
    views::{engine_role, user_view},
};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<UserView>>, ServerError> {
    let users = state.engine.users().await?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}

pub async fn create(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserSaved>), ServerError> {
    let user = state
        .engine
        .create_user(&payload.username, &payload.password, engine_role(payload.role))
        .await?;
    tracing::info!(
        "user {} created {} with role {}",
        session.username,
        user.username,
        user.role.as_str()
    );

    Ok((
        StatusCode::CREATED,
        Json(UserSaved {
            message: "Utente creato con successo!".to_string(),
            user: user_view(user),
        }),
    ))
}

pub async fn update(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserSaved>, ServerError> {
    let user = state
        .engine
        .update_user(
            user_id,
            engine_role(payload.role),
            payload.new_password.as_deref(),
        )
        .await?;
    tracing::info!(
        "user {} updated {} (role {})",
        session.username,
        user.username,
        user.role.as_str()
    );

    Ok(Json(UserSaved {
        message: "Utente aggiornato con successo!".to_string(),
        user: user_view(user),
    }))
}

//! Dashboard: roster statistics, filtered listing and attendance toggle.

use api_types::{
    dashboard::Dashboard,
    participant::{AttendanceToggle, AttendanceToggled, Search},
};
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState, views::participant_view};

pub async fn get(
    State(state): State<ServerState>,
    Query(query): Query<Search>,
) -> Result<Json<Dashboard>, ServerError> {
    let search = query.search.unwrap_or_default();
    let stats = state.engine.roster_stats().await?;
    let participants = state.engine.participants(Some(&search)).await?;

    Ok(Json(Dashboard {
        total_participants: stats.total_participants,
        present_participants: stats.present_participants,
        absent_participants: stats.absent_participants,
        total_users: stats.total_users,
        search,
        participants: participants.into_iter().map(participant_view).collect(),
    }))
}

pub async fn toggle_attendance(
    State(state): State<ServerState>,
    Json(payload): Json<AttendanceToggle>,
) -> Result<Json<AttendanceToggled>, ServerError> {
    let attended = state
        .engine
        .toggle_attendance(payload.participant_id, payload.current_status)
        .await?;

    Ok(Json(AttendanceToggled {
        message: "Stato di partecipazione aggiornato!".to_string(),
        participant_id: payload.participant_id,
        attended,
    }))
}

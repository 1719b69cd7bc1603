//! Participant roster endpoints.

use api_types::participant::{
    ImportSummary, ParticipantDeleted, ParticipantNew, ParticipantSaved, ParticipantUpdate,
    ParticipantView, Search,
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use engine::{ParticipantFields, Session};

use crate::{ServerError, server::ServerState, views::participant_view};

/// Multipart field carrying the uploaded roster.
const IMPORT_FIELD: &str = "import_excel";

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<Search>,
) -> Result<Json<Vec<ParticipantView>>, ServerError> {
    let participants = state.engine.participants(query.search.as_deref()).await?;
    Ok(Json(participants.into_iter().map(participant_view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ParticipantNew>,
) -> Result<(StatusCode, Json<ParticipantSaved>), ServerError> {
    let participant = state
        .engine
        .add_participant(ParticipantFields {
            name: payload.name,
            surname: payload.surname,
            role: payload.role,
            company: payload.company,
            attended: false,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ParticipantSaved {
            message: "Partecipante aggiunto con successo!".to_string(),
            participant: participant_view(participant),
        }),
    ))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(participant_id): Path<i32>,
    Json(payload): Json<ParticipantUpdate>,
) -> Result<Json<ParticipantSaved>, ServerError> {
    let participant = state
        .engine
        .update_participant(
            participant_id,
            ParticipantFields {
                name: payload.name,
                surname: payload.surname,
                role: payload.role,
                company: payload.company,
                attended: payload.attended,
            },
        )
        .await?;

    Ok(Json(ParticipantSaved {
        message: "Partecipante aggiornato con successo!".to_string(),
        participant: participant_view(participant),
    }))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(participant_id): Path<i32>,
) -> Result<Json<ParticipantDeleted>, ServerError> {
    let deleted = state.engine.delete_participant(participant_id).await?;

    Ok(Json(ParticipantDeleted {
        message: "Partecipante eliminato con successo!".to_string(),
        id: participant_id,
        deleted,
    }))
}

/// Merge an uploaded spreadsheet into the roster. Rows whose (name, surname)
/// already exist are skipped.
pub async fn import(
    Extension(session): Extension<Session>,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ServerError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::Generic(err.to_string()))?
    {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ServerError::Generic(err.to_string()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| ServerError::Generic("Nessun file selezionato".to_string()))?;

    let rows = tokio::task::spawn_blocking(move || engine::parse_roster(&file_name, &bytes))
        .await
        .map_err(|err| ServerError::Internal(format!("import task failed: {err}")))??;

    let imported = state.engine.import_roster(rows).await?;
    tracing::info!("user {} imported {imported} participants", session.username);

    Ok(Json(ImportSummary {
        message: format!("Importati {imported} nuovi partecipanti!"),
        imported,
    }))
}

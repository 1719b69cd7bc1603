//! Roster downloads.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use engine::{
    Participant,
    spreadsheet::{CSV_CONTENT_TYPE, CSV_FILE_NAME, XLSX_CONTENT_TYPE, XLSX_FILE_NAME},
};

use crate::{ServerError, server::ServerState};

pub async fn excel(State(state): State<ServerState>) -> Result<Response, ServerError> {
    download(&state, engine::export_xlsx, XLSX_CONTENT_TYPE, XLSX_FILE_NAME).await
}

pub async fn csv(State(state): State<ServerState>) -> Result<Response, ServerError> {
    download(&state, engine::export_csv, CSV_CONTENT_TYPE, CSV_FILE_NAME).await
}

async fn download(
    state: &ServerState,
    render: fn(&[Participant]) -> Result<Vec<u8>, engine::EngineError>,
    content_type: &'static str,
    file_name: &'static str,
) -> Result<Response, ServerError> {
    let participants = state.engine.participants(None).await?;
    let bytes = tokio::task::spawn_blocking(move || render(&participants))
        .await
        .map_err(|err| ServerError::Internal(format!("export task failed: {err}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

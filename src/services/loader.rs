use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use crate::models::Participant;

/// Errors that can occur when reading participant records
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid participant data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepted document shapes: a bare array or `{ "participants": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ParticipantDocument {
    List(Vec<Participant>),
    Wrapped { participants: Vec<Participant> },
}

/// Parse participant records from a JSON document
pub fn parse_participants(raw: &str) -> Result<Vec<Participant>, LoaderError> {
    let participants = match serde_json::from_str(raw)? {
        ParticipantDocument::List(list) => list,
        ParticipantDocument::Wrapped { participants } => participants,
    };
    Ok(participants)
}

/// Read and parse a participant file
///
/// Structural checks (ids, vector lengths) are left to the engine.
pub async fn load_participants<P: AsRef<Path>>(path: P) -> Result<Vec<Participant>, LoaderError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let participants = parse_participants(&raw)?;
    tracing::info!("Loaded {} participants from {}", participants.len(), path.display());
    Ok(participants)
}

//! Types d'erreurs pour pmostage

use pmocatalog::CatalogError;
use thiserror::Error;

/// Message entrant illisible
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON message: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Type du message fautif, quand il a pu être lu
    pub fn command(&self) -> Option<&str> {
        match self {
            ProtocolError::InvalidJson(_) => None,
            ProtocolError::UnknownType(kind) => Some(kind),
            ProtocolError::InvalidPayload { kind, .. } => Some(kind),
        }
    }
}

/// Mutation refusée par le [`crate::StateStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: usize,
    },
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Invalid {kind}: {reason}")]
    InvalidEntity { kind: &'static str, reason: String },

    #[error("No lyrics file named {0}")]
    LyricsNotFound(String),

    #[error("Lyrics file {0} is neither UTF-8 nor GBK")]
    LyricsEncoding(String),

    #[error("Cannot read lyrics file {name}: {source}")]
    LyricsIo {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type Result spécialisé pour pmostage
pub type Result<T> = std::result::Result<T, StageError>;

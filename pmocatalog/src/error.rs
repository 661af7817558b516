use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn duplicate_track(id: &str) -> Self {
        CatalogError::DuplicateId {
            kind: "track",
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate_slide(id: &str) -> Self {
        CatalogError::DuplicateId {
            kind: "slide",
            id: id.to_string(),
        }
    }
}

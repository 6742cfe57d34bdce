use thiserror::Error;

use crate::document::{EntityKind, Store};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Caller-facing rejections. No mutation has happened when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is not verifiable: every band and the location must be validated first")]
    NotVerifiable(String),

    #[error("{kind} {id} still references unvalidated entries")]
    UnvalidatedReferences { kind: EntityKind, id: String },

    #[error("Festival event {0} belongs to a festival that is not validated yet")]
    OwnerNotValidated(String),

    #[error("Festival event {event} is not part of festival {festival}")]
    FestivalEventNotOwned { festival: String, event: String },

    #[error("Invalid genre count {0}: must be between 1 and 3")]
    GenreCount(usize),

    #[error("Band list cannot be empty")]
    EmptyBandList,

    #[error("Genre already exists: {0}")]
    DuplicateGenre(String),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("{0} entries cannot be validated")]
    NotPromotable(EntityKind),

    #[error("{kind} entries have no {store:?} store")]
    NoSuchStore { kind: EntityKind, store: Store },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Image storage error: {0}")]
    ImageStorage(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

//! Error types for the state layer.

use thiserror::Error;

use super::data::ArtworkId;

/// Failure talking to the key-value backend, or encoding what goes into it
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failed: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("failed to create storage directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode artworks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The stored value exists but cannot be parsed back into artworks
#[derive(Debug, Error)]
#[error("stored value under `{key}` is not a readable artwork list: {source}")]
pub struct DecodeError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors surfaced by collection store operations
#[derive(Debug, Error)]
pub enum GalleryError {
    /// No artwork with this id; nothing was changed
    #[error("artwork {0} not found")]
    NotFound(ArtworkId),

    /// Every representable id is already in use
    #[error("no unused artwork id left")]
    IdsExhausted,

    /// The in-memory change was kept but could not be saved
    #[error(transparent)]
    Storage(#[from] StorageError),
}

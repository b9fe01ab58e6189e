use thiserror::Error;

/// Errors that may occur while interacting with the block store.
///
/// This enum is used across all implementations of the [`crate::BlockStore`] trait.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An error surfaced by the underlying database driver.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A record could not be serialized into its document form.
    #[error("serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    /// The expected record was not found in the store.
    #[error("record not found: {0}")]
    NotFound(String),
}

//! Storage backends for the patient collection.
//!
//! Every backend reads and writes the whole collection at once. A write
//! either replaces the persisted collection entirely or leaves it untouched.

mod json_file;
mod memory;
mod schema;
mod sqlite;

pub use json_file::*;
pub use memory::*;
pub use schema::*;
pub use sqlite::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Collection;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed collection: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored record {id} is invalid: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned(e.to_string())
    }
}

/// Whole-collection persistence.
pub trait RecordStore: Send + Sync {
    /// Read the full collection.
    fn load_all(&self) -> StoreResult<Collection>;

    /// Replace the persisted collection with `collection`.
    fn save_all(&self, collection: &Collection) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn load_all(&self) -> StoreResult<Collection> {
        (**self).load_all()
    }

    fn save_all(&self, collection: &Collection) -> StoreResult<()> {
        (**self).save_all(collection)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn load_all(&self) -> StoreResult<Collection> {
        (**self).load_all()
    }

    fn save_all(&self, collection: &Collection) -> StoreResult<()> {
        (**self).save_all(collection)
    }
}

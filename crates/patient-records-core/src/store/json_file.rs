//! JSON file store.
//!
//! The file holds a single object mapping patient id to the stored record:
//!
//! ```json
//! {
//!     "P001": {
//!         "name": "Ananya Verma",
//!         "city": "Guwahati",
//!         "age": 28,
//!         "gender": "female",
//!         "height": 1.65,
//!         "weight": 90.0
//!     }
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{RecordStore, StoreError, StoreResult};
use crate::models::Collection;

/// Collection persisted as one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`, writing an empty collection if the file does
    /// not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        if !store.path.exists() {
            debug!(path = %store.path.display(), "creating empty collection file");
            store.save_all(&Collection::new())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that holds the file, where writes are staged.
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Serialize with four-space indentation.
fn to_pretty_bytes(collection: &Collection) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    collection.serialize(&mut ser)?;
    Ok(buf)
}

impl RecordStore for JsonFileStore {
    fn load_all(&self) -> StoreResult<Collection> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| self.io_error(&self.path, e))?;
        let collection: Collection = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), count = collection.len(), "loaded collection");
        Ok(collection)
    }

    fn save_all(&self, collection: &Collection) -> StoreResult<()> {
        let bytes = to_pretty_bytes(collection)?;
        let dir = self.directory();

        // Unique per write; removed on drop unless persisted
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| self.io_error(dir, e))?;
        staged
            .write_all(&bytes)
            .map_err(|e| self.io_error(staged.path(), e))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.io_error(&self.path, e.error))?;

        debug!(path = %self.path.display(), count = collection.len(), "saved collection");
        Ok(())
    }
}

//! In-process collection store.

use std::sync::Mutex;

use super::{RecordStore, StoreResult};
use crate::models::Collection;

/// Keeps the collection in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: Mutex<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection.
    pub fn with_collection(collection: Collection) -> Self {
        Self {
            collection: Mutex::new(collection),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> StoreResult<Collection> {
        Ok(self.collection.lock()?.clone())
    }

    fn save_all(&self, collection: &Collection) -> StoreResult<()> {
        *self.collection.lock()? = collection.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, StoredPatient};

    #[test]
    fn test_save_replaces_everything() {
        let store = MemoryStore::new();
        assert!(store.load_all().unwrap().is_empty());

        let mut collection = Collection::new();
        collection.insert(
            "P001",
            StoredPatient {
                name: "Amit".into(),
                city: "Jaipur".into(),
                age: 52,
                gender: Gender::Male,
                height: 1.7,
                weight: 70.0,
            },
        );
        store.save_all(&collection).unwrap();
        assert_eq!(store.load_all().unwrap(), collection);

        store.save_all(&Collection::new()).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }
}

//! SQLite-backed collection store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::debug;

use super::{RecordStore, StoreError, StoreResult, SCHEMA};
use crate::models::{Collection, Gender, StoredPatient};

/// Collection persisted in a `patients` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw row before gender and age are checked.
struct PatientRow {
    id: String,
    name: String,
    city: String,
    age: i64,
    gender: String,
    height: f64,
    weight: f64,
}

impl PatientRow {
    fn into_entry(self) -> StoreResult<(String, StoredPatient)> {
        let gender: Gender = self.gender.parse().map_err(|reason| StoreError::Corrupt {
            id: self.id.clone(),
            reason,
        })?;
        let age = u8::try_from(self.age).map_err(|_| StoreError::Corrupt {
            id: self.id.clone(),
            reason: format!("age out of range: {}", self.age),
        })?;

        Ok((
            self.id,
            StoredPatient {
                name: self.name,
                city: self.city,
                age,
                gender,
                height: self.height,
                weight: self.weight,
            },
        ))
    }
}

impl SqliteStore {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RecordStore for SqliteStore {
    fn load_all(&self) -> StoreResult<Collection> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, city, age, gender, height, weight
            FROM patients
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PatientRow {
                id: row.get(0)?,
                name: row.get(1)?,
                city: row.get(2)?,
                age: row.get(3)?,
                gender: row.get(4)?,
                height: row.get(5)?,
                weight: row.get(6)?,
            })
        })?;

        let mut collection = Collection::new();
        for row in rows {
            let (id, patient) = row?.into_entry()?;
            collection.insert(id, patient);
        }

        debug!(count = collection.len(), "loaded collection from sqlite");
        Ok(collection)
    }

    fn save_all(&self, collection: &Collection) -> StoreResult<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM patients", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO patients (id, name, city, age, gender, height, weight)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for (id, patient) in collection {
                stmt.execute(params![
                    id,
                    patient.name,
                    patient.city,
                    patient.age,
                    patient.gender.as_str(),
                    patient.height,
                    patient.weight,
                ])?;
            }
        }
        tx.commit()?;

        debug!(count = collection.len(), "saved collection to sqlite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn patient(name: &str, weight: f64) -> StoredPatient {
        StoredPatient {
            name: name.into(),
            city: "Chennai".into(),
            age: 38,
            gender: Gender::Others,
            height: 1.72,
            weight,
        }
    }

    #[test]
    fn test_save_and_load_keeps_collection_order() {
        let store = setup_store();

        let mut collection = Collection::new();
        collection.insert("P002", patient("Vikram", 80.0));
        collection.insert("P001", patient("Sana", 58.5));
        store.save_all(&collection).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, collection);
        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec!["P002", "P001"]);
    }

    #[test]
    fn test_save_replaces_rows() {
        let store = setup_store();

        let mut collection = Collection::new();
        collection.insert("P001", patient("Sana", 58.5));
        collection.insert("P002", patient("Vikram", 80.0));
        store.save_all(&collection).unwrap();

        collection.remove("P001");
        store.save_all(&collection).unwrap();

        collection.insert("P000", patient("Asha", 61.0));
        store.save_all(&collection).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec!["P002", "P000"]);
    }

    #[test]
    fn test_bad_gender_row_is_corrupt() {
        let store = setup_store();
        store
            .conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO patients (id, name, city, age, gender, height, weight) VALUES ('P001', 'A', 'B', 20, 'robot', 1.7, 60)",
                [],
            )
            .unwrap();

        match store.load_all() {
            Err(StoreError::Corrupt { id, .. }) => assert_eq!(id, "P001"),
            other => panic!("expected corrupt record, got {:?}", other),
        }
    }

    #[test]
    fn test_file_backed_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.db");

        let mut collection = Collection::new();
        collection.insert("P001", patient("Sana", 58.5));
        SqliteStore::open(&path).unwrap().save_all(&collection).unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load_all().unwrap(), collection);
    }
}

//! Record service: validated operations over a [`RecordStore`].
//!
//! Every operation loads the full collection, works on it, and (for
//! mutations) writes it back. A reader/writer gate serializes mutations so
//! two callers sharing a gate can never interleave their load-mutate-save
//! sequences. Services over the same backing file must share one gate
//! ([`RecordService::with_gate`]); separate processes are not coordinated.

mod sort;

pub use sort::*;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{merge, Collection, NewPatient, PatientEntry, PatientRecord, PatientUpdate};
use crate::store::{RecordStore, StoreError};
use crate::validation::ValidationErrors;

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient already exists: {0}")]
    Conflict(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Patient record operations over a store.
pub struct RecordService<S> {
    store: S,
    gate: Arc<RwLock<()>>,
}

impl<S: RecordStore> RecordService<S> {
    /// A service with its own gate.
    pub fn new(store: S) -> Self {
        Self::with_gate(store, Arc::default())
    }

    /// A service that serializes its mutations with every other service
    /// holding `gate`.
    pub fn with_gate(store: S, gate: Arc<RwLock<()>>) -> Self {
        Self { store, gate }
    }

    /// The full collection.
    pub fn list(&self) -> ServiceResult<Collection> {
        let _guard = self.read_gate()?;
        Ok(self.store.load_all()?)
    }

    /// One patient, with freshly derived metrics.
    pub fn get(&self, id: &str) -> ServiceResult<PatientRecord> {
        let _guard = self.read_gate()?;
        let collection = self.store.load_all()?;
        lookup(&collection, id)
    }

    /// All patients ordered by `field`.
    pub fn sort_by(&self, field: SortField, order: SortOrder) -> ServiceResult<Vec<PatientEntry>> {
        let _guard = self.read_gate()?;
        let collection = self.store.load_all()?;
        debug!(%field, %order, count = collection.len(), "sorting patients");
        Ok(sort_entries(collection.entries(), field, order))
    }

    /// Sort with textual arguments, as received from a caller.
    pub fn sort_by_name(&self, field: &str, order: &str) -> ServiceResult<Vec<PatientEntry>> {
        let field: SortField = field.parse()?;
        let order: SortOrder = order.parse()?;
        self.sort_by(field, order)
    }

    /// Validate and insert a new patient.
    pub fn create(&self, input: NewPatient) -> ServiceResult<PatientRecord> {
        let record = PatientRecord::new(input).map_err(|e| {
            warn!(error = %e, "rejected patient create");
            e
        })?;

        let _guard = self.write_gate()?;
        let mut collection = self.store.load_all()?;
        if collection.contains(record.id()) {
            warn!(patient_id = record.id(), "patient already exists");
            return Err(ServiceError::Conflict(record.id().to_string()));
        }

        collection.insert(record.id(), record.to_stored());
        self.store.save_all(&collection)?;

        info!(patient_id = record.id(), bmi = record.bmi(), "patient created");
        Ok(record)
    }

    /// Apply a partial update to an existing patient.
    pub fn update(&self, id: &str, patch: &PatientUpdate) -> ServiceResult<PatientRecord> {
        let _guard = self.write_gate()?;
        let mut collection = self.store.load_all()?;

        let existing = collection
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        let updated = merge(id, existing, patch).map_err(|e| {
            warn!(patient_id = id, error = %e, "rejected patient update");
            e
        })?;

        collection.insert(id, updated.to_stored());
        self.store.save_all(&collection)?;

        info!(patient_id = id, bmi = updated.bmi(), "patient updated");
        Ok(updated)
    }

    /// Remove a patient.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.write_gate()?;
        let mut collection = self.store.load_all()?;

        if collection.remove(id).is_none() {
            warn!(patient_id = id, "delete of unknown patient");
            return Err(ServiceError::NotFound(id.to_string()));
        }
        self.store.save_all(&collection)?;

        info!(patient_id = id, "patient deleted");
        Ok(())
    }

    fn read_gate(&self) -> ServiceResult<RwLockReadGuard<'_, ()>> {
        self.gate
            .read()
            .map_err(|e| ServiceError::Storage(StoreError::from(e)))
    }

    fn write_gate(&self) -> ServiceResult<RwLockWriteGuard<'_, ()>> {
        self.gate
            .write()
            .map_err(|e| ServiceError::Storage(StoreError::from(e)))
    }
}

/// Find `id` and rebuild it as a validated record.
fn lookup(collection: &Collection, id: &str) -> ServiceResult<PatientRecord> {
    let stored = collection
        .get(id)
        .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

    PatientRecord::from_stored(id, stored).map_err(|e| {
        ServiceError::Storage(StoreError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
    })
}

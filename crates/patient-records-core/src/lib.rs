//! Patient Records Core Library
//!
//! Validation, health-metric derivation and storage for patient records.
//!
//! # Architecture
//!
//! ```text
//!        Caller (HTTP handler, native app via FFI)
//!                          │
//!                   ┌──────▼──────┐
//!                   │RecordService│  single-writer gate
//!                   └──────┬──────┘
//!          ┌───────────────┼────────────────┐
//!          │               │                │
//!     Validation     Derivation (BMI)   Merge (patch)
//!          │               │                │
//!          └───────────────┼────────────────┘
//!                          │
//!                  ┌───────▼───────┐
//!                  │  RecordStore  │  whole-collection load / save
//!                  └───────┬───────┘
//!              ┌───────────┼───────────┐
//!              ▼           ▼           ▼
//!          JSON file     SQLite     In-memory
//! ```
//!
//! # Core Principle
//!
//! **Derived values are never a source of truth.** BMI and verdict are
//! recomputed every time a record is built and are never persisted.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientRecord, PatientUpdate, Collection, metrics)
//! - [`validation`]: Field constraints and strict payload reading
//! - [`store`]: Storage backends
//! - [`service`]: Record operations and typed errors
//! - [`config`]: TOML configuration
//! - [`logging`]: Subscriber setup

pub mod config;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{LoggingConfig, RecordsConfig, StorageConfig};
pub use models::{
    derive, merge, Collection, Gender, HealthMetrics, NewPatient, PatientEntry, PatientRecord,
    PatientUpdate, StoredPatient, Verdict,
};
pub use service::{RecordService, ServiceError, SortField, SortOrder};
pub use store::{JsonFileStore, MemoryStore, RecordStore, SqliteStore, StoreError};
pub use validation::{FieldViolation, ValidationErrors};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PatientRecordsError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ServiceError> for PatientRecordsError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(errors) => PatientRecordsError::Validation(errors.to_string()),
            ServiceError::NotFound(id) => PatientRecordsError::NotFound(id),
            ServiceError::Conflict(id) => PatientRecordsError::Conflict(id),
            ServiceError::InvalidArgument(msg) => PatientRecordsError::InvalidArgument(msg),
            ServiceError::Storage(e) => PatientRecordsError::Storage(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for PatientRecordsError {
    fn from(e: ValidationErrors) -> Self {
        PatientRecordsError::Validation(e.to_string())
    }
}

impl From<StoreError> for PatientRecordsError {
    fn from(e: StoreError) -> Self {
        PatientRecordsError::Storage(e.to_string())
    }
}

impl From<config::ConfigError> for PatientRecordsError {
    fn from(e: config::ConfigError) -> Self {
        PatientRecordsError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for PatientRecordsError {
    fn from(e: serde_json::Error) -> Self {
        PatientRecordsError::Validation(format!("body: malformed JSON: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the store described by a TOML config file and install logging.
///
/// Handles opened on the same file in this process serialize their writes
/// against each other.
#[uniffi::export]
pub fn open_records(config_path: String) -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let config = RecordsConfig::load(&config_path)?;
    logging::init_logging(&config.logging);
    let store = config.storage.open_store()?;
    let gate = match config.storage.path() {
        Some(path) => shared_gate(path)?,
        None => Arc::default(),
    };
    Ok(PatientRecordsCore::wrap(store, gate))
}

/// Open a JSON file store at the given path.
///
/// Handles opened on the same file in this process serialize their writes
/// against each other. Other processes are not coordinated.
#[uniffi::export]
pub fn open_records_at(path: String) -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let store = JsonFileStore::open(&path)?;
    let gate = shared_gate(store.path())?;
    Ok(PatientRecordsCore::wrap(Box::new(store), gate))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_records_in_memory() -> Arc<PatientRecordsCore> {
    PatientRecordsCore::wrap(Box::new(MemoryStore::new()), Arc::default())
}

/// The write gate for a backing file, one per canonical path.
fn shared_gate(path: &Path) -> Result<Arc<RwLock<()>>, PatientRecordsError> {
    static GATES: OnceLock<Mutex<HashMap<PathBuf, Arc<RwLock<()>>>>> = OnceLock::new();

    let key = path.canonicalize().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut gates = GATES
        .get_or_init(Default::default)
        .lock()
        .map_err(StoreError::from)?;
    Ok(Arc::clone(gates.entry(key).or_default()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe record service for FFI.
#[derive(uniffi::Object)]
pub struct PatientRecordsCore {
    service: RecordService<Box<dyn RecordStore>>,
}

impl PatientRecordsCore {
    fn wrap(store: Box<dyn RecordStore>, gate: Arc<RwLock<()>>) -> Arc<Self> {
        Arc::new(Self {
            service: RecordService::with_gate(store, gate),
        })
    }
}

#[uniffi::export]
impl PatientRecordsCore {
    /// All patients, in storage order.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, PatientRecordsError> {
        let collection = self.service.list()?;
        Ok(collection.entries().into_iter().map(|e| e.into()).collect())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<FfiPatient, PatientRecordsError> {
        let record = self.service.get(&id)?;
        Ok(record.into())
    }

    /// Sort patients by `height`, `weight` or `bmi`, `asc` or `desc`.
    pub fn sort_patients(
        &self,
        sort_by: String,
        sort_order: String,
    ) -> Result<Vec<FfiPatient>, PatientRecordsError> {
        let entries = self.service.sort_by_name(&sort_by, &sort_order)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Create a patient from typed fields.
    pub fn create_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, PatientRecordsError> {
        let record = self.service.create(patient.into())?;
        Ok(record.into())
    }

    /// Create a patient from a JSON body.
    pub fn create_patient_json(&self, body: String) -> Result<FfiPatient, PatientRecordsError> {
        let payload: serde_json::Value = serde_json::from_str(&body)?;
        let input = NewPatient::from_json(&payload)?;
        let record = self.service.create(input)?;
        Ok(record.into())
    }

    /// Apply a partial update from typed fields.
    pub fn update_patient(
        &self,
        id: String,
        update: FfiPatientUpdate,
    ) -> Result<FfiPatient, PatientRecordsError> {
        let record = self.service.update(&id, &update.into())?;
        Ok(record.into())
    }

    /// Apply a partial update from a JSON body.
    pub fn update_patient_json(
        &self,
        id: String,
        body: String,
    ) -> Result<FfiPatient, PatientRecordsError> {
        let payload: serde_json::Value = serde_json::from_str(&body)?;
        let patch = PatientUpdate::from_json(&payload)?;
        let record = self.service.update(&id, &patch)?;
        Ok(record.into())
    }

    /// Delete a patient by ID.
    pub fn delete_patient(&self, id: String) -> Result<(), PatientRecordsError> {
        self.service.delete(&id)?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient view.
///
/// `bmi` and `verdict` are `None` only for stored entries whose measurements
/// cannot be derived.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: u8,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub bmi: Option<f64>,
    pub verdict: Option<String>,
}

impl From<PatientRecord> for FfiPatient {
    fn from(record: PatientRecord) -> Self {
        Self {
            id: record.id().to_string(),
            name: record.name().to_string(),
            city: record.city().to_string(),
            age: record.age(),
            gender: record.gender().to_string(),
            height: record.height(),
            weight: record.weight(),
            bmi: Some(record.bmi()),
            verdict: Some(record.verdict().to_string()),
        }
    }
}

impl From<PatientEntry> for FfiPatient {
    fn from(entry: PatientEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.patient.name,
            city: entry.patient.city,
            age: entry.patient.age,
            gender: entry.patient.gender.to_string(),
            height: entry.patient.height,
            weight: entry.patient.weight,
            bmi: entry.bmi,
            verdict: entry.verdict.map(|v| v.to_string()),
        }
    }
}

/// FFI-safe create input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

impl From<FfiNewPatient> for NewPatient {
    fn from(p: FfiNewPatient) -> Self {
        NewPatient {
            id: p.id,
            name: p.name,
            city: p.city,
            age: p.age,
            gender: p.gender,
            height: p.height,
            weight: p.weight,
        }
    }
}

/// FFI-safe partial update.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl From<FfiPatientUpdate> for PatientUpdate {
    fn from(u: FfiPatientUpdate) -> Self {
        PatientUpdate {
            name: u.name,
            city: u.city,
            age: u.age,
            gender: u.gender,
            height: u.height,
            weight: u.weight,
        }
    }
}

//! The keyed patient collection, as persisted.

use indexmap::{map, IndexMap};
use serde::{Deserialize, Serialize};

use super::metrics::Verdict;
use super::patient::StoredPatient;

/// All patients keyed by id.
///
/// Iteration follows insertion order, which for a loaded collection is the
/// order of the records in storage. That order is also the tie-break order
/// for sorting, and saving a loaded collection writes it back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: IndexMap<String, StoredPatient>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&StoredPatient> {
        self.records.get(id)
    }

    /// Insert or replace, returning the previous entry. A replaced entry keeps
    /// its position; a new one goes last.
    pub fn insert(&mut self, id: impl Into<String>, patient: StoredPatient) -> Option<StoredPatient> {
        self.records.insert(id.into(), patient)
    }

    /// Remove an entry, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<StoredPatient> {
        self.records.shift_remove(id)
    }

    pub fn iter(&self) -> map::Iter<'_, String, StoredPatient> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(String::as_str)
    }

    /// Every entry with its id and derived metrics, in collection order.
    pub fn entries(&self) -> Vec<PatientEntry> {
        self.iter()
            .map(|(id, patient)| PatientEntry::new(id, patient))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = (&'a String, &'a StoredPatient);
    type IntoIter = map::Iter<'a, String, StoredPatient>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<(String, StoredPatient)> for Collection {
    fn from_iter<I: IntoIterator<Item = (String, StoredPatient)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// A collection entry with its id and freshly derived metrics.
///
/// `bmi` and `verdict` are absent when the stored measurements cannot
/// produce them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientEntry {
    pub id: String,
    #[serde(flatten)]
    pub patient: StoredPatient,
    pub bmi: Option<f64>,
    pub verdict: Option<Verdict>,
}

impl PatientEntry {
    pub fn new(id: &str, patient: &StoredPatient) -> Self {
        let metrics = patient.metrics();
        Self {
            id: id.to_string(),
            patient: patient.clone(),
            bmi: metrics.map(|m| m.bmi),
            verdict: metrics.map(|m| m.verdict),
        }
    }
}

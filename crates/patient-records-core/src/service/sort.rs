//! Sorting patient entries by a measurement.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::ServiceError;
use crate::models::PatientEntry;

/// Sortable measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Height, SortField::Weight, SortField::Bmi];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Bmi => "bmi",
        }
    }

    /// Sort key for an entry. Values that are missing or cannot be derived
    /// count as 0.
    pub fn key(&self, entry: &PatientEntry) -> f64 {
        let value = match self {
            SortField::Height => entry.patient.height,
            SortField::Weight => entry.patient.weight,
            SortField::Bmi => entry.bmi.unwrap_or(0.0),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                ServiceError::InvalidArgument(format!(
                    "invalid sort field {:?}, choose from height, weight, bmi",
                    s
                ))
            })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ServiceError::InvalidArgument(format!(
                "sort order must be 'asc' or 'desc', got {:?}",
                other
            ))),
        }
    }
}

/// Stable sort: entries with equal keys keep their incoming order in both
/// directions.
pub fn sort_entries(mut entries: Vec<PatientEntry>, field: SortField, order: SortOrder) -> Vec<PatientEntry> {
    entries.sort_by(|a, b| {
        let ord: Ordering = field.key(a).total_cmp(&field.key(b));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    entries
}

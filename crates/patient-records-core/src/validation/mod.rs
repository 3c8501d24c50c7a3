//! Field-level constraints for patient records.
//!
//! Every check is a plain function returning `Result<_, String>` where the
//! error is a human-readable reason. [`Violations`] runs several checks and
//! keeps all failures, so callers see the complete set in one pass.

mod payload;

pub use payload::*;

use std::fmt;

use thiserror::Error;

use crate::models::Gender;

/// Maximum length of a patient name, in characters.
pub const NAME_MAX_CHARS: usize = 50;

/// Ages are accepted strictly between these bounds.
pub const AGE_LOWER_EXCLUSIVE: i64 = 0;
pub const AGE_UPPER_EXCLUSIVE: i64 = 120;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field name as it appears in payloads
    pub field: String,
    /// Why the value was rejected
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// One or more fields failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_violations(.violations))]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// All failures, in field order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Check whether a given field failed.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Names of the failing fields.
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

/// Accumulator for constraint failures.
#[derive(Debug, Default)]
pub struct Violations {
    inner: Vec<FieldViolation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.inner.push(FieldViolation {
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    /// Keep the value of a passing check, or record the failure.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(reason) => {
                self.push(field, reason);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Finish the pass: `Ok` only when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.inner.is_empty() {
            Ok(())
        } else {
            Err(self.into_errors())
        }
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors {
            violations: self.inner,
        }
    }
}

// =========================================================================
// Per-field checks
// =========================================================================

pub fn check_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("must not be empty".into());
    }
    Ok(())
}

pub fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("must not be empty".into());
    }
    let len = name.chars().count();
    if len > NAME_MAX_CHARS {
        return Err(format!(
            "must be at most {} characters, got {}",
            NAME_MAX_CHARS, len
        ));
    }
    Ok(())
}

pub fn check_city(city: &str) -> Result<(), String> {
    if city.trim().is_empty() {
        return Err("must not be empty".into());
    }
    Ok(())
}

/// Narrow a raw age to the stored width once it is in range.
pub fn check_age(age: i64) -> Result<u8, String> {
    if age <= AGE_LOWER_EXCLUSIVE || age >= AGE_UPPER_EXCLUSIVE {
        return Err(format!(
            "must be greater than {} and less than {}, got {}",
            AGE_LOWER_EXCLUSIVE, AGE_UPPER_EXCLUSIVE, age
        ));
    }
    u8::try_from(age).map_err(|_| format!("out of range: {}", age))
}

pub fn check_gender(gender: &str) -> Result<Gender, String> {
    gender.parse()
}

/// Height and weight share the same rule.
pub fn check_measurement(value: f64) -> Result<f64, String> {
    if !value.is_finite() {
        return Err("must be a finite number".into());
    }
    if value <= 0.0 {
        return Err(format!("must be greater than 0, got {}", value));
    }
    Ok(value)
}

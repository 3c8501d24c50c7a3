//! Partial updates and merging.

use serde_json::Value;

use super::patient::{PatientRecord, StoredPatient};
use crate::validation::{
    check_age, check_city, check_gender, check_measurement, check_name, PayloadReader,
    ValidationErrors,
};

/// A sparse patch over a patient record. The id is never patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl PatientUpdate {
    /// Keys accepted in an update payload.
    pub const FIELDS: [&'static str; 6] = ["name", "city", "age", "gender", "height", "weight"];

    /// Read an update payload. Present fields must satisfy their constraint.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = PayloadReader::new(payload, &Self::FIELDS);

        let name = reader.string("name", false);
        let name = reader.verify("name", name, |v| check_name(v));
        let city = reader.string("city", false);
        let city = reader.verify("city", city, |v| check_city(v));
        let age = reader.integer("age", false);
        let age = reader.verify("age", age, |v| check_age(*v));
        let gender = reader.string("gender", false);
        let gender = reader.verify("gender", gender, |v| check_gender(v));
        let height = reader.number("height", false);
        let height = reader.verify("height", height, |v| check_measurement(*v));
        let weight = reader.number("weight", false);
        let weight = reader.verify("weight", weight, |v| check_measurement(*v));

        if !reader.is_clean() {
            return Err(reader.into_errors());
        }

        Ok(Self {
            name,
            city,
            age,
            gender,
            height,
            weight,
        })
    }
}

/// Apply `patch` over the stored fields of `id`, producing a freshly
/// validated record.
///
/// Absent fields keep their stored value. Only the merged candidate is
/// validated, so a patch may repair a stored record that no longer passes.
pub fn merge(
    id: &str,
    existing: &StoredPatient,
    patch: &PatientUpdate,
) -> Result<PatientRecord, ValidationErrors> {
    let mut candidate = existing.to_input(id);
    if let Some(name) = &patch.name {
        candidate.name = name.clone();
    }
    if let Some(city) = &patch.city {
        candidate.city = city.clone();
    }
    if let Some(age) = patch.age {
        candidate.age = age;
    }
    if let Some(gender) = &patch.gender {
        candidate.gender = gender.clone();
    }
    if let Some(height) = patch.height {
        candidate.height = height;
    }
    if let Some(weight) = patch.weight {
        candidate.weight = weight;
    }

    PatientRecord::new(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{derive, Gender, NewPatient, Verdict};
    use proptest::prelude::*;
    use serde_json::json;

    fn existing() -> PatientRecord {
        PatientRecord::new(NewPatient {
            id: "P003".into(),
            name: "Karan Mehta".into(),
            city: "Mumbai".into(),
            age: 45,
            gender: "male".into(),
            height: 1.75,
            weight: 85.0,
        })
        .unwrap()
    }

    #[test]
    fn test_weight_only_patch() {
        let before = existing();
        let patch = PatientUpdate {
            weight: Some(100.0),
            ..Default::default()
        };

        let after = merge("P003", &before.to_stored(), &patch).unwrap();
        assert_eq!(after.id(), "P003");
        assert_eq!(after.name(), before.name());
        assert_eq!(after.city(), before.city());
        assert_eq!(after.age(), before.age());
        assert_eq!(after.gender(), before.gender());
        assert_eq!(after.height(), before.height());
        assert_eq!(after.weight(), 100.0);
        assert_eq!(after.bmi(), 32.65);
        assert_eq!(after.verdict(), Verdict::Obese);

        // Input untouched
        assert_eq!(before.weight(), 85.0);
        assert_eq!(before.verdict(), Verdict::Normal);
    }

    #[test]
    fn test_empty_patch_rebuilds_same_record() {
        let before = existing();
        let patch = PatientUpdate::default();
        assert_eq!(merge("P003", &before.to_stored(), &patch).unwrap(), before);
    }

    #[test]
    fn test_patch_repairs_invalid_stored_record() {
        let mut stored = existing().to_stored();
        stored.height = 0.0;
        assert!(PatientRecord::from_stored("P003", &stored).is_err());

        let patch = PatientUpdate {
            height: Some(1.7),
            ..Default::default()
        };
        let repaired = merge("P003", &stored, &patch).unwrap();
        assert_eq!(repaired.height(), 1.7);
        assert_eq!(repaired.metrics(), derive(1.7, 85.0));

        let unrelated = PatientUpdate {
            city: Some("Pune".into()),
            ..Default::default()
        };
        let errors = merge("P003", &stored, &unrelated).unwrap_err();
        assert_eq!(errors.fields(), vec!["height"]);
    }

    #[test]
    fn test_invalid_patch_fails_like_create() {
        let patch = PatientUpdate {
            height: Some(-1.0),
            gender: Some("robot".into()),
            ..Default::default()
        };
        let errors = merge("P003", &existing().to_stored(), &patch).unwrap_err();
        assert_eq!(errors.fields(), vec!["gender", "height"]);
    }

    #[test]
    fn test_gender_patch() {
        let patch = PatientUpdate {
            gender: Some("others".into()),
            ..Default::default()
        };
        let after = merge("P003", &existing().to_stored(), &patch).unwrap();
        assert_eq!(after.gender(), Gender::Others);
    }

    #[test]
    fn test_from_json_patch() {
        let patch = PatientUpdate::from_json(&json!({"city": "Pune", "age": 46})).unwrap();
        assert_eq!(patch.city.as_deref(), Some("Pune"));
        assert_eq!(patch.age, Some(46));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_from_json_rejects_id_and_nulls() {
        let errors =
            PatientUpdate::from_json(&json!({"id": "P999", "weight": null, "age": "40"})).unwrap_err();
        assert_eq!(errors.fields(), vec!["id", "age", "weight"]);
    }

    proptest! {
        #[test]
        fn prop_weight_patch_only_touches_weight(weight in 1.0f64..300.0) {
            let before = existing();
            let patch = PatientUpdate { weight: Some(weight), ..Default::default() };
            let after = merge("P003", &before.to_stored(), &patch).unwrap();

            prop_assert_eq!(after.name(), before.name());
            prop_assert_eq!(after.city(), before.city());
            prop_assert_eq!(after.age(), before.age());
            prop_assert_eq!(after.gender(), before.gender());
            prop_assert_eq!(after.height(), before.height());
            prop_assert_eq!(after.metrics(), derive(before.height(), weight));
        }
    }
}

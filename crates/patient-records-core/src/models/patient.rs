//! Patient models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::metrics::{derive, HealthMetrics, Verdict};
use crate::validation::{
    check_age, check_city, check_gender, check_id, check_measurement, check_name,
    PayloadReader, ValidationErrors, Violations,
};

/// Patient gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "others" => Ok(Gender::Others),
            other => Err(format!(
                "must be one of male, female, others, got {:?}",
                other
            )),
        }
    }
}

/// Unvalidated input for creating a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    /// Height in meters
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
}

impl NewPatient {
    /// Keys accepted in a create payload.
    pub const FIELDS: [&'static str; 7] =
        ["id", "name", "city", "age", "gender", "height", "weight"];

    /// Read a create payload, reporting type and constraint failures together.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = PayloadReader::new(payload, &Self::FIELDS);

        let id = reader.string("id", true);
        let id = reader.verify("id", id, |v| check_id(v));
        let name = reader.string("name", true);
        let name = reader.verify("name", name, |v| check_name(v));
        let city = reader.string("city", true);
        let city = reader.verify("city", city, |v| check_city(v));
        let age = reader.integer("age", true);
        let age = reader.verify("age", age, |v| check_age(*v));
        let gender = reader.string("gender", true);
        let gender = reader.verify("gender", gender, |v| check_gender(v));
        let height = reader.number("height", true);
        let height = reader.verify("height", height, |v| check_measurement(*v));
        let weight = reader.number("weight", true);
        let weight = reader.verify("weight", weight, |v| check_measurement(*v));

        match (id, name, city, age, gender, height, weight) {
            (Some(id), Some(name), Some(city), Some(age), Some(gender), Some(height), Some(weight))
                if reader.is_clean() =>
            {
                Ok(Self {
                    id,
                    name,
                    city,
                    age,
                    gender,
                    height,
                    weight,
                })
            }
            _ => Err(reader.into_errors()),
        }
    }
}

/// A validated patient with derived health metrics.
///
/// Only constructible through validation, and immutable afterwards, so the
/// BMI and verdict always match the measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    id: String,
    name: String,
    city: String,
    age: u8,
    gender: Gender,
    height: f64,
    weight: f64,
    #[serde(flatten)]
    metrics: HealthMetrics,
}

impl PatientRecord {
    /// Validate every field and derive metrics.
    pub fn new(input: NewPatient) -> Result<Self, ValidationErrors> {
        let mut v = Violations::new();

        let id = v.check("id", check_id(&input.id));
        let name = v.check("name", check_name(&input.name));
        let city = v.check("city", check_city(&input.city));
        let age = v.check("age", check_age(input.age));
        let gender = v.check("gender", check_gender(&input.gender));
        let height = v.check("height", check_measurement(input.height));
        let weight = v.check("weight", check_measurement(input.weight));

        match (id, name, city, age, gender, height, weight) {
            (Some(()), Some(()), Some(()), Some(age), Some(gender), Some(height), Some(weight)) => {
                Ok(Self {
                    id: input.id,
                    name: input.name,
                    city: input.city,
                    age,
                    gender,
                    height,
                    weight,
                    metrics: derive(height, weight),
                })
            }
            _ => Err(v.into_errors()),
        }
    }

    /// Rebuild a record from its persisted form, re-validating it.
    pub fn from_stored(id: &str, stored: &StoredPatient) -> Result<Self, ValidationErrors> {
        Self::new(stored.to_input(id))
    }

    /// Persisted form (drops the id and the derived values).
    pub fn to_stored(&self) -> StoredPatient {
        StoredPatient {
            name: self.name.clone(),
            city: self.city.clone(),
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// Height in meters.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Weight in kilograms.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> f64 {
        self.metrics.bmi
    }

    pub fn verdict(&self) -> Verdict {
        self.metrics.verdict
    }

    pub fn metrics(&self) -> HealthMetrics {
        self.metrics
    }
}

/// A patient as persisted in the collection, keyed externally by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPatient {
    pub name: String,
    pub city: String,
    pub age: u8,
    pub gender: Gender,
    /// Absent in hand-edited storage loads as 0
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub weight: f64,
}

impl StoredPatient {
    /// Metrics for this entry, if its measurements allow derivation.
    pub fn metrics(&self) -> Option<HealthMetrics> {
        let height = check_measurement(self.height).ok()?;
        let weight = check_measurement(self.weight).ok()?;
        Some(derive(height, weight))
    }

    pub(crate) fn to_input(&self, id: &str) -> NewPatient {
        NewPatient {
            id: id.to_string(),
            name: self.name.clone(),
            city: self.city.clone(),
            age: i64::from(self.age),
            gender: self.gender.as_str().to_string(),
            height: self.height,
            weight: self.weight,
        }
    }
}

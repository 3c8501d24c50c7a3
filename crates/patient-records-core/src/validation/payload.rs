//! Strict reading of JSON payloads.
//!
//! Values are never coerced across types: `"21"` is not an age and `21.5` is
//! not an integer. Integers are accepted where a float is expected.

use serde_json::{Map, Value};

use super::{ValidationErrors, Violations};

/// Field-by-field reader over a JSON object that collects violations.
pub struct PayloadReader<'a> {
    object: Option<&'a Map<String, Value>>,
    violations: Violations,
}

impl<'a> PayloadReader<'a> {
    /// Start reading `payload`, rejecting any key not in `known`.
    pub fn new(payload: &'a Value, known: &[&str]) -> Self {
        let mut violations = Violations::new();
        let object = payload.as_object();

        match object {
            Some(map) => {
                for key in map.keys() {
                    if !known.contains(&key.as_str()) {
                        violations.push(key, "unknown field");
                    }
                }
            }
            None => violations.push(
                "body",
                format!("expected an object, found {}", kind_of(payload)),
            ),
        }

        Self { object, violations }
    }

    /// Read a string field.
    pub fn string(&mut self, field: &str, required: bool) -> Option<String> {
        self.read(field, required, |value| match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(format!("expected a string, found {}", kind_of(other))),
        })
    }

    /// Read an integer field. Floats and numeric strings are rejected.
    pub fn integer(&mut self, field: &str, required: bool) -> Option<i64> {
        self.read(field, required, |value| match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(i),
                None if n.is_f64() => Err(format!("expected an integer, found float {}", n)),
                None => Err(format!("integer out of range: {}", n)),
            },
            other => Err(format!("expected an integer, found {}", kind_of(other))),
        })
    }

    /// Read a float field.
    pub fn number(&mut self, field: &str, required: bool) -> Option<f64> {
        self.read(field, required, |value| match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| format!("number not representable: {}", n)),
            other => Err(format!("expected a number, found {}", kind_of(other))),
        })
    }

    /// Apply a constraint to a value that was read successfully.
    pub fn verify<T, U>(
        &mut self,
        field: &str,
        value: Option<T>,
        check: impl FnOnce(&T) -> Result<U, String>,
    ) -> Option<T> {
        let value = value?;
        self.violations.check(field, check(&value)).map(|_| value)
    }

    /// True when nothing has failed so far.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.violations.into_errors()
    }

    fn read<T>(
        &mut self,
        field: &str,
        required: bool,
        extract: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Option<T> {
        let object = self.object?;
        match object.get(field) {
            None if required => {
                self.violations.push(field, "field required");
                None
            }
            None => None,
            Some(Value::Null) => {
                self.violations.push(field, "must not be null");
                None
            }
            Some(value) => self.violations.check(field, extract(value)),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_string_is_not_an_integer() {
        let payload = json!({"age": "21"});
        let mut reader = PayloadReader::new(&payload, &["age"]);
        assert_eq!(reader.integer("age", true), None);

        let errors = reader.into_errors();
        assert_eq!(errors.fields(), vec!["age"]);
        assert!(errors.violations()[0].reason.contains("found string"));
    }

    #[test]
    fn test_float_is_not_an_integer() {
        let payload = json!({"age": 21.5});
        let mut reader = PayloadReader::new(&payload, &["age"]);
        assert_eq!(reader.integer("age", true), None);
        assert!(!reader.is_clean());
    }

    #[test]
    fn test_integer_is_accepted_as_number() {
        let payload = json!({"weight": 70});
        let mut reader = PayloadReader::new(&payload, &["weight"]);
        assert_eq!(reader.number("weight", true), Some(70.0));
        assert!(reader.is_clean());
    }

    #[test]
    fn test_unknown_and_missing_fields() {
        let payload = json!({"bmi": 22.0});
        let mut reader = PayloadReader::new(&payload, &["name"]);
        assert_eq!(reader.string("name", true), None);

        let errors = reader.into_errors();
        assert!(errors.has_field("bmi"));
        assert!(errors.has_field("name"));
    }

    #[test]
    fn test_optional_absent_is_clean_but_null_is_not() {
        let payload = json!({"city": null});
        let mut reader = PayloadReader::new(&payload, &["name", "city"]);
        assert_eq!(reader.string("name", false), None);
        assert!(reader.is_clean());
        assert_eq!(reader.string("city", false), None);
        assert!(!reader.is_clean());
    }

    #[test]
    fn test_non_object_payload() {
        let payload = json!([1, 2, 3]);
        let mut reader = PayloadReader::new(&payload, &["name"]);
        assert_eq!(reader.string("name", true), None);
        assert_eq!(reader.into_errors().fields(), vec!["body"]);
    }
}

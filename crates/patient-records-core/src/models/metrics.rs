//! Health metrics derived from height and weight.

use std::fmt;

use serde::{Deserialize, Serialize};

/// BMI values below this are underweight.
pub const UNDERWEIGHT_BELOW: f64 = 18.5;
/// BMI values at or above this are obese.
pub const OBESE_FROM: f64 = 30.0;

/// Health verdict for a BMI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Underweight,
    Normal,
    Obese,
}

impl Verdict {
    /// Classify a (rounded) BMI value.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < UNDERWEIGHT_BELOW {
            Verdict::Underweight
        } else if bmi < OBESE_FROM {
            Verdict::Normal
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived metrics for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// Body mass index, rounded to two decimals
    pub bmi: f64,
    /// Classification of `bmi`
    pub verdict: Verdict,
}

/// Compute BMI and verdict from height (m) and weight (kg).
///
/// The quotient is rounded to two decimals with ties going away from zero,
/// so `18.125` becomes `18.13`. The verdict is taken from the rounded value.
/// Callers pass validated, strictly positive measurements.
pub fn derive(height: f64, weight: f64) -> HealthMetrics {
    let bmi = round_2dp(weight / (height * height));
    HealthMetrics {
        bmi,
        verdict: Verdict::from_bmi(bmi),
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Simple truth values attached to atoms.

use serde::{Deserialize, Serialize};

/// Personality constant of the count-to-confidence conversion.
pub const DEFAULT_K: f64 = 800.0;

/// A (strength, confidence) pair quantifying belief in an atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    /// Probability-like strength in [0, 1].
    pub strength: f64,

    /// Confidence in the strength, in [0, 1).
    pub confidence: f64,
}

impl TruthValue {
    /// Create a truth value, clamping both components into [0, 1].
    pub fn new(strength: f64, confidence: f64) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// The mean of a simple truth value is its strength.
    pub fn mean(&self) -> f64 {
        self.strength
    }

    /// A truth value carrying no evidence at all.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Build a truth value whose confidence derives from a sample count.
    pub fn from_count(strength: f64, count: usize) -> Self {
        Self::new(strength, count_to_confidence(count))
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        Self {
            strength: 1.0,
            confidence: 0.0,
        }
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(stv {} {})", self.strength, self.confidence)
    }
}

/// Convert a number of observations into a confidence: `n / (n + K)`.
///
/// Monotonically increasing in `n` and always strictly below 1.
pub fn count_to_confidence(count: usize) -> f64 {
    let n = count as f64;
    n / (n + DEFAULT_K)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_truth_value() {
        let tv = TruthValue::default();
        assert_eq!(tv.strength, 1.0);
        assert_eq!(tv.confidence, 0.0);
        assert!(tv.is_default());
    }

    #[test]
    fn test_clamping() {
        let tv = TruthValue::new(1.4, -0.1);
        assert_eq!(tv.strength, 1.0);
        assert_eq!(tv.confidence, 0.0);
    }

    #[test]
    fn test_count_to_confidence_is_monotonic_and_saturating() {
        assert_eq!(count_to_confidence(0), 0.0);
        assert!((count_to_confidence(800) - 0.5).abs() < 1e-12);

        let mut last = 0.0;
        for n in [1, 8, 80, 8_000, 8_000_000] {
            let c = count_to_confidence(n);
            assert!(c > last);
            assert!(c < 1.0);
            last = c;
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TruthValue::new(0.5, 0.25).to_string(), "(stv 0.5 0.25)");
    }
}

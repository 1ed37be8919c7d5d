//! Measurement probability distribution over the 4-qubit basis

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of simulated qubits.
pub const QUBITS: usize = 4;

/// Number of basis states (2^QUBITS).
pub const BASIS_STATES: usize = 1 << QUBITS;

/// Failure to rebuild a distribution from its stored text form
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("distribution is not a JSON array of numbers: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("distribution has {0} entries, expected {BASIS_STATES}")]
    WrongLength(usize),

    #[error("distribution entry {index} is invalid: {value}")]
    InvalidEntry { index: usize, value: f64 },
}

/// Probabilities indexed by basis state.
///
/// Bit `i` of the index is the value of qubit `i`, so index 1 is qubit 0 set
/// and index 8 is qubit 3 set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution([f64; BASIS_STATES]);

impl Distribution {
    pub fn from_probabilities(probabilities: [f64; BASIS_STATES]) -> Self {
        Self(probabilities)
    }

    pub fn probabilities(&self) -> &[f64; BASIS_STATES] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Basis index with the largest probability (lowest index wins ties).
    pub fn most_likely(&self) -> (usize, f64) {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::MIN), |best, (index, p)| {
                if p > best.1 {
                    (index, p)
                } else {
                    best
                }
            })
    }

    /// Qubit values of a basis index, written qubit 0 first.
    pub fn bitstring(index: usize) -> String {
        (0..QUBITS)
            .map(|qubit| if index >> qubit & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Text form stored in the `distribution` column.
    pub fn to_json_text(&self) -> String {
        // An array of f64 always serializes.
        serde_json::to_string(&self.0.to_vec()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn from_json_text(text: &str) -> Result<Self, DistributionError> {
        let values: Vec<f64> = serde_json::from_str(text)?;
        let probabilities: [f64; BASIS_STATES] = values
            .as_slice()
            .try_into()
            .map_err(|_| DistributionError::WrongLength(values.len()))?;

        if let Some((index, value)) = probabilities
            .iter()
            .copied()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || *p < 0.0)
        {
            return Err(DistributionError::InvalidEntry { index, value });
        }

        Ok(Self(probabilities))
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, p) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:.4}", p)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform() -> Distribution {
        Distribution::from_probabilities([1.0 / BASIS_STATES as f64; BASIS_STATES])
    }

    #[test]
    fn test_json_text_roundtrip() {
        let mut probabilities = [0.0; BASIS_STATES];
        probabilities[3] = 0.25;
        probabilities[15] = 0.75;
        let dist = Distribution::from_probabilities(probabilities);

        let text = dist.to_json_text();
        assert!(text.starts_with('['));
        assert_eq!(Distribution::from_json_text(&text).unwrap(), dist);
    }

    #[test]
    fn test_json_text_rejects_bad_input() {
        assert!(matches!(
            Distribution::from_json_text("[0.5, 0.5]"),
            Err(DistributionError::WrongLength(2))
        ));
        assert!(matches!(
            Distribution::from_json_text("not json"),
            Err(DistributionError::Malformed(_))
        ));

        let mut values = vec![0.0; BASIS_STATES];
        values[4] = -0.1;
        let text = serde_json::to_string(&values).unwrap();
        assert!(matches!(
            Distribution::from_json_text(&text),
            Err(DistributionError::InvalidEntry { index: 4, .. })
        ));
    }

    #[test]
    fn test_most_likely() {
        let mut probabilities = [0.0; BASIS_STATES];
        probabilities[9] = 0.6;
        probabilities[2] = 0.4;
        let (index, p) = Distribution::from_probabilities(probabilities).most_likely();
        assert_eq!(index, 9);
        assert_eq!(p, 0.6);

        assert_eq!(uniform().most_likely().0, 0);
    }

    #[test]
    fn test_bitstring_is_qubit_zero_first() {
        assert_eq!(Distribution::bitstring(0), "0000");
        assert_eq!(Distribution::bitstring(1), "1000");
        assert_eq!(Distribution::bitstring(8), "0001");
        assert_eq!(Distribution::bitstring(15), "1111");
    }

    #[test]
    fn test_total() {
        assert!((uniform().total() - 1.0).abs() < 1e-12);
    }
}

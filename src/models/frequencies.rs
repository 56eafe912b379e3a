// frequencies.rs - Equilibrium frequency resolution

use nalgebra::DMatrix;

use super::eigen::EigenSystem;
use crate::error::{Error, Result};

const SUM_TOLERANCE: f64 = 1e-6;

/// Where a model's equilibrium frequencies come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FrequencySource {
    /// Exogenous frequencies, validated against the state count
    Supplied(Vec<f64>),
    /// Read off `exp(Q * origin_length)` once rates are final
    Derived { origin_length: f64 },
}

/// Check a supplied frequency vector against a model of `state_count` states.
pub fn validate(frequencies: &[f64], state_count: usize) -> Result<()> {
    if frequencies.len() != state_count {
        return Err(Error::DimensionMismatch {
            expected: state_count,
            found: frequencies.len(),
        });
    }
    if let Some(bad) = frequencies.iter().find(|f| !f.is_finite() || **f < 0.0) {
        return Err(Error::config(format!(
            "frequencies must be non-negative, found {}",
            bad
        )));
    }
    let total: f64 = frequencies.iter().sum();
    if (total - 1.0).abs() > SUM_TOLERANCE {
        return Err(Error::config(format!(
            "frequencies must sum to 1, found {:.6}",
            total
        )));
    }
    Ok(())
}

/// Derive frequencies for the collapsed covarion model.
///
/// Takes `P = exp(Q * origin_length)` from the unnormalised system, averages
/// the first and last rows, pins the pending slot 0 at exactly zero and
/// renormalises.
pub fn derive_from_origin(system: &EigenSystem, origin_length: f64) -> Result<Vec<f64>> {
    let p = system.exponentiate(origin_length);
    let n = p.nrows();
    let mut frequencies: Vec<f64> = (0..n)
        .map(|j| ((p[(0, j)] + p[(n - 1, j)]) / 2.0).max(0.0))
        .collect();
    frequencies[0] = 0.0;

    let total: f64 = frequencies.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(Error::numerical(format!(
            "derived frequencies have no mass at origin length {}",
            origin_length
        )));
    }
    for f in frequencies.iter_mut() {
        *f /= total;
    }
    Ok(frequencies)
}

/// Expected substitution rate `sum_i(-Q[i][i] * f[i])` of a full generator.
pub fn expected_rate(generator: &DMatrix<f64>, frequencies: &[f64]) -> f64 {
    frequencies
        .iter()
        .enumerate()
        .map(|(i, f)| -generator[(i, i)] * f)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_validate_dimension() {
        let err = validate(&[0.5, 0.5], 3).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_validate_sum_and_sign() {
        assert!(validate(&[0.5, 0.6], 2).is_err());
        assert!(validate(&[1.5, -0.5], 2).is_err());
        assert!(validate(&[0.25, 0.75], 2).is_ok());
    }

    #[test]
    fn test_expected_rate() {
        let q = DMatrix::from_row_slice(2, 2, &[-2.0, 2.0, 1.0, -1.0]);
        assert_relative_eq!(expected_rate(&q, &[0.25, 0.75]), 1.25);
    }

    #[test]
    fn test_derived_frequencies_pin_pending_state() {
        let q = DMatrix::from_row_slice(3, 3, &[-1.0, 1.0, 0.0, 0.0, -0.5, 0.5, 0.0, 0.0, 0.0]);
        let system = EigenSystem::decompose(&q).unwrap();
        let f = derive_from_origin(&system, 1.0).unwrap();
        assert_eq!(f[0], 0.0);
        assert_relative_eq!(f.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(f[1] > 0.0 && f[2] > 0.0);
    }
}

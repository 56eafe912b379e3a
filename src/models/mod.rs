// mod.rs - Substitution model engine
//
// Every model kind is a `RateMatrixStrategy`. The shared scaffolding
// (frequency resolution, normalisation, cached eigensystem) lives in
// `SubstitutionModel`, which holds a strategy instead of being specialised.

use nalgebra::DMatrix;
use std::fmt::Debug;

use crate::error::Result;

pub mod birth_death;
pub mod covarion;
pub mod eigen;
pub mod factory;
pub mod frequencies;
pub mod ordinal;
pub mod substitution;

pub use birth_death::BirthDeath;
pub use covarion::BirthDeathCovarion;
pub use eigen::EigenSystem;
pub use factory::{ModelConfig, ModelFactory, ModelKind};
pub use frequencies::FrequencySource;
pub use ordinal::{NestedOrdinal, Ordinal};
pub use substitution::SubstitutionModel;

/// How a strategy obtains its equilibrium frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyPolicy {
    /// Frequencies are an exogenous input of matching dimension
    Supplied,
    /// Frequencies are read off the transition matrix over `origin_length`
    Derived { origin_length: f64 },
}

/// Builds the unnormalised generator for one model kind.
pub trait RateMatrixStrategy: Send + Sync + Debug {
    /// Short model name used in logs and reports
    fn name(&self) -> &'static str;

    /// Number of states, fixed for the lifetime of the strategy
    fn state_count(&self) -> usize;

    /// Off-diagonal rates `Q[i][j]`, `i != j`. The diagonal is ignored and
    /// filled by the engine so that every row sums to zero.
    fn off_diagonal_rates(&self, frequencies: &[f64]) -> DMatrix<f64>;

    /// Where the equilibrium frequencies come from
    fn frequency_policy(&self) -> FrequencyPolicy {
        FrequencyPolicy::Supplied
    }

    /// Update a named rate parameter, validating it first
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()>;

    /// Current named parameter values
    fn parameters(&self) -> Vec<(&'static str, f64)>;
}

/// Position of `(from, to)` in a flattened relative-rate array of length
/// `n * (n - 1)` that skips the diagonal row by row.
pub fn relative_rate_index(from: usize, to: usize, n: usize) -> usize {
    debug_assert!(from != to && from < n && to < n);
    if to < from {
        from * (n - 1) + to
    } else {
        from * (n - 1) + to - 1
    }
}

/// Expand a flattened relative-rate array into a full matrix with zero diagonal.
pub fn expand_relative_rates(rates: &[f64], n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            0.0
        } else {
            rates[relative_rate_index(i, j, n)]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_rate_index_skips_diagonal() {
        let n = 4;
        let mut seen = vec![false; n * (n - 1)];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let k = relative_rate_index(i, j, n);
                    assert!(!seen[k], "index {} used twice", k);
                    seen[k] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(relative_rate_index(0, 1, n), 0);
        assert_eq!(relative_rate_index(1, 0, n), 3);
        assert_eq!(relative_rate_index(3, 2, n), 11);
    }

    #[test]
    fn test_expand_relative_rates() {
        let rates: Vec<f64> = (1..=6).map(f64::from).collect();
        let m = expand_relative_rates(&rates, 3);
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m[(0, 1)], 1.0);
        assert_eq!(m[(0, 2)], 2.0);
        assert_eq!(m[(1, 0)], 3.0);
        assert_eq!(m[(1, 2)], 4.0);
        assert_eq!(m[(2, 0)], 5.0);
        assert_eq!(m[(2, 1)], 6.0);
    }
}

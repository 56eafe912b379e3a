// ordinal.rs - Ordinal and nested-ordinal generators

use nalgebra::DMatrix;

use super::{expand_relative_rates, relative_rate_index, RateMatrixStrategy};
use crate::error::{Error, Result};

/// States on a line `0..n-1`; only neighbours exchange, each at relative
/// rate 1. Rates into state `j` are scaled by its frequency.
#[derive(Debug, Clone)]
pub struct Ordinal {
    state_count: usize,
}

impl Ordinal {
    pub fn new(state_count: usize) -> Result<Self> {
        if state_count < 2 {
            return Err(Error::config(format!(
                "ordinal model needs at least 2 states, got {}",
                state_count
            )));
        }
        Ok(Self { state_count })
    }

    /// Flattened relative rates, length `n * (n - 1)`.
    pub fn relative_rates(&self) -> Vec<f64> {
        let n = self.state_count;
        let mut rates = vec![0.0; n * (n - 1)];
        for i in 0..n - 1 {
            rates[relative_rate_index(i, i + 1, n)] = 1.0;
            rates[relative_rate_index(i + 1, i, n)] = 1.0;
        }
        rates
    }
}

impl RateMatrixStrategy for Ordinal {
    fn name(&self) -> &'static str {
        "ordinal"
    }

    fn state_count(&self) -> usize {
        self.state_count
    }

    fn off_diagonal_rates(&self, frequencies: &[f64]) -> DMatrix<f64> {
        scale_by_frequencies(
            expand_relative_rates(&self.relative_rates(), self.state_count),
            frequencies,
        )
    }

    fn set_parameter(&mut self, name: &str, _value: f64) -> Result<()> {
        Err(Error::config(format!(
            "ordinal model has no parameter '{}'",
            name
        )))
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

/// Ordinal line `1..n-1` plus an out-of-system state 0 that every
/// in-system state can enter and leave at relative rate 1.
#[derive(Debug, Clone)]
pub struct NestedOrdinal {
    state_count: usize,
}

impl NestedOrdinal {
    pub fn new(state_count: usize) -> Result<Self> {
        if state_count < 3 {
            return Err(Error::config(format!(
                "nested ordinal model needs at least 3 states, got {}",
                state_count
            )));
        }
        Ok(Self { state_count })
    }

    /// Flattened relative rates, length `n * (n - 1)`.
    pub fn relative_rates(&self) -> Vec<f64> {
        let n = self.state_count;
        let mut rates = vec![0.0; n * (n - 1)];

        // row 0 and column 0: to and from the out-of-system state
        for j in 1..n {
            rates[relative_rate_index(0, j, n)] = 1.0;
            rates[relative_rate_index(j, 0, n)] = 1.0;
        }

        // in-system line; states 1 and n-1 have a single neighbour
        for i in 1..n - 1 {
            rates[relative_rate_index(i, i + 1, n)] = 1.0;
            rates[relative_rate_index(i + 1, i, n)] = 1.0;
        }
        rates
    }
}

impl RateMatrixStrategy for NestedOrdinal {
    fn name(&self) -> &'static str {
        "nested-ordinal"
    }

    fn state_count(&self) -> usize {
        self.state_count
    }

    fn off_diagonal_rates(&self, frequencies: &[f64]) -> DMatrix<f64> {
        scale_by_frequencies(
            expand_relative_rates(&self.relative_rates(), self.state_count),
            frequencies,
        )
    }

    fn set_parameter(&mut self, name: &str, _value: f64) -> Result<()> {
        Err(Error::config(format!(
            "nested ordinal model has no parameter '{}'",
            name
        )))
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

fn scale_by_frequencies(mut rates: DMatrix<f64>, frequencies: &[f64]) -> DMatrix<f64> {
    for (j, mut column) in rates.column_iter_mut().enumerate() {
        column *= frequencies[j];
    }
    rates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_adjacency_only() {
        let model = Ordinal::new(5).unwrap();
        let q = model.off_diagonal_rates(&[0.2; 5]);
        for i in 0..5usize {
            for j in 0..5usize {
                let expected = if i.abs_diff(j) == 1 { 0.2 } else { 0.0 };
                assert_eq!(q[(i, j)], expected, "entry ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_ordinal_frequency_scaling_is_asymmetric() {
        let model = Ordinal::new(3).unwrap();
        let q = model.off_diagonal_rates(&[0.5, 0.3, 0.2]);
        assert_eq!(q[(0, 1)], 0.3);
        assert_eq!(q[(1, 0)], 0.5);
        assert_eq!(q[(1, 2)], 0.2);
        assert_eq!(q[(2, 1)], 0.3);
        assert_eq!(q[(0, 2)], 0.0);
    }

    #[test]
    fn test_nested_ordinal_out_of_system_state() {
        let n = 5;
        let model = NestedOrdinal::new(n).unwrap();
        let q = model.off_diagonal_rates(&[1.0; 5]);
        for j in 1..n {
            assert_eq!(q[(0, j)], 1.0);
            assert_eq!(q[(j, 0)], 1.0);
        }
        // low boundary: state 1 only reaches 0 and 2
        assert_eq!(q[(1, 2)], 1.0);
        assert_eq!(q[(1, 3)], 0.0);
        assert_eq!(q[(1, 4)], 0.0);
        // high boundary: state 4 only reaches 0 and 3
        assert_eq!(q[(4, 3)], 1.0);
        assert_eq!(q[(4, 2)], 0.0);
        assert_eq!(q[(4, 1)], 0.0);
        // interior
        assert_eq!(q[(2, 1)], 1.0);
        assert_eq!(q[(2, 3)], 1.0);
        assert_eq!(q[(2, 4)], 0.0);
    }

    #[test]
    fn test_nested_ordinal_rate_count() {
        for n in 3..8 {
            let rates = NestedOrdinal::new(n).unwrap().relative_rates();
            let nonzero = rates.iter().filter(|&&r| r > 0.0).count();
            // 2(n-1) links to state 0 plus 2(n-2) in-system links
            assert_eq!(nonzero, 2 * (n - 1) + 2 * (n - 2));
        }
    }

    #[test]
    fn test_minimum_state_counts() {
        assert!(Ordinal::new(1).is_err());
        assert!(NestedOrdinal::new(2).is_err());
        assert!(Ordinal::new(2).is_ok());
        assert!(NestedOrdinal::new(3).is_ok());
    }
}

// birth_death.rs - Pseudo-Dollo birth-death generator

use nalgebra::DMatrix;

use super::RateMatrixStrategy;
use crate::error::{Error, Result};

/// Birth rate, fixed so that the death parameter reads as a probability.
pub const BIRTH_RATE: f64 = 1.0;

/// Birth-death model over 3 or 4 states.
///
/// State 0 is gain-pending, state 1 alive, state 2 dead. The optional
/// state 3 is a second absorbing absent state. Births `0 -> 1` happen at
/// [`BIRTH_RATE`], deaths `1 -> 2` at `death`; absorbing states never leave.
#[derive(Debug, Clone)]
pub struct BirthDeath {
    state_count: usize,
    death: f64,
}

impl BirthDeath {
    pub fn new(state_count: usize, death: f64) -> Result<Self> {
        if state_count != 3 && state_count != 4 {
            return Err(Error::config(format!(
                "birth-death model supports 3 or 4 states, got {}",
                state_count
            )));
        }
        validate_death(death)?;
        Ok(Self { state_count, death })
    }

    pub fn death(&self) -> f64 {
        self.death
    }

    /// Index of the dead state for this instance.
    pub fn death_state(&self) -> usize {
        2
    }
}

/// Death must not exceed the normalised birth rate.
pub(crate) fn validate_death(death: f64) -> Result<()> {
    if !death.is_finite() || death < 0.0 {
        return Err(Error::config(format!(
            "death parameter must be a non-negative number, got {}",
            death
        )));
    }
    if death > BIRTH_RATE {
        return Err(Error::config(format!(
            "death parameter {} exceeds the normalised birth rate {}",
            death, BIRTH_RATE
        )));
    }
    Ok(())
}

impl RateMatrixStrategy for BirthDeath {
    fn name(&self) -> &'static str {
        "birth-death"
    }

    fn state_count(&self) -> usize {
        self.state_count
    }

    fn off_diagonal_rates(&self, _frequencies: &[f64]) -> DMatrix<f64> {
        let mut q = DMatrix::zeros(self.state_count, self.state_count);
        q[(0, 1)] = BIRTH_RATE;
        q[(1, self.death_state())] = self.death;
        q
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "death" => {
                validate_death(value)?;
                self.death = value;
                Ok(())
            }
            _ => Err(Error::config(format!(
                "unknown birth-death parameter '{}'",
                name
            ))),
        }
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![("death", self.death)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_death_above_birth_rate_rejected() {
        let err = BirthDeath::new(3, 1.5).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_state_count_validated() {
        assert!(BirthDeath::new(2, 0.5).is_err());
        assert!(BirthDeath::new(5, 0.5).is_err());
        assert!(BirthDeath::new(4, 0.5).is_ok());
    }

    #[test]
    fn test_absorbing_states_have_no_outgoing_rate() {
        let model = BirthDeath::new(4, 0.3).unwrap();
        let q = model.off_diagonal_rates(&[0.25; 4]);
        assert_eq!(q[(0, 1)], 1.0);
        assert_eq!(q[(1, 2)], 0.3);
        for j in 0..4 {
            assert_eq!(q[(2, j)], 0.0);
            assert_eq!(q[(3, j)], 0.0);
        }
    }

    #[test]
    fn test_set_parameter_validates() {
        let mut model = BirthDeath::new(3, 0.2).unwrap();
        assert!(model.set_parameter("death", 2.0).is_err());
        assert_eq!(model.death(), 0.2);
        model.set_parameter("death", 0.7).unwrap();
        assert_eq!(model.parameters(), vec![("death", 0.7)]);
        assert!(model.set_parameter("birth", 1.0).is_err());
    }
}

// covarion.rs - Birth-death covarion generator with fast/slow hidden classes

use nalgebra::DMatrix;

use super::birth_death::{validate_death, BIRTH_RATE};
use super::{FrequencyPolicy, RateMatrixStrategy};
use crate::error::{Error, Result};

/// Damping of deaths while in the slow class in the reference model.
pub const DEFAULT_SLOW_FACTOR: f64 = 0.0;

/// Branch length over which the collapsed model reads off its frequencies.
pub const DEFAULT_ORIGIN_LENGTH: f64 = 1.0;

/// Birth-death chain duplicated into a fast and a slow class, with
/// switches `s1` (fast -> slow) and `s2` (slow -> fast).
///
/// Five states (collapsed): 0 pending, 1 alive/fast, 2 alive/slow,
/// 3 dead/fast, 4 dead/slow. Births enter the fast class.
///
/// Six states: 0/1 pending fast/slow, 2/3 alive fast/slow,
/// 4/5 dead fast/slow.
#[derive(Debug, Clone)]
pub struct BirthDeathCovarion {
    state_count: usize,
    death: f64,
    switch_to_slow: f64,
    switch_to_fast: f64,
    slow_factor: f64,
    origin_length: f64,
}

impl BirthDeathCovarion {
    pub fn new(state_count: usize, death: f64, s1: f64, s2: f64) -> Result<Self> {
        if state_count != 5 && state_count != 6 {
            return Err(Error::config(format!(
                "birth-death covarion supports 5 or 6 states, got {}",
                state_count
            )));
        }
        validate_death(death)?;
        validate_switch("s1", s1)?;
        validate_switch("s2", s2)?;
        Ok(Self {
            state_count,
            death,
            switch_to_slow: s1,
            switch_to_fast: s2,
            slow_factor: DEFAULT_SLOW_FACTOR,
            origin_length: DEFAULT_ORIGIN_LENGTH,
        })
    }

    pub fn with_slow_factor(mut self, slow_factor: f64) -> Result<Self> {
        validate_slow_factor(slow_factor)?;
        self.slow_factor = slow_factor;
        Ok(self)
    }

    pub fn with_origin_length(mut self, origin_length: f64) -> Result<Self> {
        if !origin_length.is_finite() || origin_length <= 0.0 {
            return Err(Error::config(format!(
                "origin length must be positive, got {}",
                origin_length
            )));
        }
        self.origin_length = origin_length;
        Ok(self)
    }

    /// True for the five-state form whose frequencies are derived.
    pub fn is_collapsed(&self) -> bool {
        self.state_count == 5
    }

    /// Visible value (0 absent, 1 present) of a hidden state.
    pub fn visible_state(&self, state: usize) -> u8 {
        let alive = if self.is_collapsed() {
            state == 1 || state == 2
        } else {
            state == 2 || state == 3
        };
        u8::from(alive)
    }
}

fn validate_switch(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::config(format!(
            "switch rate {} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_slow_factor(value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::config(format!(
            "slow factor must lie in [0, 1], got {}",
            value
        )));
    }
    Ok(())
}

impl RateMatrixStrategy for BirthDeathCovarion {
    fn name(&self) -> &'static str {
        "birth-death-covarion"
    }

    fn state_count(&self) -> usize {
        self.state_count
    }

    fn off_diagonal_rates(&self, _frequencies: &[f64]) -> DMatrix<f64> {
        let n = self.state_count;
        let mut q = DMatrix::zeros(n, n);
        let s1 = self.switch_to_slow;
        let s2 = self.switch_to_fast;
        let slow_death = self.death * self.slow_factor;

        // (fast, slow) index pairs per visible level
        let levels: Vec<(usize, usize)> = if self.is_collapsed() {
            q[(0, 1)] = BIRTH_RATE;
            q[(1, 3)] = self.death;
            q[(2, 4)] = slow_death;
            vec![(1, 2), (3, 4)]
        } else {
            q[(0, 2)] = BIRTH_RATE;
            q[(1, 3)] = BIRTH_RATE;
            q[(2, 4)] = self.death;
            q[(3, 5)] = slow_death;
            vec![(0, 1), (2, 3), (4, 5)]
        };

        for (fast, slow) in levels {
            q[(fast, slow)] = s1;
            q[(slow, fast)] = s2;
        }
        q
    }

    fn frequency_policy(&self) -> FrequencyPolicy {
        if self.is_collapsed() {
            FrequencyPolicy::Derived {
                origin_length: self.origin_length,
            }
        } else {
            FrequencyPolicy::Supplied
        }
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "death" => {
                validate_death(value)?;
                self.death = value;
            }
            "s1" => {
                validate_switch(name, value)?;
                self.switch_to_slow = value;
            }
            "s2" => {
                validate_switch(name, value)?;
                self.switch_to_fast = value;
            }
            "slow_factor" => {
                validate_slow_factor(value)?;
                self.slow_factor = value;
            }
            _ => {
                return Err(Error::config(format!(
                    "unknown covarion parameter '{}'",
                    name
                )))
            }
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("death", self.death),
            ("s1", self.switch_to_slow),
            ("s2", self.switch_to_fast),
            ("slow_factor", self.slow_factor),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_layout() {
        let model = BirthDeathCovarion::new(5, 0.4, 0.1, 0.2).unwrap();
        let q = model.off_diagonal_rates(&[]);
        assert_eq!(q[(0, 1)], 1.0);
        assert_eq!(q[(0, 2)], 0.0);
        assert_eq!(q[(1, 3)], 0.4);
        // reference slow factor of zero: no deaths while slow
        assert_eq!(q[(2, 4)], 0.0);
        assert_eq!(q[(1, 2)], 0.1);
        assert_eq!(q[(2, 1)], 0.2);
        assert_eq!(q[(3, 4)], 0.1);
        assert_eq!(q[(4, 3)], 0.2);
        assert!(matches!(
            model.frequency_policy(),
            FrequencyPolicy::Derived { .. }
        ));
    }

    #[test]
    fn test_six_state_layout() {
        let model = BirthDeathCovarion::new(6, 0.4, 0.1, 0.2)
            .unwrap()
            .with_slow_factor(0.5)
            .unwrap();
        let q = model.off_diagonal_rates(&[]);
        assert_eq!(q[(0, 2)], 1.0);
        assert_eq!(q[(1, 3)], 1.0);
        assert_eq!(q[(2, 4)], 0.4);
        assert_eq!(q[(3, 5)], 0.2);
        assert_eq!(q[(0, 1)], 0.1);
        assert_eq!(q[(5, 4)], 0.2);
        assert_eq!(model.frequency_policy(), FrequencyPolicy::Supplied);
    }

    #[test]
    fn test_visible_states() {
        let collapsed = BirthDeathCovarion::new(5, 0.4, 0.1, 0.2).unwrap();
        let visible: Vec<u8> = (0..5).map(|s| collapsed.visible_state(s)).collect();
        assert_eq!(visible, vec![0, 1, 1, 0, 0]);

        let full = BirthDeathCovarion::new(6, 0.4, 0.1, 0.2).unwrap();
        let visible: Vec<u8> = (0..6).map(|s| full.visible_state(s)).collect();
        assert_eq!(visible, vec![0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(BirthDeathCovarion::new(4, 0.4, 0.1, 0.2).is_err());
        assert!(BirthDeathCovarion::new(5, 1.5, 0.1, 0.2).is_err());
        assert!(BirthDeathCovarion::new(5, 0.4, -0.1, 0.2).is_err());
        let model = BirthDeathCovarion::new(5, 0.4, 0.1, 0.2).unwrap();
        assert!(model.clone().with_slow_factor(1.5).is_err());
        assert!(model.with_origin_length(0.0).is_err());
    }
}

// datatype.rs - Character datatypes for presence/absence and hidden-state models

use crate::error::{Error, Result};

/// Characters treated as missing data in every datatype.
pub const MISSING_CHARS: [char; 4] = ['?', '-', 'N', 'n'];

/// Maps observed characters onto the (possibly hidden) states of a model.
///
/// `death_state` belongs to the instance: two datatypes with different
/// layouts never share it.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDataType {
    name: &'static str,
    state_count: usize,
    death_state: Option<usize>,
    /// Observed code -> compatible model states
    codes: Vec<Vec<usize>>,
}

impl CharacterDataType {
    /// Plain 0/1 presence-absence data.
    pub fn binary() -> Self {
        Self {
            name: "binary",
            state_count: 2,
            death_state: None,
            codes: vec![vec![0], vec![1]],
        }
    }

    /// Presence/absence observed through a 3- or 4-state birth-death chain.
    /// Absence is compatible with pending and every dead state.
    pub fn birth_death(state_count: usize) -> Result<Self> {
        let absent = match state_count {
            3 => vec![0, 2],
            4 => vec![0, 2, 3],
            _ => {
                return Err(Error::config(format!(
                    "birth-death datatype supports 3 or 4 states, got {}",
                    state_count
                )))
            }
        };
        Ok(Self {
            name: "birth-death",
            state_count,
            death_state: Some(2),
            codes: vec![absent, vec![1]],
        })
    }

    /// Presence/absence observed through the fast/slow covarion layout.
    pub fn covarion(state_count: usize) -> Result<Self> {
        let (absent, present, death_state) = match state_count {
            5 => (vec![0, 3, 4], vec![1, 2], 3),
            6 => (vec![0, 1, 4, 5], vec![2, 3], 4),
            _ => {
                return Err(Error::config(format!(
                    "covarion datatype supports 5 or 6 states, got {}",
                    state_count
                )))
            }
        };
        Ok(Self {
            name: "covarion",
            state_count,
            death_state: Some(death_state),
            codes: vec![absent, present],
        })
    }

    /// Ordered states written as digits `0..n-1`.
    pub fn ordered(state_count: usize) -> Result<Self> {
        if !(2..=10).contains(&state_count) {
            return Err(Error::config(format!(
                "ordered datatype supports 2 to 10 states, got {}",
                state_count
            )));
        }
        Ok(Self {
            name: "ordered",
            state_count,
            death_state: None,
            codes: (0..state_count).map(|s| vec![s]).collect(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn death_state(&self) -> Option<usize> {
        self.death_state
    }

    /// Number of distinct observable codes.
    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// Decode an observed character: `Some(code)`, `None` for missing data.
    pub fn decode(&self, c: char) -> Result<Option<u8>> {
        if MISSING_CHARS.contains(&c) {
            return Ok(None);
        }
        match c.to_digit(10) {
            Some(d) if (d as usize) < self.codes.len() => Ok(Some(d as u8)),
            _ => Err(Error::input(format!(
                "character '{}' is not valid for the {} datatype",
                c, self.name
            ))),
        }
    }

    /// Model states compatible with an observed code; missing data allows all.
    pub fn states_for(&self, code: Option<u8>) -> Vec<usize> {
        match code.and_then(|c| self.codes.get(c as usize)) {
            Some(states) => states.clone(),
            None => (0..self.state_count).collect(),
        }
    }

    /// Tip partial likelihood vector for an observed code.
    pub fn tip_partials(&self, code: Option<u8>) -> Vec<f64> {
        let mut partials = vec![0.0; self.state_count];
        for s in self.states_for(code) {
            partials[s] = 1.0;
        }
        partials
    }

    /// True when the observed code hides more than one model state.
    pub fn is_ambiguous(&self, code: Option<u8>) -> bool {
        self.states_for(code).len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_decode() {
        let dt = CharacterDataType::binary();
        assert_eq!(dt.decode('0').unwrap(), Some(0));
        assert_eq!(dt.decode('1').unwrap(), Some(1));
        assert_eq!(dt.decode('?').unwrap(), None);
        assert!(dt.decode('2').is_err());
        assert!(dt.decode('x').is_err());
    }

    #[test]
    fn test_birth_death_absence_is_ambiguous() {
        let dt = CharacterDataType::birth_death(4).unwrap();
        assert_eq!(dt.states_for(Some(0)), vec![0, 2, 3]);
        assert_eq!(dt.states_for(Some(1)), vec![1]);
        assert_eq!(dt.tip_partials(Some(1)), vec![0.0, 1.0, 0.0, 0.0]);
        assert!(dt.is_ambiguous(Some(0)));
        assert!(!dt.is_ambiguous(Some(1)));
    }

    #[test]
    fn test_death_state_is_per_instance() {
        let bd = CharacterDataType::birth_death(3).unwrap();
        let five = CharacterDataType::covarion(5).unwrap();
        let six = CharacterDataType::covarion(6).unwrap();
        assert_eq!(bd.death_state(), Some(2));
        assert_eq!(five.death_state(), Some(3));
        assert_eq!(six.death_state(), Some(4));
        assert_eq!(CharacterDataType::binary().death_state(), None);
    }

    #[test]
    fn test_covarion_codes_partition_states() {
        for n in [5, 6] {
            let dt = CharacterDataType::covarion(n).unwrap();
            let mut all: Vec<usize> = dt.states_for(Some(0));
            all.extend(dt.states_for(Some(1)));
            all.sort_unstable();
            assert_eq!(all, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_missing_allows_all_states() {
        let dt = CharacterDataType::covarion(5).unwrap();
        assert_eq!(dt.tip_partials(None), vec![1.0; 5]);
    }

    #[test]
    fn test_ordered_limits() {
        assert!(CharacterDataType::ordered(1).is_err());
        assert!(CharacterDataType::ordered(11).is_err());
        let dt = CharacterDataType::ordered(4).unwrap();
        assert_eq!(dt.decode('3').unwrap(), Some(3));
        assert!(dt.decode('4').is_err());
    }
}

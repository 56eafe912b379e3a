// factory.rs - Typed model configuration and construction by name

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::covarion::{DEFAULT_ORIGIN_LENGTH, DEFAULT_SLOW_FACTOR};
use super::{
    BirthDeath, BirthDeathCovarion, NestedOrdinal, Ordinal, RateMatrixStrategy, SubstitutionModel,
};
use crate::data::CharacterDataType;
use crate::error::{Error, Result};

/// Model kinds the engine can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    BirthDeath,
    Covarion,
    Ordinal,
    NestedOrdinal,
}

impl ModelKind {
    pub fn description(&self) -> &'static str {
        match self {
            ModelKind::BirthDeath => "Pseudo-Dollo birth-death model (3 or 4 states)",
            ModelKind::Covarion => "Birth-death covarion with fast/slow classes (5 or 6 states)",
            ModelKind::Ordinal => "Ordinal model with adjacent-state exchanges",
            ModelKind::NestedOrdinal => "Ordinal model with an out-of-system state 0",
        }
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "birth-death" | "birthdeath" | "dollo" => Ok(ModelKind::BirthDeath),
            "covarion" | "birth-death-covarion" => Ok(ModelKind::Covarion),
            "ordinal" => Ok(ModelKind::Ordinal),
            "nested-ordinal" | "nestedordinal" => Ok(ModelKind::NestedOrdinal),
            _ => Err(format!(
                "Unknown model '{}'. Use: birth-death, covarion, ordinal, nested-ordinal",
                s
            )),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::BirthDeath => "birth-death",
            ModelKind::Covarion => "covarion",
            ModelKind::Ordinal => "ordinal",
            ModelKind::NestedOrdinal => "nested-ordinal",
        };
        write!(f, "{}", name)
    }
}

/// Validated model configuration.
///
/// - `kind`, `state_count`: required
/// - `death`: required for birth-death and covarion, in `[0, 1]`
/// - `s1`, `s2`: covarion switch rates, default 0
/// - `slow_factor`: covarion, default 0, in `[0, 1]`
/// - `origin_length`: collapsed covarion only, default 1
/// - `frequencies`: required unless the model derives them (collapsed
///   covarion), in which case it must be absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub state_count: usize,
    pub death: Option<f64>,
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub slow_factor: Option<f64>,
    pub origin_length: Option<f64>,
    pub frequencies: Option<Vec<f64>>,
}

impl ModelConfig {
    pub fn new(kind: ModelKind, state_count: usize) -> Self {
        Self {
            kind,
            state_count,
            death: None,
            s1: None,
            s2: None,
            slow_factor: None,
            origin_length: None,
            frequencies: None,
        }
    }

    pub fn strategy(&self) -> Result<Box<dyn RateMatrixStrategy>> {
        match self.kind {
            ModelKind::BirthDeath => {
                self.forbid("s1", self.s1)?;
                self.forbid("s2", self.s2)?;
                self.forbid("slow_factor", self.slow_factor)?;
                self.forbid("origin_length", self.origin_length)?;
                Ok(Box::new(BirthDeath::new(self.state_count, self.require_death()?)?))
            }
            ModelKind::Covarion => {
                let mut model = BirthDeathCovarion::new(
                    self.state_count,
                    self.require_death()?,
                    self.s1.unwrap_or(0.0),
                    self.s2.unwrap_or(0.0),
                )?
                .with_slow_factor(self.slow_factor.unwrap_or(DEFAULT_SLOW_FACTOR))?;
                if model.is_collapsed() {
                    model =
                        model.with_origin_length(self.origin_length.unwrap_or(DEFAULT_ORIGIN_LENGTH))?;
                } else {
                    self.forbid("origin_length", self.origin_length)?;
                }
                Ok(Box::new(model))
            }
            ModelKind::Ordinal | ModelKind::NestedOrdinal => {
                self.forbid("death", self.death)?;
                self.forbid("s1", self.s1)?;
                self.forbid("s2", self.s2)?;
                self.forbid("slow_factor", self.slow_factor)?;
                self.forbid("origin_length", self.origin_length)?;
                if self.kind == ModelKind::Ordinal {
                    Ok(Box::new(Ordinal::new(self.state_count)?))
                } else {
                    Ok(Box::new(NestedOrdinal::new(self.state_count)?))
                }
            }
        }
    }

    pub fn build(&self) -> Result<SubstitutionModel> {
        SubstitutionModel::new(self.strategy()?, self.frequencies.clone())
    }

    /// Character datatype matching this model's state layout.
    pub fn datatype(&self) -> Result<CharacterDataType> {
        match self.kind {
            ModelKind::BirthDeath => CharacterDataType::birth_death(self.state_count),
            ModelKind::Covarion => CharacterDataType::covarion(self.state_count),
            ModelKind::Ordinal | ModelKind::NestedOrdinal => {
                CharacterDataType::ordered(self.state_count)
            }
        }
    }

    fn require_death(&self) -> Result<f64> {
        self.death
            .ok_or_else(|| Error::config(format!("{} model requires 'death'", self.kind)))
    }

    fn forbid(&self, name: &str, value: Option<f64>) -> Result<()> {
        match value {
            Some(_) => Err(Error::config(format!(
                "'{}' is not a parameter of the {} model",
                name, self.kind
            ))),
            None => Ok(()),
        }
    }
}

pub struct ModelFactory;

impl ModelFactory {
    /// Create a model from a kind name and a `key=value,...` parameter
    /// string. Frequencies are given as `frequencies=0.2:0.5:0.3`.
    pub fn create(kind: &str, state_count: usize, config: &str) -> Result<SubstitutionModel> {
        Self::config_from_str(kind, state_count, config)?.build()
    }

    pub fn config_from_str(kind: &str, state_count: usize, config: &str) -> Result<ModelConfig> {
        let kind = ModelKind::from_str(kind).map_err(Error::Configuration)?;
        let mut model = ModelConfig::new(kind, state_count);

        for (key, value) in Self::parse_config(config)? {
            match key.as_str() {
                "death" => model.death = Some(parse_number(&key, &value)?),
                "s1" => model.s1 = Some(parse_number(&key, &value)?),
                "s2" => model.s2 = Some(parse_number(&key, &value)?),
                "slow_factor" => model.slow_factor = Some(parse_number(&key, &value)?),
                "origin_length" => model.origin_length = Some(parse_number(&key, &value)?),
                "frequencies" => {
                    let freqs = value
                        .split(':')
                        .map(|v| parse_number(&key, v))
                        .collect::<Result<Vec<f64>>>()?;
                    model.frequencies = Some(freqs);
                }
                _ => {
                    return Err(Error::config(format!(
                        "unknown model parameter '{}'",
                        key
                    )))
                }
            }
        }
        Ok(model)
    }

    /// List all available model kinds
    pub fn list_available() -> Vec<(ModelKind, &'static str)> {
        [
            ModelKind::BirthDeath,
            ModelKind::Covarion,
            ModelKind::Ordinal,
            ModelKind::NestedOrdinal,
        ]
        .into_iter()
        .map(|k| (k, k.description()))
        .collect()
    }

    /// Split a `key=value,...` string into pairs. A pair without exactly
    /// one `=`, an empty key or a repeated key is a configuration error.
    pub fn parse_config(config_str: &str) -> Result<Vec<(String, String)>> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        for pair in config_str.split(',').filter(|p| !p.trim().is_empty()) {
            let parts: Vec<&str> = pair.split('=').collect();
            let [key, value] = parts.as_slice() else {
                return Err(Error::config(format!(
                    "malformed model parameter '{}', expected key=value",
                    pair.trim()
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::config(format!(
                    "model parameter '{}' has no name",
                    pair.trim()
                )));
            }
            if pairs.iter().any(|(k, _)| k == key) {
                return Err(Error::config(format!(
                    "model parameter '{}' given more than once",
                    key
                )));
            }
            pairs.push((key.to_string(), value.trim().to_string()));
        }

        Ok(pairs)
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::config(format!("invalid value '{}' for '{}'", value, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = ModelFactory::parse_config("death=0.5, s1=0.1").unwrap();
        assert_eq!(
            config,
            vec![
                ("death".to_string(), "0.5".to_string()),
                ("s1".to_string(), "0.1".to_string())
            ]
        );
        assert!(ModelFactory::parse_config("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_parameters_rejected() {
        for config in [
            "death=0.4,s1 0.3",
            "death=0.4,s1=0.3=0.1",
            "death=0.4,=0.3",
            "death=0.4,death=0.2",
        ] {
            let err = ModelFactory::create("covarion", 5, config).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{}", config);
        }
    }

    #[test]
    fn test_create_birth_death() {
        let model = ModelFactory::create("birth-death", 3, "death=0.5,frequencies=0.2:0.5:0.3").unwrap();
        assert_eq!(model.state_count(), 3);
        assert_eq!(model.parameters(), vec![("death", 0.5)]);
    }

    #[test]
    fn test_death_bound_fails_before_matrix_is_built() {
        let err = ModelFactory::create("birth-death", 3, "death=1.5,frequencies=0.2:0.5:0.3")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_forbidden_and_missing_parameters() {
        assert!(ModelFactory::create("ordinal", 3, "death=0.5,frequencies=0.2:0.5:0.3").is_err());
        assert!(ModelFactory::create("birth-death", 3, "frequencies=0.2:0.5:0.3").is_err());
        assert!(ModelFactory::create("covarion", 6, "death=0.5,origin_length=2").is_err());
        assert!(ModelFactory::create("birth-death", 3, "death=0.5,birth=1").is_err());
        assert!(ModelFactory::create("nonexistent", 3, "").is_err());
    }

    #[test]
    fn test_collapsed_covarion_without_frequencies() {
        let model = ModelFactory::create("covarion", 5, "death=0.3,s1=0.2,s2=0.1").unwrap();
        let f = model.frequencies().unwrap();
        assert_eq!(f[0], 0.0);
    }

    #[test]
    fn test_list_available() {
        let kinds = ModelFactory::list_available();
        assert_eq!(kinds.len(), 4);
        assert!(kinds.iter().any(|(k, _)| *k == ModelKind::NestedOrdinal));
    }

    #[test]
    fn test_datatype_matches_state_count() {
        let config = ModelFactory::config_from_str("covarion", 5, "death=0.3").unwrap();
        assert_eq!(config.datatype().unwrap().state_count(), 5);
    }
}

// substitution.rs - Composed substitution model with a cached eigensystem

use log::debug;
use nalgebra::DMatrix;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::eigen::EigenSystem;
use super::frequencies::{self, FrequencySource};
use super::{FrequencyPolicy, RateMatrixStrategy};
use crate::error::{Error, Result};

/// Normalised generator, its frequencies and its eigensystem.
///
/// Published as an immutable `Arc`; a parameter change replaces it.
#[derive(Debug)]
pub struct ModelSnapshot {
    pub generator: DMatrix<f64>,
    pub frequencies: Vec<f64>,
    pub eigen: EigenSystem,
}

#[derive(Debug, Default)]
struct CacheState {
    dirty: bool,
    snapshot: Option<Arc<ModelSnapshot>>,
}

/// Continuous-time Markov substitution model.
///
/// The strategy supplies the unnormalised rates; this type fills the
/// diagonal, resolves frequencies, scales the generator to one expected
/// substitution per unit time and exponentiates it on demand.
#[derive(Debug)]
pub struct SubstitutionModel {
    strategy: Box<dyn RateMatrixStrategy>,
    frequencies: FrequencySource,
    cache: Mutex<CacheState>,
    rebuilds: AtomicUsize,
}

impl SubstitutionModel {
    /// Build a model. Strategies with supplied frequencies require
    /// `frequencies`; strategies that derive them reject it.
    pub fn new(
        strategy: Box<dyn RateMatrixStrategy>,
        frequencies: Option<Vec<f64>>,
    ) -> Result<Self> {
        let n = strategy.state_count();
        let source = match (strategy.frequency_policy(), frequencies) {
            (FrequencyPolicy::Supplied, Some(f)) => {
                frequencies::validate(&f, n)?;
                let generator = fill_diagonal(strategy.off_diagonal_rates(&f));
                let rate = frequencies::expected_rate(&generator, &f);
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(Error::config(format!(
                        "{} model has no expected substitutions under frequencies {:?}",
                        strategy.name(),
                        f
                    )));
                }
                FrequencySource::Supplied(f)
            }
            (FrequencyPolicy::Supplied, None) => {
                return Err(Error::config(format!(
                    "{} model requires equilibrium frequencies",
                    strategy.name()
                )))
            }
            (FrequencyPolicy::Derived { origin_length }, None) => {
                FrequencySource::Derived { origin_length }
            }
            (FrequencyPolicy::Derived { .. }, Some(_)) => {
                return Err(Error::config(format!(
                    "{} model derives its frequencies; do not supply them",
                    strategy.name()
                )))
            }
        };

        Ok(Self {
            strategy,
            frequencies: source,
            cache: Mutex::new(CacheState {
                dirty: true,
                snapshot: None,
            }),
            rebuilds: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn state_count(&self) -> usize {
        self.strategy.state_count()
    }

    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        self.strategy.parameters()
    }

    /// Change a rate parameter and invalidate the cached eigensystem.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.strategy.set_parameter(name, value)?;
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .dirty = true;
        Ok(())
    }

    /// Mark the cache dirty without changing parameters.
    pub fn invalidate(&self) {
        self.lock_cache().dirty = true;
    }

    /// Number of times the eigensystem has been recomputed.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Current snapshot, recomputed under the cache lock when dirty.
    pub fn snapshot(&self) -> Result<Arc<ModelSnapshot>> {
        let mut cache = self.lock_cache();
        if !cache.dirty {
            if let Some(snapshot) = &cache.snapshot {
                return Ok(Arc::clone(snapshot));
            }
        }

        let snapshot = Arc::new(self.rebuild()?);
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        debug!(
            "rebuilt {} eigensystem ({} states, parameters {:?})",
            self.strategy.name(),
            self.strategy.state_count(),
            self.strategy.parameters()
        );
        cache.snapshot = Some(Arc::clone(&snapshot));
        cache.dirty = false;
        Ok(snapshot)
    }

    /// Normalised generator: rows sum to zero and
    /// `sum_i(-Q[i][i] * f[i]) == 1`.
    pub fn rate_matrix(&self) -> Result<DMatrix<f64>> {
        Ok(self.snapshot()?.generator.clone())
    }

    pub fn frequencies(&self) -> Result<Vec<f64>> {
        Ok(self.snapshot()?.frequencies.clone())
    }

    /// `exp(Q * rate * branch_length)`
    pub fn transition_probabilities(&self, branch_length: f64, rate: f64) -> Result<DMatrix<f64>> {
        if !branch_length.is_finite() || branch_length < 0.0 {
            return Err(Error::config(format!(
                "branch length must be non-negative, got {}",
                branch_length
            )));
        }
        if !rate.is_finite() || rate < 0.0 {
            return Err(Error::config(format!(
                "rate must be non-negative, got {}",
                rate
            )));
        }
        Ok(self.snapshot()?.eigen.exponentiate(branch_length * rate))
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rebuild(&self) -> Result<ModelSnapshot> {
        match &self.frequencies {
            FrequencySource::Supplied(f) => {
                let generator = fill_diagonal(self.strategy.off_diagonal_rates(f));
                let rate = checked_rate(&generator, f)?;
                let generator = generator / rate;
                let eigen = EigenSystem::decompose(&generator)?;
                Ok(ModelSnapshot {
                    generator,
                    frequencies: f.clone(),
                    eigen,
                })
            }
            FrequencySource::Derived { origin_length } => {
                // rates of deriving strategies do not depend on frequencies
                let n = self.strategy.state_count();
                let placeholder = vec![1.0 / n as f64; n];
                let generator = fill_diagonal(self.strategy.off_diagonal_rates(&placeholder));
                let raw = EigenSystem::decompose(&generator)?;
                let f = frequencies::derive_from_origin(&raw, *origin_length)?;
                let rate = checked_rate(&generator, &f)?;
                Ok(ModelSnapshot {
                    generator: generator / rate,
                    frequencies: f,
                    eigen: raw.scaled(1.0 / rate),
                })
            }
        }
    }
}

fn checked_rate(generator: &DMatrix<f64>, frequencies: &[f64]) -> Result<f64> {
    let rate = frequencies::expected_rate(generator, frequencies);
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::numerical(format!(
            "cannot normalise generator with expected rate {}",
            rate
        )));
    }
    Ok(rate)
}

/// Set each diagonal entry to minus the sum of its row's off-diagonals.
pub fn fill_diagonal(mut rates: DMatrix<f64>) -> DMatrix<f64> {
    for i in 0..rates.nrows() {
        rates[(i, i)] = 0.0;
        let row_sum: f64 = rates.row(i).sum();
        rates[(i, i)] = -row_sum;
    }
    rates
}

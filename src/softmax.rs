//! Softmax backend selection over recency-weighted latency estimates.
//!
//! Notes:
//! - Estimates are latencies (costs). Selection negates them, so faster
//!   backends get more traffic, but every backend keeps nonzero probability.
//! - Updates use a constant step size, giving an exponential
//!   recency-weighted average that keeps tracking a drifting backend.
//!   A `1/n` step size would converge to the lifetime mean instead.
//! - The policy holds no RNG; callers inject one per draw.

use rand::Rng;

use crate::alloc::{cdf_index, softmax_costs};
use crate::decision::{Decision, DecisionNote};
use crate::error::{Error, Result};

/// Configuration for [`SoftmaxPolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoftmaxConfig {
    /// Temperature (> 0). Larger flattens toward uniform; smaller
    /// concentrates on the lowest estimate.
    pub temperature: f64,
    /// Constant step size `alpha` in `(0, 1]`.
    pub step_size: f64,
    /// Starting estimate for every backend.
    pub initial_estimate: f64,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            step_size: 0.1,
            initial_estimate: 0.0,
        }
    }
}

impl SoftmaxConfig {
    /// Check that the policy is well-defined.
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(Error::invalid(format!(
                "temperature must be finite and > 0, got {}",
                self.temperature
            )));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0 && self.step_size <= 1.0) {
            return Err(Error::invalid(format!(
                "step size must be in (0, 1], got {}",
                self.step_size
            )));
        }
        if !self.initial_estimate.is_finite() {
            return Err(Error::invalid(format!(
                "initial estimate must be finite, got {}",
                self.initial_estimate
            )));
        }
        Ok(())
    }
}

/// Softmax selection policy with per-backend latency estimates.
#[derive(Debug, Clone)]
pub struct SoftmaxPolicy {
    cfg: SoftmaxConfig,
    // Both aligned to backend index; length fixed at construction.
    estimates: Vec<f64>,
    counts: Vec<u64>,
}

impl SoftmaxPolicy {
    /// Create a policy over `arms` backends.
    ///
    /// Fails with [`Error::InvalidConfiguration`] if `arms == 0` or the
    /// configuration is invalid.
    pub fn new(arms: usize, cfg: SoftmaxConfig) -> Result<Self> {
        if arms == 0 {
            return Err(Error::invalid("backend count must be >= 1"));
        }
        cfg.validate()?;
        Ok(Self {
            cfg,
            estimates: vec![cfg.initial_estimate; arms],
            counts: vec![0; arms],
        })
    }

    /// Create a policy with explicit starting estimates.
    pub fn with_estimates(estimates: Vec<f64>, cfg: SoftmaxConfig) -> Result<Self> {
        let mut p = Self::new(estimates.len(), cfg)?;
        if let Some(bad) = estimates.iter().find(|e| !e.is_finite()) {
            return Err(Error::invalid(format!("estimates must be finite, got {bad}")));
        }
        p.estimates = estimates;
        Ok(p)
    }

    /// Number of backends.
    pub fn arms(&self) -> usize {
        self.estimates.len()
    }

    pub fn temperature(&self) -> f64 {
        self.cfg.temperature
    }

    pub fn step_size(&self) -> f64 {
        self.cfg.step_size
    }

    /// Current latency estimates (aligned to backend index).
    pub fn estimates(&self) -> &[f64] {
        &self.estimates
    }

    /// Selection counts (aligned to backend index).
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of updates applied.
    pub fn total_selections(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Index of the lowest estimate (ties go to the lowest index).
    pub fn best_estimate(&self) -> usize {
        let mut best = 0;
        for (i, &e) in self.estimates.iter().enumerate().skip(1) {
            if e < self.estimates[best] {
                best = i;
            }
        }
        best
    }

    /// Current selection probabilities (aligned to backend index).
    pub fn probabilities(&self) -> Vec<f64> {
        softmax_costs(&self.estimates, self.cfg.temperature)
    }

    /// Select a backend index in `[0, arms)`.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.decide(rng).chosen
    }

    /// Select a backend and return the probabilities used for selection.
    pub fn decide<R: Rng + ?Sized>(&self, rng: &mut R) -> Decision {
        let probs = self.probabilities();
        let u: f64 = rng.random();
        match cdf_index(&probs, u) {
            Some(chosen) => Decision {
                chosen,
                probs,
                notes: vec![DecisionNote::SampledFromDistribution],
            },
            None => Decision {
                chosen: self.arms() - 1,
                probs,
                notes: vec![
                    DecisionNote::SampledFromDistribution,
                    DecisionNote::NumericalFallbackToLastArm,
                ],
            },
        }
    }

    /// Incorporate one observed latency for `index`.
    ///
    /// `estimate += alpha * (latency - estimate)`. Out-of-range indices are
    /// ignored.
    pub fn update(&mut self, index: usize, latency: f64) {
        let (Some(estimate), Some(count)) =
            (self.estimates.get_mut(index), self.counts.get_mut(index))
        else {
            return;
        };
        *count = count.saturating_add(1);
        let error = latency - *estimate;
        *estimate += self.cfg.step_size * error;
    }
}

//! Simulated backends with drifting, noisy latency.
//!
//! Each call to [`Backend::sample`] first moves the hidden mean latency by a
//! small Gaussian step (persistent drift), then draws the observed latency
//! around the new mean. Both values are floored so nothing non-physical ever
//! reaches the policy.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};

/// Parameters of the backend latency model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackendConfig {
    /// Inclusive lower bound of the initial mean latency (whole time-units).
    pub initial_mean_min: u32,
    /// Exclusive upper bound of the initial mean latency (whole time-units).
    pub initial_mean_max: u32,
    /// Standard deviation of the per-call drift applied to the mean.
    pub drift_std: f64,
    /// Standard deviation of the observation noise around the mean.
    pub noise_std: f64,
    /// The mean latency never drops below this.
    pub mean_floor: f64,
    /// Observed latencies never drop below this.
    pub sample_floor: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            initial_mean_min: 50,
            initial_mean_max: 150,
            drift_std: 1.5,
            noise_std: 10.0,
            mean_floor: 10.0,
            sample_floor: 1.0,
        }
    }
}

impl BackendConfig {
    /// Check that the model is well-defined.
    pub fn validate(&self) -> Result<()> {
        if self.initial_mean_min >= self.initial_mean_max {
            return Err(Error::invalid(format!(
                "initial mean range [{}, {}) is empty",
                self.initial_mean_min, self.initial_mean_max
            )));
        }
        for (name, sd) in [("drift_std", self.drift_std), ("noise_std", self.noise_std)] {
            if !(sd.is_finite() && sd >= 0.0) {
                return Err(Error::invalid(format!(
                    "{name} must be finite and >= 0, got {sd}"
                )));
            }
        }
        for (name, floor) in [
            ("mean_floor", self.mean_floor),
            ("sample_floor", self.sample_floor),
        ] {
            if !(floor.is_finite() && floor >= 0.0) {
                return Err(Error::invalid(format!(
                    "{name} must be finite and >= 0, got {floor}"
                )));
            }
        }
        Ok(())
    }
}

/// One simulated backend.
#[derive(Debug, Clone)]
pub struct Backend {
    id: usize,
    mean_latency: f64,
    mean_floor: f64,
    sample_floor: f64,
    drift: Normal<f64>,
    noise: Normal<f64>,
    samples: u64,
}

impl Backend {
    /// Create a backend whose initial mean is drawn uniformly from the
    /// configured integer range.
    pub fn new<R: Rng + ?Sized>(id: usize, cfg: BackendConfig, rng: &mut R) -> Result<Self> {
        cfg.validate()?;
        let mean = f64::from(rng.random_range(cfg.initial_mean_min..cfg.initial_mean_max));
        Self::build(id, mean, cfg)
    }

    /// Create a backend with a known starting mean (clamped to the floor).
    pub fn with_mean(id: usize, mean_latency: f64, cfg: BackendConfig) -> Result<Self> {
        cfg.validate()?;
        if !mean_latency.is_finite() {
            return Err(Error::invalid(format!(
                "backend {id}: mean latency must be finite, got {mean_latency}"
            )));
        }
        Self::build(id, mean_latency, cfg)
    }

    fn build(id: usize, mean: f64, cfg: BackendConfig) -> Result<Self> {
        let drift = Normal::new(0.0, cfg.drift_std)
            .map_err(|e| Error::invalid(format!("drift distribution: {e}")))?;
        let noise = Normal::new(0.0, cfg.noise_std)
            .map_err(|e| Error::invalid(format!("noise distribution: {e}")))?;
        Ok(Self {
            id,
            mean_latency: mean.max(cfg.mean_floor),
            mean_floor: cfg.mean_floor,
            sample_floor: cfg.sample_floor,
            drift,
            noise,
            samples: 0,
        })
    }

    /// Stable index of this backend.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current (hidden) mean latency.
    pub fn mean_latency(&self) -> f64 {
        self.mean_latency
    }

    /// Number of samples produced so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Produce one latency observation.
    ///
    /// Drift is applied first and persists; the observation is then drawn
    /// around the updated mean.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let step = self.drift.sample(rng);
        self.mean_latency = drifted(self.mean_latency, step, self.mean_floor);
        self.samples = self.samples.saturating_add(1);
        observed(self.mean_latency, self.noise.sample(rng), self.sample_floor)
    }
}

fn drifted(mean: f64, step: f64, floor: f64) -> f64 {
    (mean + step).max(floor)
}

fn observed(mean: f64, noise: f64, floor: f64) -> f64 {
    (mean + noise).max(floor)
}

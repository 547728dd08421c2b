//! The simulation loop: select, sample, update, record.
//!
//! A [`Simulation`] owns its backends, its policy and its RNG. Nothing is
//! shared: each step reads the policy, samples exactly one backend, feeds the
//! latency back, and appends to the [`History`].
//!
//! ```rust
//! use softmux::{Simulation, SimulationConfig};
//!
//! let cfg = SimulationConfig { backends: 3, steps: 200, seed: 7, ..SimulationConfig::default() };
//! let mut sim = Simulation::new(&cfg).unwrap();
//! sim.run_configured();
//! let report = sim.report();
//! assert_eq!(report.running_averages.len(), 200);
//! assert_eq!(report.counts.iter().sum::<u64>(), 200);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::backend::{Backend, BackendConfig};
use crate::error::{Error, Result};
use crate::history::History;
use crate::policy::SelectionPolicy;
use crate::softmax::{SoftmaxConfig, SoftmaxPolicy};

/// Startup parameters for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Number of backends `K` (>= 1).
    pub backends: usize,
    /// Number of steps `N` (0 is allowed and yields an empty history).
    pub steps: usize,
    /// RNG seed; the same seed and config reproduce the same run.
    pub seed: u64,
    pub policy: SoftmaxConfig,
    pub backend: BackendConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            backends: 5,
            steps: 1_000,
            seed: 0,
            policy: SoftmaxConfig {
                temperature: 25.0,
                ..SoftmaxConfig::default()
            },
            backend: BackendConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backends == 0 {
            return Err(Error::invalid("backend count must be >= 1"));
        }
        self.policy.validate()?;
        self.backend.validate()
    }
}

/// What happened on one step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepRecord {
    /// Zero-based step number.
    pub step: usize,
    pub chosen: usize,
    pub latency: f64,
    /// Mean of all latencies observed up to and including this step.
    pub running_average: f64,
}

/// End-of-run summary handed to reporting and charting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    /// Temperature of the policy, when known.
    pub temperature: Option<f64>,
    /// Steps executed.
    pub steps: usize,
    /// Final per-backend latency estimates.
    pub estimates: Vec<f64>,
    /// Final per-backend selection counts.
    pub counts: Vec<u64>,
    /// Hidden per-backend mean latencies at the end of the run.
    pub true_means: Vec<f64>,
    /// Cumulative mean latency after each step.
    pub running_averages: Vec<f64>,
    pub final_average: Option<f64>,
}

impl Report {
    /// Backend with the lowest true mean at the end of the run.
    pub fn fastest_backend(&self) -> Option<usize> {
        argmin(&self.true_means)
    }

    /// Backend with the highest selection count (ties go low).
    pub fn most_selected(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, &c) in self.counts.iter().enumerate() {
            if best.is_none_or(|b| c > self.counts[b]) {
                best = Some(i);
            }
        }
        best
    }
}

fn argmin(xs: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &x) in xs.iter().enumerate() {
        if best.is_none_or(|b| x < xs[b]) {
            best = Some(i);
        }
    }
    best
}

/// A single-threaded run of a policy against simulated backends.
#[derive(Debug, Clone)]
pub struct Simulation<P = SoftmaxPolicy, R = StdRng> {
    backends: Vec<Backend>,
    policy: P,
    rng: R,
    history: History,
    temperature: Option<f64>,
    configured_steps: usize,
}

impl Simulation {
    /// Build a seeded softmax simulation from `cfg`.
    ///
    /// Initial backend means are drawn from the same seeded RNG that later
    /// drives selection and sampling.
    pub fn new(cfg: &SimulationConfig) -> Result<Self> {
        cfg.validate()?;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let backends = (0..cfg.backends)
            .map(|id| Backend::new(id, cfg.backend, &mut rng))
            .collect::<Result<Vec<_>>>()?;
        for b in &backends {
            info!(
                backend = b.id(),
                mean_latency = b.mean_latency(),
                "backend initial mean latency"
            );
        }
        let policy = SoftmaxPolicy::new(cfg.backends, cfg.policy)?;
        debug!(?cfg, "simulation configured");

        let mut sim = Self::from_parts(backends, policy, rng)?;
        sim.temperature = Some(cfg.policy.temperature);
        sim.configured_steps = cfg.steps;
        sim.history = History::with_capacity(cfg.steps);
        Ok(sim)
    }
}

impl<P: SelectionPolicy, R: Rng> Simulation<P, R> {
    /// Assemble a simulation from explicit parts.
    ///
    /// Fails if there are no backends or the policy's arm count does not match.
    pub fn from_parts(backends: Vec<Backend>, policy: P, rng: R) -> Result<Self> {
        if backends.is_empty() {
            return Err(Error::invalid("backend count must be >= 1"));
        }
        if policy.arms() != backends.len() {
            return Err(Error::invalid(format!(
                "policy covers {} backends but {} were given",
                policy.arms(),
                backends.len()
            )));
        }
        Ok(Self {
            backends,
            policy,
            rng,
            history: History::new(),
            temperature: None,
            configured_steps: 0,
        })
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Steps taken so far.
    pub fn steps_taken(&self) -> usize {
        self.history.len()
    }

    /// Index of the backend with the lowest current hidden mean.
    pub fn fastest_backend(&self) -> usize {
        let means: Vec<f64> = self.backends.iter().map(Backend::mean_latency).collect();
        argmin(&means).unwrap_or(0)
    }

    /// Run one select → sample → update → record cycle.
    pub fn step(&mut self) -> StepRecord {
        let decision = self.policy.decide(&mut self.rng);
        // A policy returning an out-of-range index is a bug in that policy;
        // clamp so the loop itself stays total.
        let chosen = decision.chosen.min(self.backends.len() - 1);
        let latency = self.backends[chosen].sample(&mut self.rng);
        self.policy.update(chosen, latency);
        let step = self.history.len();
        let running_average = self.history.push(chosen, latency);
        trace!(
            step,
            chosen,
            latency,
            running_average,
            fallback = decision.used_fallback(),
            "step"
        );
        StepRecord {
            step,
            chosen,
            latency,
            running_average,
        }
    }

    /// Run exactly `steps` cycles. No early stopping.
    pub fn run(&mut self, steps: usize) -> &History {
        info!(steps, backends = self.backends.len(), "simulation starting");
        for _ in 0..steps {
            self.step();
        }
        info!(
            steps_taken = self.history.len(),
            final_average = self.history.final_average(),
            "simulation finished"
        );
        &self.history
    }

    /// Run the step count given at construction (0 for `from_parts`).
    pub fn run_configured(&mut self) -> &History {
        self.run(self.configured_steps)
    }

    /// Summarize the run so far.
    pub fn report(&self) -> Report {
        Report {
            temperature: self.temperature,
            steps: self.history.len(),
            estimates: self.policy.estimates(),
            counts: self.policy.counts(),
            true_means: self.backends.iter().map(Backend::mean_latency).collect(),
            running_averages: self.history.running_averages().to_vec(),
            final_average: self.history.final_average(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Decision;

    /// Always picks the same backend.
    struct Fixed {
        arms: usize,
        pick: usize,
        seen: Vec<(usize, f64)>,
    }

    impl SelectionPolicy for Fixed {
        fn arms(&self) -> usize {
            self.arms
        }
        fn decide<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> Decision {
            Decision::deterministic(self.pick)
        }
        fn update(&mut self, index: usize, latency: f64) {
            self.seen.push((index, latency));
        }
        fn estimates(&self) -> Vec<f64> {
            vec![0.0; self.arms]
        }
        fn counts(&self) -> Vec<u64> {
            let mut c = vec![0; self.arms];
            for &(i, _) in &self.seen {
                c[i] += 1;
            }
            c
        }
    }

    fn backends(means: &[f64]) -> Vec<Backend> {
        means
            .iter()
            .enumerate()
            .map(|(i, &m)| Backend::with_mean(i, m, BackendConfig::default()).unwrap())
            .collect()
    }

    #[test]
    fn zero_steps_yield_empty_history() {
        let cfg = SimulationConfig {
            steps: 0,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&cfg).unwrap();
        assert!(sim.run_configured().is_empty());
        let r = sim.report();
        assert_eq!(r.steps, 0);
        assert!(r.running_averages.is_empty());
        assert_eq!(r.final_average, None);
        assert_eq!(r.counts, vec![0; 5]);
    }

    #[test]
    fn invalid_configs_fail_at_construction() {
        let zero_k = SimulationConfig {
            backends: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(&zero_k),
            Err(Error::InvalidConfiguration(_))
        ));
        let cold = SimulationConfig {
            policy: SoftmaxConfig {
                temperature: 0.0,
                ..SoftmaxConfig::default()
            },
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(&cold),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn from_parts_checks_arm_count() {
        let policy = SoftmaxPolicy::new(2, SoftmaxConfig::default()).unwrap();
        let err = Simulation::from_parts(backends(&[50.0]), policy, StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));

        let policy = SoftmaxPolicy::new(1, SoftmaxConfig::default()).unwrap();
        assert!(Simulation::from_parts(Vec::new(), policy, StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn loop_samples_the_chosen_backend_and_feeds_it_back() {
        let policy = Fixed {
            arms: 3,
            pick: 1,
            seen: Vec::new(),
        };
        let mut sim =
            Simulation::from_parts(backends(&[50.0, 90.0, 130.0]), policy, StdRng::seed_from_u64(4))
                .unwrap();
        sim.run(40);
        assert_eq!(sim.backends()[0].samples(), 0);
        assert_eq!(sim.backends()[1].samples(), 40);
        assert_eq!(sim.backends()[2].samples(), 0);

        let seen = &sim.policy().seen;
        assert_eq!(seen.len(), 40);
        assert!(seen.iter().all(|&(i, _)| i == 1));
        let observed: Vec<f64> = seen.iter().map(|&(_, l)| l).collect();
        assert_eq!(observed, sim.history().latencies());
        assert_eq!(sim.history().chosen(), &[1; 40]);
    }

    #[test]
    fn step_records_match_history() {
        let cfg = SimulationConfig {
            backends: 3,
            seed: 99,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&cfg).unwrap();
        let mut sum = 0.0;
        for i in 0..25 {
            let r = sim.step();
            sum += r.latency;
            assert_eq!(r.step, i);
            assert!(r.chosen < 3);
            assert!(r.latency >= 1.0);
            assert!((r.running_average - sum / (i + 1) as f64).abs() < 1e-9);
        }
        assert_eq!(sim.steps_taken(), 25);
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let cfg = SimulationConfig {
            backends: 4,
            steps: 300,
            seed: 2024,
            ..SimulationConfig::default()
        };
        let mut a = Simulation::new(&cfg).unwrap();
        let mut b = Simulation::new(&cfg).unwrap();
        a.run_configured();
        b.run_configured();
        assert_eq!(a.report(), b.report());

        let other = SimulationConfig { seed: 2025, ..cfg };
        let mut c = Simulation::new(&other).unwrap();
        c.run_configured();
        assert_ne!(a.report().running_averages, c.report().running_averages);
    }

    #[test]
    fn report_reflects_policy_and_backends() {
        let cfg = SimulationConfig {
            backends: 3,
            steps: 120,
            seed: 5,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&cfg).unwrap();
        sim.run_configured();
        let r = sim.report();
        assert_eq!(r.temperature, Some(25.0));
        assert_eq!(r.steps, 120);
        assert_eq!(r.counts.iter().sum::<u64>(), 120);
        assert_eq!(r.estimates, sim.policy().estimates());
        assert_eq!(r.true_means.len(), 3);
        assert!(r.true_means.iter().all(|&m| m >= 10.0));
        assert_eq!(r.final_average, r.running_averages.last().copied());
        assert_eq!(r.fastest_backend(), Some(sim.fastest_backend()));
    }

    #[test]
    fn report_helpers_break_ties_low() {
        let r = Report {
            temperature: None,
            steps: 0,
            estimates: vec![],
            counts: vec![3, 7, 7],
            true_means: vec![40.0, 20.0, 20.0],
            running_averages: vec![],
            final_average: None,
        };
        assert_eq!(r.most_selected(), Some(1));
        assert_eq!(r.fastest_backend(), Some(1));
    }
}

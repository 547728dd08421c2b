//! `softmux`: softmax backend selection under drifting, noisy latency.
//!
//! Designed for the "which backend right now?" problem: you repeatedly pick
//! one of K backends, observe how long the call took, and want traffic to
//! follow whichever backend is currently fastest, even as that changes.
//!
//! The crate has three pieces:
//! - [`Backend`]: a simulated backend whose mean latency drifts by a small
//!   Gaussian step on every call (floored at 10) and whose observations add
//!   Gaussian noise (floored at 1).
//! - [`SoftmaxPolicy`]: per-backend latency estimates with softmax selection
//!   over negated, temperature-scaled estimates, updated with a constant
//!   step size (exponential recency weighting).
//! - [`Simulation`]: the loop that composes them and records a [`History`]
//!   of latencies and running averages, summarized as a [`Report`].
//!
//! **Goals:**
//! - **Seedable**: every random draw goes through an injected `rand::Rng`;
//!   the same seed and config reproduce a run exactly.
//! - **Numerically stable**: softmax uses the max-shift trick, so extreme
//!   estimates never overflow, and every backend keeps nonzero probability.
//! - **Non-stationarity friendly**: a constant step size forgets old
//!   observations geometrically instead of converging to a lifetime mean.
//!
//! **Non-goals:**
//! - Not a production load balancer: no network calls, no concurrent
//!   dispatch, no persistence of learned state.
//! - Not a policy comparison framework.
//!
//! # Choosing a temperature
//!
//! With estimates `e_i` and temperature `tau`, the odds of picking backend `i`
//! over backend `j` are `exp((e_j - e_i) / tau)`. A backend 25 time-units
//! slower than the best at `tau = 25` is chosen `e ≈ 2.7` times less often.
//! Large `tau` approaches uniform exploration; small `tau` approaches greedy.
//!
//! # Example
//!
//! ```rust
//! use softmux::{Simulation, SimulationConfig, SoftmaxConfig};
//!
//! let cfg = SimulationConfig {
//!     backends: 3,
//!     steps: 500,
//!     seed: 1,
//!     policy: SoftmaxConfig { temperature: 25.0, ..SoftmaxConfig::default() },
//!     ..SimulationConfig::default()
//! };
//! let mut sim = Simulation::new(&cfg).unwrap();
//! sim.run_configured();
//! let report = sim.report();
//! assert_eq!(report.counts.iter().sum::<u64>(), 500);
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::{Error, Result};

mod alloc;
pub use alloc::*;

mod decision;
pub use decision::*;

mod backend;
pub use backend::*;

mod softmax;
pub use softmax::*;

mod policy;
pub use policy::SelectionPolicy;

mod history;
pub use history::*;

mod simulation;
pub use simulation::*;

#[cfg(feature = "chart")]
pub mod chart;

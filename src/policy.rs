//! `SelectionPolicy` trait: the seam between the simulation loop and the
//! policy it drives.
//!
//! [`SoftmaxPolicy`][crate::SoftmaxPolicy] is the policy this crate ships.
//! The trait exists so the loop can be driven by other (e.g. scripted)
//! policies in tests without changing [`Simulation`][crate::Simulation].

use rand::Rng;

use crate::decision::Decision;
use crate::softmax::SoftmaxPolicy;

/// Common interface for backend selection policies.
///
/// # Example
///
/// ```rust
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use softmux::{SelectionPolicy, SoftmaxConfig, SoftmaxPolicy};
///
/// fn one_round<P: SelectionPolicy>(policy: &mut P, rng: &mut StdRng) {
///     let d = policy.decide(rng);
///     // ... call backend `d.chosen`, measure latency ...
///     policy.update(d.chosen, 87.5);
/// }
///
/// let mut p = SoftmaxPolicy::new(3, SoftmaxConfig::default()).unwrap();
/// let mut rng = StdRng::seed_from_u64(0);
/// one_round(&mut p, &mut rng);
/// assert_eq!(p.total_selections(), 1);
/// ```
pub trait SelectionPolicy {
    /// Number of backends this policy chooses among.
    fn arms(&self) -> usize;

    /// Choose a backend. `chosen` must be in `[0, arms())`.
    fn decide<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Decision;

    /// Incorporate one observed latency for backend `index`.
    fn update(&mut self, index: usize, latency: f64);

    /// Current per-backend latency estimates.
    fn estimates(&self) -> Vec<f64>;

    /// Per-backend selection counts.
    fn counts(&self) -> Vec<u64>;
}

impl SelectionPolicy for SoftmaxPolicy {
    fn arms(&self) -> usize {
        SoftmaxPolicy::arms(self)
    }
    fn decide<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Decision {
        SoftmaxPolicy::decide(self, rng)
    }
    fn update(&mut self, index: usize, latency: f64) {
        SoftmaxPolicy::update(self, index, latency);
    }
    fn estimates(&self) -> Vec<f64> {
        SoftmaxPolicy::estimates(self).to_vec()
    }
    fn counts(&self) -> Vec<u64> {
        SoftmaxPolicy::counts(self).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SoftmaxConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run_generic<P: SelectionPolicy>(p: &mut P, rounds: usize) {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..rounds {
            let d = p.decide(&mut rng);
            assert!(d.chosen < p.arms());
            p.update(d.chosen, 100.0);
        }
    }

    #[test]
    fn softmax_implements_selection_policy() {
        let mut p = SoftmaxPolicy::new(3, SoftmaxConfig::default()).unwrap();
        run_generic(&mut p, 25);
        assert_eq!(SelectionPolicy::counts(&p).iter().sum::<u64>(), 25);
        assert_eq!(SelectionPolicy::estimates(&p).len(), 3);
    }
}

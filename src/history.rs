//! Append-only record of a run.
//!
//! The running average is maintained from a running sum, so each push is
//! O(1); [`History::recomputed_average`] rescans for cross-checking.

/// Per-step observations and the cumulative mean after each step.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct History {
    latencies: Vec<f64>,
    chosen: Vec<usize>,
    running_averages: Vec<f64>,
    sum: f64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for `steps` observations.
    pub fn with_capacity(steps: usize) -> Self {
        Self {
            latencies: Vec::with_capacity(steps),
            chosen: Vec::with_capacity(steps),
            running_averages: Vec::with_capacity(steps),
            sum: 0.0,
        }
    }

    /// Append one observation and return the new cumulative mean.
    pub fn push(&mut self, chosen: usize, latency: f64) -> f64 {
        self.latencies.push(latency);
        self.chosen.push(chosen);
        self.sum += latency;
        let avg = self.sum / self.latencies.len() as f64;
        self.running_averages.push(avg);
        avg
    }

    pub fn len(&self) -> usize {
        self.latencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latencies.is_empty()
    }

    /// Observed latency per step.
    pub fn latencies(&self) -> &[f64] {
        &self.latencies
    }

    /// Backend chosen per step.
    pub fn chosen(&self) -> &[usize] {
        &self.chosen
    }

    /// `avg[t] = mean(latency[0..=t])`.
    pub fn running_averages(&self) -> &[f64] {
        &self.running_averages
    }

    /// Cumulative mean after the last step (`None` when empty).
    pub fn final_average(&self) -> Option<f64> {
        self.running_averages.last().copied()
    }

    /// Cumulative mean after `step` computed by a full rescan.
    pub fn recomputed_average(&self, step: usize) -> Option<f64> {
        let xs = self.latencies.get(..=step)?;
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }

    /// Number of steps on which `backend` was chosen.
    pub fn selections_of(&self, backend: usize) -> usize {
        self.chosen.iter().filter(|&&c| c == backend).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_history_has_no_average() {
        let h = History::new();
        assert!(h.is_empty());
        assert_eq!(h.final_average(), None);
        assert_eq!(h.recomputed_average(0), None);
    }

    #[test]
    fn running_average_is_cumulative() {
        let mut h = History::with_capacity(3);
        assert_eq!(h.push(0, 10.0), 10.0);
        assert_eq!(h.push(1, 20.0), 15.0);
        assert_eq!(h.push(0, 60.0), 30.0);
        assert_eq!(h.running_averages(), &[10.0, 15.0, 30.0]);
        assert_eq!(h.chosen(), &[0, 1, 0]);
        assert_eq!(h.selections_of(0), 2);
        assert_eq!(h.final_average(), Some(30.0));
    }

    proptest! {
        #[test]
        fn incremental_average_matches_full_rescan(
            xs in proptest::collection::vec(1.0f64..500.0, 1..300),
        ) {
            let mut h = History::new();
            for (i, &x) in xs.iter().enumerate() {
                h.push(i % 3, x);
            }
            prop_assert_eq!(h.len(), xs.len());
            for t in 0..xs.len() {
                let a = h.running_averages()[t];
                let b = h.recomputed_average(t).unwrap();
                prop_assert!((a - b).abs() <= 1e-9 * b.abs(), "t={} a={} b={}", t, a, b);
            }
        }
    }
}

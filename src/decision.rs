//! Decision envelope for policy outputs.
//!
//! A `Decision` records what was chosen and the distribution it was drawn
//! from, so a single step can be logged or replayed without recomputing the
//! policy state.

/// Audit-friendly notes attached to a decision.
///
/// Prefer adding new variants over changing existing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecisionNote {
    /// Policy sampled from its probability distribution to choose a backend.
    SampledFromDistribution,

    /// The cumulative sum never exceeded the uniform draw (floating-point
    /// undershoot); the last backend was chosen as a safe fallback.
    NumericalFallbackToLastArm,

    /// The choice did not come from a distribution (scripted or fixed).
    DeterministicChoice,
}

/// A single policy decision.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decision {
    /// Index of the selected backend.
    pub chosen: usize,
    /// Per-backend probabilities used for this decision (empty when the
    /// policy has no distribution).
    pub probs: Vec<f64>,
    /// Notes describing why this choice happened.
    pub notes: Vec<DecisionNote>,
}

impl Decision {
    /// A decision with no distribution behind it.
    pub fn deterministic(chosen: usize) -> Self {
        Self {
            chosen,
            probs: Vec::new(),
            notes: vec![DecisionNote::DeterministicChoice],
        }
    }

    /// Probability the policy assigned to the chosen backend, if known.
    pub fn chosen_probability(&self) -> Option<f64> {
        self.probs.get(self.chosen).copied()
    }

    /// True if the numerical fallback was needed to produce this choice.
    pub fn used_fallback(&self) -> bool {
        self.notes.contains(&DecisionNote::NumericalFallbackToLastArm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_decision_has_no_probability() {
        let d = Decision::deterministic(2);
        assert_eq!(d.chosen, 2);
        assert_eq!(d.chosen_probability(), None);
        assert!(!d.used_fallback());
    }

    #[test]
    fn chosen_probability_reads_the_chosen_slot() {
        let d = Decision {
            chosen: 1,
            probs: vec![0.25, 0.75],
            notes: vec![DecisionNote::SampledFromDistribution],
        };
        assert_eq!(d.chosen_probability(), Some(0.75));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn decision_roundtrips_through_json() {
        let d = Decision {
            chosen: 0,
            probs: vec![1.0],
            notes: vec![DecisionNote::NumericalFallbackToLastArm],
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert!(back.used_fallback());
    }
}

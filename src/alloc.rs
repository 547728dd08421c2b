//! Allocation helpers (probabilities, categorical draws).
//!
//! Latency estimates are costs: lower is better. [`softmax_costs`] turns them
//! into a selection distribution, and [`sample_index`] draws from it with a
//! plain cumulative-sum scan so the only randomness consumed is a single
//! uniform `[0, 1)` value per draw.

use rand::Rng;

/// Compute the softmax selection distribution over per-arm latency costs.
///
/// Steps, in order:
/// 1. `reward[i] = -cost[i]`
/// 2. `scaled[i] = reward[i] / temperature`
/// 3. `shifted[i] = scaled[i] - max(scaled)` (max-trick, avoids overflow)
/// 4. `exp[i] = e^shifted[i]`
/// 5. `prob[i] = exp[i] / sum(exp)`
///
/// Returns an empty vector for empty input. If `temperature` is not finite
/// and positive, or the normalizer degenerates (non-finite inputs), the
/// result is uniform. If scaling overflows (a tiny temperature), all mass
/// goes to the lowest cost, split evenly on ties: the zero-temperature limit.
pub fn softmax_costs(costs: &[f64], temperature: f64) -> Vec<f64> {
    if costs.is_empty() {
        return Vec::new();
    }
    let uniform = || vec![1.0 / costs.len() as f64; costs.len()];
    if !(temperature.is_finite() && temperature > 0.0) {
        return uniform();
    }

    let scaled: Vec<f64> = costs.iter().map(|&c| -c / temperature).collect();
    let max_scaled = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_scaled.is_infinite() && costs.iter().all(|c| c.is_finite()) {
        return lowest_cost_mass(costs);
    }
    if !max_scaled.is_finite() {
        return uniform();
    }

    let mut out: Vec<f64> = Vec::with_capacity(scaled.len());
    let mut denom = 0.0;
    for s in scaled {
        let x = (s - max_scaled).exp();
        denom += x;
        out.push(x);
    }
    if denom <= 0.0 || !denom.is_finite() {
        return uniform();
    }
    for p in &mut out {
        *p /= denom;
    }
    out
}

/// Indicator of `c == min(costs)`, normalized.
fn lowest_cost_mass(costs: &[f64]) -> Vec<f64> {
    let min_cost = costs.iter().copied().fold(f64::INFINITY, f64::min);
    let ties = costs.iter().filter(|&&c| c == min_cost).count().max(1) as f64;
    costs
        .iter()
        .map(|&c| if c == min_cost { 1.0 / ties } else { 0.0 })
        .collect()
}

/// First index whose cumulative probability exceeds `u`.
///
/// Returns `None` when the cumulative sum never exceeds `u` (only possible
/// through floating-point undershoot with `u` close to `1.0`, or an empty
/// slice).
pub fn cdf_index(probs: &[f64], u: f64) -> Option<usize> {
    let mut cdf = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cdf += p;
        if u < cdf {
            return Some(i);
        }
    }
    None
}

/// Sample an index according to `probs`.
///
/// Entry point for drawing from a plain distribution.
/// [`SoftmaxPolicy::decide`][crate::SoftmaxPolicy::decide] calls
/// [`cdf_index`] directly so it can note when the fallback was taken.
///
/// Robust to small floating-point error: if the CDF undershoots the draw, the
/// last index is returned. `probs` must be non-empty for the result to be a
/// valid index.
pub fn sample_index<R: Rng + ?Sized>(rng: &mut R, probs: &[f64]) -> usize {
    let u: f64 = rng.random();
    cdf_index(probs, u).unwrap_or(probs.len().saturating_sub(1))
}

//! Hellinger distance between discrete distributions
//!
//! Both inputs are probability masses over the same ordered support. Each is
//! normalised by its own sum before comparison, so the inputs need not sum to 1.
//! The result lies in [0, 1]: 0 for identical distributions, 1 for disjoint ones.

use crate::error::{CohortError, Result};

/// Hellinger distance between two aligned mass vectors
///
/// This does not validate its input. A zero-sum vector yields NaN, and vectors
/// of different lengths are compared over their common prefix. Use
/// [`try_hellinger_distance`] when the input is not known to be well formed.
#[must_use]
pub fn hellinger_distance(p: &[f64], q: &[f64]) -> f64 {
    let p_sum: f64 = p.iter().sum();
    let q_sum: f64 = q.iter().sum();

    let sum_sq: f64 = p
        .iter()
        .zip(q)
        .map(|(pi, qi)| ((pi / p_sum).sqrt() - (qi / q_sum).sqrt()).powi(2))
        .sum();

    (0.5 * sum_sq).sqrt()
}

/// Hellinger distance with input validation
///
/// Rejects empty vectors, vectors of different lengths, negative or non-finite
/// masses, and vectors whose total mass is zero.
pub fn try_hellinger_distance(p: &[f64], q: &[f64]) -> Result<f64> {
    if p.is_empty() || q.is_empty() {
        return Err(CohortError::DistanceInput(
            "probability vectors must not be empty".to_string(),
        ));
    }
    if p.len() != q.len() {
        return Err(CohortError::DistanceInput(format!(
            "probability vectors have different lengths ({} vs {})",
            p.len(),
            q.len()
        )));
    }
    for (name, masses) in [("first", p), ("second", q)] {
        if masses.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(CohortError::DistanceInput(format!(
                "{name} vector contains negative or non-finite mass"
            )));
        }
        if masses.iter().sum::<f64>() <= 0.0 {
            return Err(CohortError::DistanceInput(format!(
                "{name} vector has zero total mass"
            )));
        }
    }

    // Rounding can push the value marginally above 1 for disjoint supports
    Ok(hellinger_distance(p, q).min(1.0))
}

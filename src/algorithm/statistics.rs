//! Summary statistics over cohort membership
//!
//! Pure helpers used by cohort stores to build overview, age and categorical
//! summaries and distribution tables.

use rustc_hash::FxHashMap;

use crate::models::{CategoryCount, DistributionEntry};

/// Labels of the age bins used for age distributions, in order
pub const AGE_BINS: [&str; 10] = [
    "0-10", "11-20", "21-30", "31-40", "41-50", "51-60", "61-70", "71-80", "81-90", "91+",
];

/// Label of the age bin containing `age`
#[must_use]
pub fn age_bin(age: i32) -> &'static str {
    let index = if age <= 10 {
        0
    } else {
        (((age - 1) / 10) as usize).min(AGE_BINS.len() - 1)
    };
    AGE_BINS[index]
}

/// Arithmetic mean
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, averaging the two middle values for even lengths
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator); `None` below two values
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Count occurrences of each label
#[must_use]
pub fn count_labels<'a, I>(labels: I) -> FxHashMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = FxHashMap::default();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Observed categories with counts and probabilities, sorted by category
#[must_use]
pub fn category_counts<'a, I>(labels: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = count_labels(labels);
    let total: usize = counts.values().sum();
    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
            probability: proportion(count, total),
        })
        .collect();
    result.sort_by(|a, b| a.category.cmp(&b.category));
    result
}

/// Distribution over a fixed, ordered support
///
/// Every category in `support` gets an entry, including those never observed;
/// observed labels outside the support are ignored.
#[must_use]
pub fn distribution_over<'a, S, I>(support: S, labels: I) -> Vec<DistributionEntry>
where
    S: IntoIterator<Item = &'a str>,
    I: IntoIterator<Item = &'a str>,
{
    let counts = count_labels(labels);
    let support: Vec<&str> = support.into_iter().collect();
    let total: usize = support.iter().filter_map(|c| counts.get(c)).sum();

    support
        .into_iter()
        .map(|category| {
            let count = counts.get(category).copied().unwrap_or(0);
            DistributionEntry {
                category: category.to_string(),
                count,
                probability: proportion(count, total),
            }
        })
        .collect()
}

fn proportion(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

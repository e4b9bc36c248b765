//! Collection of non-fatal, per-data-point problems.

use crate::core::SeriesError;
use std::collections::BTreeMap;

/// A single recorded problem
#[derive(Debug)]
pub struct Diagnostic {
    /// Metric the data point belonged to
    pub metric: String,
    /// What went wrong
    pub error: SeriesError,
}

/// Diagnostics collector for one batch (or a merge of several)
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    by_category: BTreeMap<&'static str, u64>,
}

impl Diagnostics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem for the given metric
    pub fn record(&mut self, metric: &str, error: SeriesError) {
        tracing::warn!("Metric '{}': {}", metric, error);
        *self.by_category.entry(error.category()).or_insert(0) += 1;
        self.entries.push(Diagnostic {
            metric: metric.to_string(),
            error,
        });
    }

    /// Number of recorded problems
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of problems in one error category
    pub fn count(&self, category: &str) -> u64 {
        self.by_category.get(category).copied().unwrap_or(0)
    }

    /// Counts keyed by error category
    pub fn by_category(&self) -> &BTreeMap<&'static str, u64> {
        &self.by_category
    }

    /// Iterate over recorded problems in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Move all entries of `other` into this collector
    pub fn merge(&mut self, other: Diagnostics) {
        for (category, count) in other.by_category {
            *self.by_category.entry(category).or_insert(0) += count;
        }
        self.entries.extend(other.entries);
    }
}

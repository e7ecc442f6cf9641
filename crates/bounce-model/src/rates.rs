//! Aggregate rate rows and sparse-stratum warnings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cohort::LabelCounts;
use crate::enums::OutcomeLabel;
use crate::options::StratumDimension;

/// Identifies one stratum, e.g. `race = Asian` or `month = 2024-03`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StratumKey {
    pub dimension: StratumDimension,
    pub value: String,
}

impl StratumKey {
    pub fn new(dimension: StratumDimension, value: impl Into<String>) -> Self {
        Self {
            dimension,
            value: value.into(),
        }
    }

    pub fn overall() -> Self {
        Self::new(StratumDimension::Overall, "all")
    }
}

impl fmt::Display for StratumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.dimension, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SparseReason {
    /// No included events at all.
    Empty,
    /// Fewer included events than the configured threshold.
    BelowThreshold,
}

impl SparseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SparseReason::Empty => "empty",
            SparseReason::BelowThreshold => "below-threshold",
        }
    }
}

/// Non-fatal annotation for strata with zero or near-zero denominators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseStratumWarning {
    pub reason: SparseReason,
    pub denominator: usize,
    pub threshold: usize,
}

impl SparseStratumWarning {
    pub fn message(&self) -> String {
        match self.reason {
            SparseReason::Empty => "no included index events".to_string(),
            SparseReason::BelowThreshold => format!(
                "{} included index events (threshold {})",
                self.denominator, self.threshold
            ),
        }
    }
}

impl fmt::Display for SparseStratumWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason.as_str(), self.message())
    }
}

/// Counts and rates for one stratum.
///
/// Rates are percentages; `None` means the denominator was zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRate {
    pub key: StratumKey,
    /// Index events in the stratum before the censoring policy.
    pub total_events: usize,
    /// Label counts over included events only.
    pub counts: LabelCounts,
    /// Censored `NEITHER` events left out of the denominator.
    pub excluded_censored: usize,
    pub ed_revisit_rate: Option<f64>,
    pub bounce_back_rate: Option<f64>,
    pub overlap_rate: Option<f64>,
    pub warning: Option<SparseStratumWarning>,
}

impl AggregateRate {
    /// Included index events (the rate denominator).
    pub fn denominator(&self) -> usize {
        self.counts.total()
    }

    /// Share of included events carrying `label`, as a percentage.
    pub fn category_rate(&self, label: OutcomeLabel) -> Option<f64> {
        percentage(self.counts.get(label), self.denominator())
    }
}

/// `numerator / denominator × 100`, or `None` for a zero denominator.
pub fn percentage(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64 * 100.0)
    }
}

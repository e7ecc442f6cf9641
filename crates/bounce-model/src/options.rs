//! Configuration options for a bounce-back analysis run.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::enums::OutcomeLabel;
use crate::error::InvalidWindowError;

/// Classical 72-hour bounce-back window.
pub const DEFAULT_WINDOW_DAYS: f64 = 3.0;

/// Windows longer than this are rejected as nonsensical.
pub const MAX_WINDOW_DAYS: f64 = 3650.0;

/// Strata with fewer included events than this get a sparse warning.
pub const DEFAULT_SPARSE_THRESHOLD: usize = 10;

/// Which index events enter rate denominators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CensoringPolicy {
    /// Leave censored `NEITHER` events out of denominators.
    #[default]
    ExcludeCensoredNeither,
    /// Count every index event, censored or not.
    IncludeAll,
}

impl CensoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CensoringPolicy::ExcludeCensoredNeither => "exclude-censored-neither",
            CensoringPolicy::IncludeAll => "include-all",
        }
    }

    /// Whether an event labelled `label` enters rate denominators.
    pub fn includes(&self, label: OutcomeLabel, censored: bool) -> bool {
        match self {
            CensoringPolicy::IncludeAll => true,
            CensoringPolicy::ExcludeCensoredNeither => {
                !(censored && label == OutcomeLabel::Neither)
            }
        }
    }
}

impl fmt::Display for CensoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CensoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "exclude-censored-neither" | "exclude" => Ok(CensoringPolicy::ExcludeCensoredNeither),
            "include-all" | "include" => Ok(CensoringPolicy::IncludeAll),
            _ => Err(format!("Unknown censoring policy: {s}")),
        }
    }
}

/// Which admissions count toward the admission side of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapDefinition {
    /// Admissions linked to an ED visit other than one of the index event's
    /// own window revisits are attributed to that visit and ignored.
    #[default]
    Attributed,
    /// Every admission inside the window counts, regardless of linkage.
    Concurrent,
    /// Only admissions at or after the first ED revisit arrival count once a
    /// revisit exists; without a revisit any admission in the window counts.
    RevisitThenAdmit,
}

impl OverlapDefinition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlapDefinition::Attributed => "attributed",
            OverlapDefinition::Concurrent => "concurrent",
            OverlapDefinition::RevisitThenAdmit => "revisit-then-admit",
        }
    }
}

impl fmt::Display for OverlapDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OverlapDefinition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "attributed" => Ok(OverlapDefinition::Attributed),
            "concurrent" | "standard" => Ok(OverlapDefinition::Concurrent),
            "revisit-then-admit" | "strict" => Ok(OverlapDefinition::RevisitThenAdmit),
            _ => Err(format!("Unknown overlap definition: {s}")),
        }
    }
}

/// Grouping dimension for aggregate rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StratumDimension {
    Overall,
    Race,
    Sex,
    AgeGroup,
    Diagnosis,
    /// Calendar month of the index departure.
    Month,
}

impl StratumDimension {
    pub const ALL: [StratumDimension; 6] = [
        StratumDimension::Overall,
        StratumDimension::Race,
        StratumDimension::Sex,
        StratumDimension::AgeGroup,
        StratumDimension::Diagnosis,
        StratumDimension::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StratumDimension::Overall => "overall",
            StratumDimension::Race => "race",
            StratumDimension::Sex => "sex",
            StratumDimension::AgeGroup => "age-group",
            StratumDimension::Diagnosis => "diagnosis",
            StratumDimension::Month => "month",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StratumDimension::Overall => "All index events",
            StratumDimension::Race => "Race/ethnicity category",
            StratumDimension::Sex => "Administrative sex",
            StratumDimension::AgeGroup => "Age band (0-17, 18-34, 35-49, 50-64, 65-79, 80+)",
            StratumDimension::Diagnosis => "Primary diagnosis category",
            StratumDimension::Month => "Calendar month of ED discharge (YYYY-MM)",
        }
    }

    /// File-name friendly label.
    pub fn file_stem(&self) -> &'static str {
        match self {
            StratumDimension::AgeGroup => "age_group",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for StratumDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StratumDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "overall" | "all" => Ok(StratumDimension::Overall),
            "race" | "ethnicity" => Ok(StratumDimension::Race),
            "sex" | "gender" => Ok(StratumDimension::Sex),
            "age-group" | "agegroup" | "age" => Ok(StratumDimension::AgeGroup),
            "diagnosis" | "dx" => Ok(StratumDimension::Diagnosis),
            "month" => Ok(StratumDimension::Month),
            _ => Err(format!("Unknown stratification dimension: {s}")),
        }
    }
}

/// Validated observation window plus clock tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationWindow {
    days: f64,
    length: TimeDelta,
    clock_tolerance: TimeDelta,
}

impl ObservationWindow {
    /// Build a window of `days` days with no clock tolerance.
    pub fn from_days(days: f64) -> Result<Self, InvalidWindowError> {
        let invalid = |reason| InvalidWindowError {
            parameter: "observation_window_days",
            value: days.to_string(),
            reason,
        };
        if !days.is_finite() {
            return Err(invalid("must be a finite number"));
        }
        if days <= 0.0 {
            return Err(invalid("must be greater than zero"));
        }
        if days > MAX_WINDOW_DAYS {
            return Err(invalid("must not exceed 3650 days"));
        }
        let millis = (days * 86_400_000.0).round() as i64;
        if millis == 0 {
            return Err(invalid("must be at least one millisecond"));
        }
        Ok(Self {
            days,
            length: TimeDelta::milliseconds(millis),
            clock_tolerance: TimeDelta::zero(),
        })
    }

    /// Allow admissions recorded up to `minutes` before the index departure.
    pub fn with_clock_tolerance(mut self, minutes: u32) -> Result<Self, InvalidWindowError> {
        let tolerance = TimeDelta::minutes(i64::from(minutes));
        if tolerance >= self.length {
            return Err(InvalidWindowError {
                parameter: "clock_tolerance_minutes",
                value: minutes.to_string(),
                reason: "must be shorter than the observation window",
            });
        }
        self.clock_tolerance = tolerance;
        Ok(self)
    }

    pub fn days(&self) -> f64 {
        self.days
    }

    pub fn length(&self) -> TimeDelta {
        self.length
    }

    pub fn clock_tolerance(&self) -> TimeDelta {
        self.clock_tolerance
    }

    /// Last instant (inclusive) of the window opened by `departure`.
    pub fn end_after(&self, departure: NaiveDateTime) -> NaiveDateTime {
        departure + self.length
    }
}

/// Options controlling a bounce-back analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Length of the observation window in days.
    pub observation_window_days: f64,
    pub censoring_policy: CensoringPolicy,
    /// Dimensions to compute rates for, in output order.
    pub stratify_by: Vec<StratumDimension>,
    pub overlap_definition: OverlapDefinition,
    /// Admissions this many minutes before the index departure still count.
    pub clock_tolerance_minutes: u32,
    /// Study data-collection cutoff; defaults to the latest recorded timestamp.
    pub data_cutoff: Option<NaiveDateTime>,
    pub sparse_threshold: usize,
    /// Group unmapped diagnosis codes by their three-character prefix.
    pub diagnosis_prefix_fallback: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            observation_window_days: DEFAULT_WINDOW_DAYS,
            censoring_policy: CensoringPolicy::default(),
            stratify_by: StratumDimension::ALL.to_vec(),
            overlap_definition: OverlapDefinition::default(),
            clock_tolerance_minutes: 0,
            data_cutoff: None,
            sparse_threshold: DEFAULT_SPARSE_THRESHOLD,
            diagnosis_prefix_fallback: true,
        }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_days(mut self, days: f64) -> Self {
        self.observation_window_days = days;
        self
    }

    pub fn with_censoring_policy(mut self, policy: CensoringPolicy) -> Self {
        self.censoring_policy = policy;
        self
    }

    pub fn with_overlap_definition(mut self, definition: OverlapDefinition) -> Self {
        self.overlap_definition = definition;
        self
    }

    pub fn with_stratify_by(mut self, dimensions: Vec<StratumDimension>) -> Self {
        self.stratify_by = dimensions;
        self
    }

    pub fn with_data_cutoff(mut self, cutoff: Option<NaiveDateTime>) -> Self {
        self.data_cutoff = cutoff;
        self
    }

    /// Validate the window settings.
    pub fn observation_window(&self) -> Result<ObservationWindow, InvalidWindowError> {
        ObservationWindow::from_days(self.observation_window_days)?
            .with_clock_tolerance(self.clock_tolerance_minutes)
    }

    /// Requested dimensions, deduplicated, in canonical order.
    pub fn dimensions(&self) -> Vec<StratumDimension> {
        let mut dimensions = self.stratify_by.clone();
        dimensions.sort();
        dimensions.dedup();
        dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_72_hours() {
        let window = AnalysisOptions::default().observation_window().unwrap();
        assert_eq!(window.length(), TimeDelta::hours(72));
        assert_eq!(window.clock_tolerance(), TimeDelta::zero());
    }

    #[test]
    fn test_rejects_non_positive_window() {
        for days in [0.0, -1.0, f64::NAN, f64::INFINITY, 4000.0] {
            let err = ObservationWindow::from_days(days).unwrap_err();
            assert_eq!(err.parameter, "observation_window_days");
        }
    }

    #[test]
    fn test_rejects_tolerance_longer_than_window() {
        let err = ObservationWindow::from_days(0.5)
            .unwrap()
            .with_clock_tolerance(720)
            .unwrap_err();
        assert_eq!(err.parameter, "clock_tolerance_minutes");
        assert!(
            ObservationWindow::from_days(0.5)
                .unwrap()
                .with_clock_tolerance(10)
                .is_ok()
        );
    }

    #[test]
    fn test_dimensions_are_sorted_and_unique() {
        let options = AnalysisOptions::default().with_stratify_by(vec![
            StratumDimension::Month,
            StratumDimension::Overall,
            StratumDimension::Month,
        ]);
        assert_eq!(
            options.dimensions(),
            vec![StratumDimension::Overall, StratumDimension::Month]
        );
    }

    #[test]
    fn test_dimension_from_str_aliases() {
        assert_eq!(
            "age_group".parse::<StratumDimension>().unwrap(),
            StratumDimension::AgeGroup
        );
        assert_eq!(
            "DX".parse::<StratumDimension>().unwrap(),
            StratumDimension::Diagnosis
        );
        assert!("zodiac".parse::<StratumDimension>().is_err());
    }

    #[test]
    fn test_strict_overlap_means_revisit_then_admit() {
        assert_eq!(
            "strict".parse::<OverlapDefinition>().unwrap(),
            OverlapDefinition::RevisitThenAdmit
        );
        assert_eq!(
            "revisit_then_admit".parse::<OverlapDefinition>().unwrap(),
            OverlapDefinition::RevisitThenAdmit
        );
        assert_eq!(
            "attributed".parse::<OverlapDefinition>().unwrap(),
            OverlapDefinition::Attributed
        );
        assert_eq!(
            OverlapDefinition::RevisitThenAdmit.to_string(),
            "revisit-then-admit"
        );
    }
}

//! Classified cohort records.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::enums::{AgeGroup, OutcomeLabel, RaceCategory, Sex};
use crate::options::{CensoringPolicy, StratumDimension};

/// Stratum membership of one index event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratumAttributes {
    pub race: RaceCategory,
    pub sex: Sex,
    pub age_group: AgeGroup,
    pub diagnosis_category: String,
    /// `YYYY-MM` of the index departure.
    pub month: String,
}

impl StratumAttributes {
    /// Stratum value of this event for `dimension`.
    pub fn value(&self, dimension: StratumDimension) -> String {
        match dimension {
            StratumDimension::Overall => "all".to_string(),
            StratumDimension::Race => self.race.as_str().to_string(),
            StratumDimension::Sex => self.sex.as_str().to_string(),
            StratumDimension::AgeGroup => self.age_group.as_str().to_string(),
            StratumDimension::Diagnosis => self.diagnosis_category.clone(),
            StratumDimension::Month => self.month.clone(),
        }
    }
}

/// An index ED discharge with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedVisit {
    pub visit_id: String,
    pub patient_id: String,
    pub arrival: NaiveDateTime,
    pub departure: NaiveDateTime,
    pub label: OutcomeLabel,
    /// Time from departure to the earliest follow-up that determined the
    /// label; `None` exactly when the label is `NEITHER`.
    pub time_to_event: Option<TimeDelta>,
    /// The observation window extends past the data cutoff.
    pub censored: bool,
    pub strata: StratumAttributes,
}

impl ClassifiedVisit {
    pub fn length_of_stay_hours(&self) -> f64 {
        (self.departure - self.arrival).num_seconds() as f64 / 3600.0
    }

    pub fn time_to_event_hours(&self) -> Option<f64> {
        self.time_to_event
            .map(|delta| delta.num_milliseconds() as f64 / 3_600_000.0)
    }

    pub fn time_to_event_days(&self) -> Option<f64> {
        self.time_to_event
            .map(|delta| delta.num_milliseconds() as f64 / 86_400_000.0)
    }

    /// Whether this event enters rate denominators under `policy`.
    pub fn is_included(&self, policy: CensoringPolicy) -> bool {
        policy.includes(self.label, self.censored)
    }
}

/// Cohort-construction QA counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortStats {
    pub patients: usize,
    pub ed_visits: usize,
    pub admissions: usize,
    /// ED visits admitted to hospital (by disposition or linked admission).
    pub admitted_from_ed: usize,
    /// Non-admitted ED visits without a departure timestamp.
    pub missing_departure: usize,
    /// Non-admitted ED visits ending in transfer, AMA, death and similar.
    pub excluded_disposition: usize,
    /// Discharges departing after the censoring cutoff.
    pub after_cutoff: usize,
    pub index_events: usize,
}

/// Per-label event counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub ed_only: usize,
    pub admit_only: usize,
    pub both: usize,
    pub neither: usize,
}

impl LabelCounts {
    pub fn add(&mut self, label: OutcomeLabel) {
        match label {
            OutcomeLabel::EdOnly => self.ed_only += 1,
            OutcomeLabel::AdmitOnly => self.admit_only += 1,
            OutcomeLabel::Both => self.both += 1,
            OutcomeLabel::Neither => self.neither += 1,
        }
    }

    pub fn get(&self, label: OutcomeLabel) -> usize {
        match label {
            OutcomeLabel::EdOnly => self.ed_only,
            OutcomeLabel::AdmitOnly => self.admit_only,
            OutcomeLabel::Both => self.both,
            OutcomeLabel::Neither => self.neither,
        }
    }

    pub fn total(&self) -> usize {
        self.ed_only + self.admit_only + self.both + self.neither
    }

    /// Events with any follow-up.
    pub fn with_follow_up(&self) -> usize {
        self.ed_only + self.admit_only + self.both
    }
}

impl<'a> FromIterator<&'a ClassifiedVisit> for LabelCounts {
    fn from_iter<I: IntoIterator<Item = &'a ClassifiedVisit>>(iter: I) -> Self {
        let mut counts = LabelCounts::default();
        for visit in iter {
            counts.add(visit.label);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn visit(label: OutcomeLabel, censored: bool) -> ClassifiedVisit {
        let arrival = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        ClassifiedVisit {
            visit_id: "V1".to_string(),
            patient_id: "P1".to_string(),
            arrival,
            departure: arrival + TimeDelta::minutes(90),
            label,
            time_to_event: None,
            censored,
            strata: StratumAttributes {
                race: RaceCategory::Unknown,
                sex: Sex::Unknown,
                age_group: AgeGroup::Unknown,
                diagnosis_category: "Unknown".to_string(),
                month: "2024-03".to_string(),
            },
        }
    }

    #[test]
    fn test_censored_neither_excluded_by_default_policy() {
        let censored_neither = visit(OutcomeLabel::Neither, true);
        assert!(!censored_neither.is_included(CensoringPolicy::ExcludeCensoredNeither));
        assert!(censored_neither.is_included(CensoringPolicy::IncludeAll));

        let censored_revisit = visit(OutcomeLabel::EdOnly, true);
        assert!(censored_revisit.is_included(CensoringPolicy::ExcludeCensoredNeither));
    }

    #[test]
    fn test_length_of_stay_hours() {
        assert!((visit(OutcomeLabel::Neither, false).length_of_stay_hours() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_label_counts_collect() {
        let visits = [
            visit(OutcomeLabel::Both, false),
            visit(OutcomeLabel::Both, false),
            visit(OutcomeLabel::Neither, false),
        ];
        let counts: LabelCounts = visits.iter().collect();
        assert_eq!(counts.both, 2);
        assert_eq!(counts.neither, 1);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.with_follow_up(), 2);
    }
}

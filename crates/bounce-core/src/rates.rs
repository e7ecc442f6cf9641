//! Rate calculation overall and per stratum.
//!
//! Degenerate strata are emitted rather than omitted: enumerated dimensions
//! list every member, diagnosis covers every lookup category plus every
//! observed one, and month covers every calendar month between the earliest
//! and latest index departure.

use std::collections::{BTreeMap, BTreeSet};

use bounce_model::{
    AgeGroup, AggregateRate, CensoringPolicy, ClassifiedVisit, LabelCounts, RaceCategory,
    Sex, SparseReason, SparseStratumWarning, StratumDimension, StratumKey, percentage,
};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

/// Aggregation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSettings {
    pub policy: CensoringPolicy,
    pub sparse_threshold: usize,
}

/// Compute one [`AggregateRate`] per stratum of each dimension, in dimension
/// order and then stratum value order.
pub fn aggregate(
    classified: &[ClassifiedVisit],
    dimensions: &[StratumDimension],
    settings: RateSettings,
    diagnosis_categories: &BTreeSet<String>,
) -> Vec<AggregateRate> {
    let mut rates = Vec::new();
    for &dimension in dimensions {
        let mut groups: BTreeMap<String, Vec<&ClassifiedVisit>> = BTreeMap::new();
        for visit in classified {
            groups
                .entry(visit.strata.value(dimension))
                .or_default()
                .push(visit);
        }
        for value in stratum_values(dimension, classified, diagnosis_categories) {
            let members = groups.get(&value).map(Vec::as_slice).unwrap_or_default();
            rates.push(rate_for(
                StratumKey::new(dimension, value),
                members.iter().copied(),
                settings,
            ));
        }
        debug!(dimension = %dimension, strata = groups.len(), "dimension aggregated");
    }

    let sparse = rates.iter().filter(|rate| rate.warning.is_some()).count();
    if sparse > 0 {
        let empty = rates
            .iter()
            .filter(|rate| {
                rate.warning
                    .as_ref()
                    .is_some_and(|warning| warning.reason == SparseReason::Empty)
            })
            .count();
        warn!(
            sparse,
            empty,
            threshold = settings.sparse_threshold,
            "sparse strata in rate tables"
        );
    }
    rates
}

/// Rates over the included members of one stratum.
pub fn rate_for<'a>(
    key: StratumKey,
    members: impl IntoIterator<Item = &'a ClassifiedVisit>,
    settings: RateSettings,
) -> AggregateRate {
    let mut total_events = 0;
    let mut counts = LabelCounts::default();
    for visit in members {
        total_events += 1;
        if visit.is_included(settings.policy) {
            counts.add(visit.label);
        }
    }
    let denominator = counts.total();
    AggregateRate {
        key,
        total_events,
        counts,
        excluded_censored: total_events - denominator,
        ed_revisit_rate: percentage(counts.ed_only + counts.both, denominator),
        bounce_back_rate: percentage(counts.admit_only + counts.both, denominator),
        overlap_rate: percentage(counts.both, counts.with_follow_up()),
        warning: sparse_warning(denominator, settings.sparse_threshold),
    }
}

fn sparse_warning(denominator: usize, threshold: usize) -> Option<SparseStratumWarning> {
    let reason = if denominator == 0 {
        SparseReason::Empty
    } else if denominator < threshold {
        SparseReason::BelowThreshold
    } else {
        return None;
    };
    Some(SparseStratumWarning {
        reason,
        denominator,
        threshold,
    })
}

fn stratum_values(
    dimension: StratumDimension,
    classified: &[ClassifiedVisit],
    diagnosis_categories: &BTreeSet<String>,
) -> Vec<String> {
    match dimension {
        StratumDimension::Overall => vec![StratumKey::overall().value],
        StratumDimension::Race => RaceCategory::ALL
            .iter()
            .map(|race| race.as_str().to_string())
            .collect(),
        StratumDimension::Sex => Sex::ALL.iter().map(|sex| sex.as_str().to_string()).collect(),
        StratumDimension::AgeGroup => AgeGroup::ALL
            .iter()
            .map(|group| group.as_str().to_string())
            .collect(),
        StratumDimension::Diagnosis => {
            let mut categories = diagnosis_categories.clone();
            categories.extend(
                classified
                    .iter()
                    .map(|visit| visit.strata.diagnosis_category.clone()),
            );
            categories.into_iter().collect()
        }
        StratumDimension::Month => {
            let first = classified.iter().map(|visit| visit.departure).min();
            let last = classified.iter().map(|visit| visit.departure).max();
            match (first, last) {
                (Some(first), Some(last)) => month_range(first.date(), last.date()),
                _ => Vec::new(),
            }
        }
    }
}

/// `YYYY-MM` labels from `first` to `last`, inclusive.
pub fn month_range(first: NaiveDate, last: NaiveDate) -> Vec<String> {
    let mut months = Vec::new();
    let (mut year, mut month) = (first.year(), first.month());
    while (year, month) <= (last.year(), last.month()) {
        months.push(format!("{year:04}-{month:02}"));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounce_model::{OutcomeLabel, StratumAttributes};
    use chrono::TimeDelta;

    const SETTINGS: RateSettings = RateSettings {
        policy: CensoringPolicy::ExcludeCensoredNeither,
        sparse_threshold: 2,
    };

    fn visit(
        label: OutcomeLabel,
        censored: bool,
        race: RaceCategory,
        month: u32,
    ) -> ClassifiedVisit {
        let arrival = NaiveDate::from_ymd_opt(2024, month, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ClassifiedVisit {
            visit_id: format!("V{month}"),
            patient_id: "P1".to_string(),
            arrival,
            departure: arrival + TimeDelta::hours(2),
            label,
            time_to_event: None,
            censored,
            strata: StratumAttributes {
                race,
                sex: Sex::Female,
                age_group: AgeGroup::From35To49,
                diagnosis_category: "Chest pain".to_string(),
                month: format!("2024-{month:02}"),
            },
        }
    }

    #[test]
    fn test_rates_over_included_events() {
        let visits = vec![
            visit(OutcomeLabel::EdOnly, false, RaceCategory::White, 1),
            visit(OutcomeLabel::Both, false, RaceCategory::White, 1),
            visit(OutcomeLabel::AdmitOnly, false, RaceCategory::White, 1),
            visit(OutcomeLabel::Neither, false, RaceCategory::White, 1),
            visit(OutcomeLabel::Neither, true, RaceCategory::White, 1),
        ];
        let rate = rate_for(StratumKey::overall(), &visits, SETTINGS);
        assert_eq!(rate.total_events, 5);
        assert_eq!(rate.denominator(), 4);
        assert_eq!(rate.excluded_censored, 1);
        assert_eq!(rate.ed_revisit_rate, Some(50.0));
        assert_eq!(rate.bounce_back_rate, Some(50.0));
        let overlap = rate.overlap_rate.unwrap();
        assert!((overlap - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(rate.warning, None);
    }

    #[test]
    fn test_empty_stratum_has_no_rates() {
        let rate = rate_for(StratumKey::new(StratumDimension::Race, "Asian"), [], SETTINGS);
        assert_eq!(rate.ed_revisit_rate, None);
        assert_eq!(rate.overlap_rate, None);
        assert_eq!(rate.warning.map(|warning| warning.reason), Some(SparseReason::Empty));
    }

    #[test]
    fn test_degenerate_strata_are_emitted() {
        let visits = vec![
            visit(OutcomeLabel::Neither, false, RaceCategory::White, 1),
            visit(OutcomeLabel::EdOnly, false, RaceCategory::Asian, 4),
        ];
        let lookup = BTreeSet::from(["Asthma".to_string()]);
        let rates = aggregate(
            &visits,
            &[
                StratumDimension::Overall,
                StratumDimension::Race,
                StratumDimension::Diagnosis,
                StratumDimension::Month,
            ],
            SETTINGS,
            &lookup,
        );

        let values = |dimension: StratumDimension| -> Vec<String> {
            rates
                .iter()
                .filter(|rate| rate.key.dimension == dimension)
                .map(|rate| rate.key.value.clone())
                .collect()
        };
        assert_eq!(values(StratumDimension::Overall), vec!["all"]);
        assert_eq!(values(StratumDimension::Race).len(), RaceCategory::ALL.len());
        assert_eq!(values(StratumDimension::Diagnosis), vec!["Asthma", "Chest pain"]);
        assert_eq!(
            values(StratumDimension::Month),
            vec!["2024-01", "2024-02", "2024-03", "2024-04"]
        );

        let february = rates
            .iter()
            .find(|rate| rate.key.value == "2024-02")
            .unwrap();
        assert_eq!(february.total_events, 0);
        assert_eq!(february.bounce_back_rate, None);
    }

    #[test]
    fn test_below_threshold_warning() {
        let visits = vec![visit(OutcomeLabel::EdOnly, false, RaceCategory::White, 1)];
        let rate = rate_for(StratumKey::overall(), &visits, SETTINGS);
        let warning = rate.warning.unwrap();
        assert_eq!(warning.reason, SparseReason::BelowThreshold);
        assert_eq!(warning.denominator, 1);
    }

    #[test]
    fn test_month_range_crosses_year() {
        let first = NaiveDate::from_ymd_opt(2023, 11, 30).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(
            month_range(first, last),
            vec!["2023-11", "2023-12", "2024-01", "2024-02"]
        );
    }
}

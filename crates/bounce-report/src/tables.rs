//! CSV renderers for the classified cohort, rate tables and overlap breakdown.
//!
//! Every renderer writes its header explicitly, so empty tables still carry
//! their column names.

use std::io::Write;

use bounce_core::AnalysisOutput;
use bounce_ingest::format_timestamp;
use bounce_model::{AggregateRate, ClassifiedVisit, LabelCounts, OutcomeLabel, percentage};
use csv::WriterBuilder;
use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::format::{format_decimal, format_optional};

pub const COHORT_HEADER: [&str; 15] = [
    "visit_id",
    "patient_id",
    "arrival",
    "departure",
    "ed_los_hours",
    "outcome",
    "time_to_event_hours",
    "time_to_event_days",
    "censored",
    "included_in_rates",
    "race",
    "sex",
    "age_group",
    "diagnosis_category",
    "month",
];

pub const RATE_HEADER: [&str; 13] = [
    "dimension",
    "stratum",
    "total_events",
    "included",
    "ed_only",
    "admit_only",
    "both",
    "neither",
    "excluded_censored",
    "ed_revisit_rate",
    "bounce_back_rate",
    "overlap_rate",
    "warning",
];

pub const OVERLAP_HEADER: [&str; 3] = ["category", "count", "rate"];

#[derive(Debug, Serialize)]
struct CohortRow<'a> {
    visit_id: &'a str,
    patient_id: &'a str,
    arrival: String,
    departure: String,
    ed_los_hours: String,
    outcome: &'static str,
    time_to_event_hours: Option<String>,
    time_to_event_days: Option<String>,
    censored: bool,
    included_in_rates: bool,
    race: &'static str,
    sex: &'static str,
    age_group: &'static str,
    diagnosis_category: &'a str,
    month: &'a str,
}

impl<'a> CohortRow<'a> {
    fn new(visit: &'a ClassifiedVisit, output: &AnalysisOutput) -> Self {
        Self {
            visit_id: &visit.visit_id,
            patient_id: &visit.patient_id,
            arrival: format_timestamp(visit.arrival),
            departure: format_timestamp(visit.departure),
            ed_los_hours: format_decimal(visit.length_of_stay_hours()),
            outcome: visit.label.as_str(),
            time_to_event_hours: format_optional(visit.time_to_event_hours()),
            time_to_event_days: format_optional(visit.time_to_event_days()),
            censored: visit.censored,
            included_in_rates: visit.is_included(output.options.censoring_policy),
            race: visit.strata.race.as_str(),
            sex: visit.strata.sex.as_str(),
            age_group: visit.strata.age_group.as_str(),
            diagnosis_category: &visit.strata.diagnosis_category,
            month: &visit.strata.month,
        }
    }
}

#[derive(Debug, Serialize)]
struct RateRow<'a> {
    dimension: &'static str,
    stratum: &'a str,
    total_events: usize,
    included: usize,
    ed_only: usize,
    admit_only: usize,
    both: usize,
    neither: usize,
    excluded_censored: usize,
    ed_revisit_rate: Option<String>,
    bounce_back_rate: Option<String>,
    overlap_rate: Option<String>,
    warning: Option<&'static str>,
}

impl<'a> From<&'a AggregateRate> for RateRow<'a> {
    fn from(rate: &'a AggregateRate) -> Self {
        Self {
            dimension: rate.key.dimension.as_str(),
            stratum: &rate.key.value,
            total_events: rate.total_events,
            included: rate.denominator(),
            ed_only: rate.counts.ed_only,
            admit_only: rate.counts.admit_only,
            both: rate.counts.both,
            neither: rate.counts.neither,
            excluded_censored: rate.excluded_censored,
            ed_revisit_rate: format_optional(rate.ed_revisit_rate),
            bounce_back_rate: format_optional(rate.bounce_back_rate),
            overlap_rate: format_optional(rate.overlap_rate),
            warning: rate.warning.as_ref().map(|warning| warning.reason.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct OverlapRow {
    category: &'static str,
    count: usize,
    rate: Option<String>,
}

/// One row per index event.
pub fn write_classified_cohort<W: Write>(writer: W, output: &AnalysisOutput) -> Result<()> {
    const TABLE: &str = "classified cohort";
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(COHORT_HEADER)
        .map_err(ReportError::csv(TABLE))?;
    for visit in &output.classified {
        csv.serialize(CohortRow::new(visit, output))
            .map_err(ReportError::csv(TABLE))?;
    }
    csv.flush().map_err(|source| ReportError::Csv {
        table: TABLE,
        source: source.into(),
    })
}

/// Rate rows in the order given.
pub fn write_rate_table<'a, W: Write>(
    writer: W,
    rates: impl IntoIterator<Item = &'a AggregateRate>,
) -> Result<()> {
    const TABLE: &str = "rate";
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(RATE_HEADER)
        .map_err(ReportError::csv(TABLE))?;
    for rate in rates {
        csv.serialize(RateRow::from(rate))
            .map_err(ReportError::csv(TABLE))?;
    }
    csv.flush().map_err(|source| ReportError::Csv {
        table: TABLE,
        source: source.into(),
    })
}

/// Overall outcome breakdown over the events included in rates.
///
/// Computed from the classified cohort, so it is present even when the
/// `overall` dimension was not requested.
pub fn write_overlap<W: Write>(writer: W, output: &AnalysisOutput) -> Result<()> {
    write_breakdown(writer, "overlap", &output.overall_rate().counts)
}

/// Included outcome breakdown when `BOTH` needs an admission at or after the
/// first ED revisit.
pub fn write_revisit_then_admit_overlap<W: Write>(
    writer: W,
    output: &AnalysisOutput,
) -> Result<()> {
    write_breakdown(writer, "revisit-then-admit overlap", &output.revisit_then_admit)
}

fn write_breakdown<W: Write>(writer: W, table: &'static str, counts: &LabelCounts) -> Result<()> {
    let denominator = counts.total();
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(OVERLAP_HEADER)
        .map_err(ReportError::csv(table))?;
    for label in OutcomeLabel::ALL {
        csv.serialize(OverlapRow {
            category: label.as_str(),
            count: counts.get(label),
            rate: format_optional(percentage(counts.get(label), denominator)),
        })
        .map_err(ReportError::csv(table))?;
    }
    csv.flush().map_err(|source| ReportError::Csv {
        table,
        source: source.into(),
    })
}

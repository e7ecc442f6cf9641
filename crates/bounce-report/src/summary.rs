//! Machine-readable summary of one run.

use std::io::Write;

use bounce_core::AnalysisOutput;
use bounce_ingest::format_timestamp;
use bounce_model::{AnalysisOptions, CohortStats, LabelCounts};
use serde::Serialize;

use crate::error::{ReportError, Result};

/// Configuration, cohort counts and emitted files of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    pub options: &'a AnalysisOptions,
    pub window_hours: f64,
    pub dataset_max: Option<String>,
    pub censoring_cutoff: Option<String>,
    pub cohort: CohortStats,
    pub label_counts: LabelCounts,
    pub revisit_then_admit: LabelCounts,
    pub censored: usize,
    pub strata: usize,
    pub sparse_strata: usize,
    pub outputs: Vec<String>,
}

impl<'a> RunSummary<'a> {
    pub fn new(output: &'a AnalysisOutput, outputs: Vec<String>) -> Self {
        Self {
            tool: "bounce-back",
            version: env!("CARGO_PKG_VERSION"),
            options: &output.options,
            window_hours: output.window.length().num_milliseconds() as f64 / 3_600_000.0,
            dataset_max: output.dataset_max.map(format_timestamp),
            censoring_cutoff: output.cutoff.map(format_timestamp),
            cohort: output.stats,
            label_counts: output.label_counts,
            revisit_then_admit: output.revisit_then_admit,
            censored: output.censored,
            strata: output.rates.len(),
            sparse_strata: output
                .rates
                .iter()
                .filter(|rate| rate.warning.is_some())
                .count(),
            outputs,
        }
    }
}

/// Pretty-printed JSON with a trailing newline.
pub fn write_run_summary<W: Write>(mut writer: W, summary: &RunSummary<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, summary)
        .map_err(|source| ReportError::Json { source })?;
    writer
        .write_all(b"\n")
        .map_err(|source| ReportError::Json {
            source: serde_json::Error::io(source),
        })
}

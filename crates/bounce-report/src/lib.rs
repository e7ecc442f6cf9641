//! Output Emitter for bounce-back analysis results.
//!
//! - `classified_cohort.csv`: one row per index event
//! - `rate_summary.csv` and `rates_by_<dimension>.csv`: stratified rates
//! - `overlap.csv`: overall outcome breakdown
//! - `overlap_revisit_then_admit.csv`: breakdown counting only admissions at
//!   or after the first ED revisit toward `BOTH`
//! - `run_summary.json`: configuration, cohort counts and file list

mod error;
mod format;
mod summary;
mod tables;
mod writer;

pub use error::{ReportError, Result};
pub use format::{format_decimal, format_optional};
pub use summary::{RunSummary, write_run_summary};
pub use tables::{
    COHORT_HEADER, OVERLAP_HEADER, RATE_HEADER, write_classified_cohort, write_overlap,
    write_rate_table, write_revisit_then_admit_overlap,
};
pub use writer::{
    CLASSIFIED_COHORT_FILE, OVERLAP_FILE, OutputPaths, RATE_SUMMARY_FILE,
    REVISIT_THEN_ADMIT_OVERLAP_FILE, RUN_SUMMARY_FILE, planned_files, rates_file_name,
    write_outputs,
};

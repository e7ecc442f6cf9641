//! CLI argument definitions for the bounce-back analysis tool.

use std::path::PathBuf;

use bounce_cli::config::OptionOverrides;
use bounce_model::{CensoringPolicy, OverlapDefinition, StratumDimension};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bounce-back",
    version,
    about = "ED bounce-back analysis - classify return visits and admissions after ED discharge",
    long_about = "Classify every ED discharge by what follows it within an observation window.\n\n\
                  Each discharge is labelled ED_ONLY, ADMIT_ONLY, BOTH or NEITHER, and\n\
                  revisit, bounce-back and overlap rates are reported per stratum."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient and encounter identifiers in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify index events and write rate tables.
    Analyze(AnalyzeArgs),

    /// List the stratification dimensions.
    Dimensions,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Merged event table (default: events.csv inside DATA_DIR).
    #[arg(value_name = "EVENTS_CSV")]
    pub events: Option<PathBuf>,

    /// Directory holding events.csv when EVENTS_CSV is omitted.
    #[arg(long = "data-dir", env = "DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Diagnosis code to category table.
    #[arg(long = "diagnosis-lookup", value_name = "CSV")]
    pub diagnosis_lookup: Option<PathBuf>,

    /// Output directory (default: bounce_back_output next to the input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run the analysis and print the summary without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// TOML file with analysis options; flags and environment win over it.
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub options: AnalysisArgs,
}

#[derive(Args)]
pub struct AnalysisArgs {
    /// Observation window length in days.
    #[arg(long = "window-days", env = "W_DAYS", value_name = "DAYS")]
    pub window_days: Option<f64>,

    /// Which censored events enter rate denominators.
    #[arg(long = "censoring", value_enum)]
    pub censoring: Option<CensoringArg>,

    /// Dimensions to stratify rates by (repeatable or comma separated).
    #[arg(long = "stratify", value_name = "DIMENSION", value_delimiter = ',')]
    pub stratify: Vec<StratumDimension>,

    /// Which admissions count toward an index event's outcome.
    ///
    /// `attributed` ignores admissions linked to an ED visit outside the
    /// window; `concurrent` counts every admission inside the window;
    /// `revisit-then-admit` (alias `strict`) ignores admissions before the
    /// first ED revisit.
    #[arg(long = "overlap", value_enum)]
    pub overlap: Option<OverlapArg>,

    /// Count admissions recorded up to this many minutes before departure.
    #[arg(
        long = "clock-tolerance-minutes",
        env = "TOL_MINUTES",
        value_name = "MINUTES"
    )]
    pub clock_tolerance_minutes: Option<u32>,

    /// Data-collection cutoff used for censoring (default: latest timestamp).
    #[arg(long = "data-cutoff", value_name = "TIMESTAMP", value_parser = parse_cutoff)]
    pub data_cutoff: Option<NaiveDateTime>,

    /// Strata with fewer included events get a sparse warning.
    #[arg(long = "sparse-threshold", value_name = "COUNT")]
    pub sparse_threshold: Option<usize>,

    /// Report unmapped diagnosis codes as "Unmapped" instead of by prefix.
    #[arg(long = "no-prefix-fallback")]
    pub no_prefix_fallback: bool,
}

impl AnalysisArgs {
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            window_days: self.window_days,
            censoring_policy: self.censoring.map(CensoringPolicy::from),
            stratify_by: self.stratify.clone(),
            overlap_definition: self.overlap.map(OverlapDefinition::from),
            clock_tolerance_minutes: self.clock_tolerance_minutes,
            data_cutoff: self.data_cutoff,
            sparse_threshold: self.sparse_threshold,
            no_prefix_fallback: self.no_prefix_fallback,
        }
    }
}

fn parse_cutoff(value: &str) -> Result<NaiveDateTime, String> {
    bounce_ingest::parse_timestamp(value)
        .ok_or_else(|| format!("expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, got '{value}'"))
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CensoringArg {
    ExcludeCensoredNeither,
    IncludeAll,
}

impl From<CensoringArg> for CensoringPolicy {
    fn from(value: CensoringArg) -> Self {
        match value {
            CensoringArg::ExcludeCensoredNeither => CensoringPolicy::ExcludeCensoredNeither,
            CensoringArg::IncludeAll => CensoringPolicy::IncludeAll,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OverlapArg {
    Attributed,
    Concurrent,
    #[value(alias = "strict")]
    RevisitThenAdmit,
}

impl From<OverlapArg> for OverlapDefinition {
    fn from(value: OverlapArg) -> Self {
        match value {
            OverlapArg::Attributed => OverlapDefinition::Attributed,
            OverlapArg::Concurrent => OverlapDefinition::Concurrent,
            OverlapArg::RevisitThenAdmit => OverlapDefinition::RevisitThenAdmit,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

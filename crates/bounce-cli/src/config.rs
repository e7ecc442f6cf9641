//! Analysis configuration: TOML file, then environment and command-line
//! overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bounce_model::{AnalysisOptions, CensoringPolicy, OverlapDefinition, StratumDimension};
use chrono::NaiveDateTime;
use tracing::debug;

/// File looked up inside `DATA_DIR` when no input path is given.
pub const DEFAULT_EVENTS_FILE: &str = "events.csv";

/// Default output directory name, created next to the input table.
pub const DEFAULT_OUTPUT_DIR: &str = "bounce_back_output";

/// Option values given on the command line or through the environment.
///
/// `None` and empty fields leave the file (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub window_days: Option<f64>,
    pub censoring_policy: Option<CensoringPolicy>,
    pub stratify_by: Vec<StratumDimension>,
    pub overlap_definition: Option<OverlapDefinition>,
    pub clock_tolerance_minutes: Option<u32>,
    pub data_cutoff: Option<NaiveDateTime>,
    pub sparse_threshold: Option<usize>,
    pub no_prefix_fallback: bool,
}

impl OptionOverrides {
    pub fn apply(&self, mut options: AnalysisOptions) -> AnalysisOptions {
        if let Some(days) = self.window_days {
            options.observation_window_days = days;
        }
        if let Some(policy) = self.censoring_policy {
            options.censoring_policy = policy;
        }
        if !self.stratify_by.is_empty() {
            options.stratify_by = self.stratify_by.clone();
        }
        if let Some(definition) = self.overlap_definition {
            options.overlap_definition = definition;
        }
        if let Some(minutes) = self.clock_tolerance_minutes {
            options.clock_tolerance_minutes = minutes;
        }
        if self.data_cutoff.is_some() {
            options.data_cutoff = self.data_cutoff;
        }
        if let Some(threshold) = self.sparse_threshold {
            options.sparse_threshold = threshold;
        }
        if self.no_prefix_fallback {
            options.diagnosis_prefix_fallback = false;
        }
        options
    }
}

/// Parse analysis options from TOML text. Missing keys take their defaults.
pub fn parse_config(text: &str) -> Result<AnalysisOptions> {
    toml::from_str(text).context("parse analysis options")
}

/// Load analysis options from a TOML file.
pub fn load_config(path: &Path) -> Result<AnalysisOptions> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let options =
        parse_config(&text).with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(options)
}

/// Effective options: defaults, then the config file, then overrides.
pub fn resolve_options(
    config_file: Option<&Path>,
    overrides: &OptionOverrides,
) -> Result<AnalysisOptions> {
    let base = match config_file {
        Some(path) => load_config(path)?,
        None => AnalysisOptions::default(),
    };
    Ok(overrides.apply(base))
}

/// Input table path: the explicit argument, else `events.csv` in `data_dir`.
pub fn resolve_input(explicit: Option<&Path>, data_dir: Option<&Path>) -> Result<PathBuf> {
    match (explicit, data_dir) {
        (Some(path), _) => Ok(path.to_path_buf()),
        (None, Some(dir)) => Ok(dir.join(DEFAULT_EVENTS_FILE)),
        (None, None) => bail!("no input table given (pass EVENTS_CSV or set DATA_DIR)"),
    }
}

/// Output directory: the explicit argument, else a sibling of the input table.
pub fn resolve_output_dir(explicit: Option<&Path>, input: &Path) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_OUTPUT_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let base = AnalysisOptions::default().with_window_days(7.0);
        let overrides = OptionOverrides {
            sparse_threshold: Some(5),
            no_prefix_fallback: true,
            ..OptionOverrides::default()
        };
        let options = overrides.apply(base);
        assert_eq!(options.observation_window_days, 7.0);
        assert_eq!(options.sparse_threshold, 5);
        assert!(!options.diagnosis_prefix_fallback);
        assert_eq!(options.stratify_by, StratumDimension::ALL.to_vec());
    }

    #[test]
    fn test_empty_overrides_keep_defaults() {
        assert_eq!(
            OptionOverrides::default().apply(AnalysisOptions::default()),
            AnalysisOptions::default()
        );
    }

    #[test]
    fn test_input_requires_path_or_data_dir() {
        assert!(resolve_input(None, None).is_err());
        assert_eq!(
            resolve_input(None, Some(Path::new("/data"))).unwrap(),
            PathBuf::from("/data/events.csv")
        );
        assert_eq!(
            resolve_input(Some(Path::new("a.csv")), Some(Path::new("/data"))).unwrap(),
            PathBuf::from("a.csv")
        );
    }

    #[test]
    fn test_output_dir_defaults_next_to_input() {
        assert_eq!(
            resolve_output_dir(None, Path::new("/data/events.csv")),
            PathBuf::from("/data/bounce_back_output")
        );
        assert_eq!(
            resolve_output_dir(Some(Path::new("/out")), Path::new("/data/events.csv")),
            PathBuf::from("/out")
        );
    }
}

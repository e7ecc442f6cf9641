//! Integration tests for loading analysis options from TOML files.

use std::fs;

use bounce_cli::config::{OptionOverrides, load_config, parse_config, resolve_options};
use bounce_model::{AnalysisOptions, CensoringPolicy, OverlapDefinition, StratumDimension};
use tempfile::TempDir;

#[test]
fn test_partial_config_keeps_defaults() {
    let options = parse_config("observation_window_days = 7.0\n").unwrap();
    assert_eq!(options.observation_window_days, 7.0);
    assert_eq!(options.sparse_threshold, 10);
    assert_eq!(options.stratify_by, StratumDimension::ALL.to_vec());
}

#[test]
fn test_full_config() {
    let options = parse_config(
        r#"
observation_window_days = 1.5
censoring_policy = "include-all"
stratify_by = ["overall", "age-group"]
overlap_definition = "concurrent"
clock_tolerance_minutes = 30
data_cutoff = "2024-06-30T23:59:59"
sparse_threshold = 3
diagnosis_prefix_fallback = false
"#,
    )
    .unwrap();
    assert_eq!(options.censoring_policy, CensoringPolicy::IncludeAll);
    assert_eq!(
        options.stratify_by,
        vec![StratumDimension::Overall, StratumDimension::AgeGroup]
    );
    assert_eq!(options.overlap_definition, OverlapDefinition::Concurrent);
    assert_eq!(options.clock_tolerance_minutes, 30);
    assert_eq!(
        options.data_cutoff.map(|cutoff| cutoff.to_string()),
        Some("2024-06-30 23:59:59".to_string())
    );
    assert_eq!(options.sparse_threshold, 3);
    assert!(!options.diagnosis_prefix_fallback);
}

#[test]
fn test_revisit_then_admit_from_config() {
    let options = parse_config("overlap_definition = \"revisit-then-admit\"\n").unwrap();
    assert_eq!(options.overlap_definition, OverlapDefinition::RevisitThenAdmit);
}

#[test]
fn test_rejects_unknown_enum_value() {
    assert!(parse_config("censoring_policy = \"sometimes\"\n").is_err());
}

#[test]
fn test_flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bounce.toml");
    fs::write(
        &path,
        "observation_window_days = 7.0\ncensoring_policy = \"include-all\"\n",
    )
    .unwrap();

    let overrides = OptionOverrides {
        window_days: Some(2.0),
        ..OptionOverrides::default()
    };
    let options = resolve_options(Some(&path), &overrides).unwrap();
    assert_eq!(options.observation_window_days, 2.0);
    assert_eq!(options.censoring_policy, CensoringPolicy::IncludeAll);
}

#[test]
fn test_no_config_file_uses_defaults() {
    let options = resolve_options(None, &OptionOverrides::default()).unwrap();
    assert_eq!(options, AnalysisOptions::default());
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use bounce_cli::config::{resolve_input, resolve_options, resolve_output_dir};
use bounce_core::AnalysisContext;
use bounce_ingest::{read_diagnosis_lookup, read_event_table};
use bounce_model::StratumDimension;
use bounce_report::{RATE_SUMMARY_FILE, planned_files, rates_file_name, write_outputs};

use crate::cli::AnalyzeArgs;
use crate::summary::apply_table_style;
use crate::types::AnalyzeResult;

pub fn run_dimensions() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Dimension", "Description", "Rates file"]);
    apply_table_style(&mut table);
    for dimension in StratumDimension::ALL {
        let file = match dimension {
            StratumDimension::Overall => RATE_SUMMARY_FILE.to_string(),
            other => rates_file_name(other),
        };
        table.add_row(vec![
            dimension.as_str().to_string(),
            dimension.description().to_string(),
            file,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_analyze(args: &AnalyzeArgs) -> Result<AnalyzeResult> {
    let input = resolve_input(args.events.as_deref(), args.data_dir.as_deref())?;
    let run_span = info_span!("analyze", input = %input.display());
    let _run_guard = run_span.enter();
    let output_dir = resolve_output_dir(args.output_dir.as_deref(), &input);

    // =========================================================================
    // Stage 0: Resolve options (defaults < config file < env < flags)
    // =========================================================================
    let options = resolve_options(args.config.as_deref(), &args.options.overrides())?;
    info!(
        window_days = options.observation_window_days,
        censoring = %options.censoring_policy,
        overlap = %options.overlap_definition,
        tolerance_minutes = options.clock_tolerance_minutes,
        "analysis options"
    );

    // =========================================================================
    // Stage 1: Ingest event table and diagnosis lookup
    // =========================================================================
    let ingest_span = info_span!("ingest");
    let records = ingest_span
        .in_scope(|| read_event_table(&input))
        .with_context(|| format!("read event table {}", input.display()))?;
    info!(rows = records.len(), "loaded event table");

    let mut context = AnalysisContext::new(options);
    if let Some(path) = &args.diagnosis_lookup {
        let categories = ingest_span
            .in_scope(|| read_diagnosis_lookup(path))
            .with_context(|| format!("read diagnosis lookup {}", path.display()))?;
        info!(codes = categories.len(), "loaded diagnosis lookup");
        context = context.with_diagnosis_lookup(categories);
    }

    // =========================================================================
    // Stage 2: Classify and aggregate
    // =========================================================================
    let output = context.analyze(&records).context("analyze events")?;

    // =========================================================================
    // Stage 3: Write outputs
    // =========================================================================
    let written = if args.dry_run {
        info!(
            files = planned_files(&output).len(),
            "dry run: skipping output files"
        );
        None
    } else {
        let output_span = info_span!("output", dir = %output_dir.display());
        let paths = output_span
            .in_scope(|| write_outputs(&output, &output_dir))
            .with_context(|| format!("write outputs to {}", output_dir.display()))?;
        Some(paths)
    };

    Ok(AnalyzeResult {
        input,
        diagnosis_lookup: args.diagnosis_lookup.clone(),
        output_dir,
        written,
        output,
    })
}

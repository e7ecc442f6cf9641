use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use bounce_core::AnalysisOutput;
use bounce_ingest::format_timestamp;
use bounce_model::{AggregateRate, OutcomeLabel, percentage};
use bounce_report::format_decimal;

use crate::types::AnalyzeResult;

pub fn print_summary(result: &AnalyzeResult) {
    let output = &result.output;
    println!("Input: {}", result.input.display());
    if let Some(path) = &result.diagnosis_lookup {
        println!("Diagnosis lookup: {}", path.display());
    }
    match &result.written {
        Some(paths) => println!(
            "Output: {} ({} files)",
            paths.directory.display(),
            paths.files.len()
        ),
        None => println!("Output: dry run, nothing written"),
    }
    println!(
        "Window: {} days, censoring {}, overlap {}",
        output.window.days(),
        output.options.censoring_policy,
        output.options.overlap_definition
    );
    if let Some(cutoff) = output.cutoff {
        println!("Censoring cutoff: {}", format_timestamp(cutoff));
    }

    println!("{}", cohort_table(output));
    println!();
    println!("Outcomes:");
    println!("{}", outcome_table(output));
    for dimension in output.dimensions() {
        let rates: Vec<&AggregateRate> = output.rates_for(dimension).collect();
        println!();
        println!("Rates by {dimension}:");
        println!("{}", rate_table(&rates));
    }
}

fn cohort_table(output: &AnalysisOutput) -> Table {
    let stats = &output.stats;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Cohort"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Patients", stats.patients),
        ("ED visits", stats.ed_visits),
        ("Admissions", stats.admissions),
        ("Admitted from ED", stats.admitted_from_ed),
        ("Excluded disposition", stats.excluded_disposition),
        ("Missing departure", stats.missing_departure),
        ("After cutoff", stats.after_cutoff),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count)]);
    }
    table.add_row(vec![
        Cell::new("Index events")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(stats.index_events).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Censored"),
        count_cell(output.censored).fg(Color::Yellow),
    ]);
    table
}

fn outcome_table(output: &AnalysisOutput) -> Table {
    let overall = output.overall_rate();
    let denominator = overall.denominator();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Outcome"),
        header_cell("Events"),
        header_cell("Included"),
        header_cell("%"),
        header_cell("Revisit then admit"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for label in OutcomeLabel::ALL {
        let included = overall.counts.get(label);
        table.add_row(vec![
            label_cell(label),
            Cell::new(output.label_counts.get(label)),
            Cell::new(included),
            rate_cell(percentage(included, denominator)),
            Cell::new(output.revisit_then_admit.get(label)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(output.label_counts.total()).add_attribute(Attribute::Bold),
        Cell::new(denominator).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(output.revisit_then_admit.total()).add_attribute(Attribute::Bold),
    ]);
    table
}

fn rate_table(rates: &[&AggregateRate]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stratum"),
        header_cell("Events"),
        header_cell("Included"),
        header_cell("ED revisit %"),
        header_cell("Bounce-back %"),
        header_cell("Overlap %"),
        header_cell("Warning"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for rate in rates {
        table.add_row(vec![
            Cell::new(&rate.key.value)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(rate.total_events),
            count_cell(rate.denominator()),
            rate_cell(rate.ed_revisit_rate),
            rate_cell(rate.bounce_back_rate),
            rate_cell(rate.overlap_rate),
            match &rate.warning {
                Some(warning) => Cell::new(warning.reason.as_str()).fg(Color::Yellow),
                None => dim_cell("-"),
            },
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn label_cell(label: OutcomeLabel) -> Cell {
    let color = match label {
        OutcomeLabel::EdOnly => Color::Yellow,
        OutcomeLabel::AdmitOnly => Color::Magenta,
        OutcomeLabel::Both => Color::Red,
        OutcomeLabel::Neither => Color::Green,
    };
    Cell::new(label.as_str()).fg(color)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn rate_cell(rate: Option<f64>) -> Cell {
    match rate {
        Some(value) => Cell::new(format_decimal(value)),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

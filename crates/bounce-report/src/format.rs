//! Cell formatting shared by every table.

/// Rates and durations render with four decimals.
pub fn format_decimal(value: f64) -> String {
    format!("{value:.4}")
}

/// Absent values render as empty cells.
pub fn format_optional(value: Option<f64>) -> Option<String> {
    value.map(format_decimal)
}

//! Reader for the diagnosis code → category lookup table.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::header::{ColumnSpec, resolve_column};

const CODE: ColumnSpec = ColumnSpec {
    name: "code",
    aliases: &["code", "icd_code", "icd_prefix", "diagnosis_code"],
    required: true,
};
const CATEGORY: ColumnSpec = ColumnSpec {
    name: "category",
    aliases: &["category", "group", "icd_group", "description"],
    required: true,
};

/// Normalized lookup key for a diagnosis code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Read `code,category` rows into a map keyed by normalized code.
///
/// Blank codes are skipped; for duplicated codes the first row wins.
pub fn read_diagnosis_lookup(path: &Path) -> Result<BTreeMap<String, String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::open(path.to_path_buf(), source))?;
    let csv_error = |source| IngestError::CsvParse {
        path: path.to_path_buf(),
        source,
    };
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    let code_index = resolve_column(&headers, CODE, path)?.unwrap_or_default();
    let category_index = resolve_column(&headers, CATEGORY, path)?.unwrap_or_default();

    let mut lookup = BTreeMap::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let code = normalize_code(record.get(code_index).unwrap_or(""));
        if code.is_empty() {
            continue;
        }
        let category = record.get(category_index).unwrap_or("").trim();
        if category.is_empty() {
            return Err(IngestError::MissingValue {
                path: path.to_path_buf(),
                row: index + 1,
                column: CATEGORY.name.to_string(),
            });
        }
        if lookup.contains_key(&code) {
            debug!(code = %code, "duplicate diagnosis code ignored");
            continue;
        }
        lookup.insert(code, category.to_string());
    }
    info!(path = %path.display(), codes = lookup.len(), "diagnosis lookup loaded");
    Ok(lookup)
}

//! Column resolution for the merged event table.
//!
//! Headers are matched case-insensitively against a canonical name and the
//! aliases used by the upstream registry extracts (`subject_id`, `intime`,
//! `outtime`, ...). The first alias present wins.

use std::path::Path;

use crate::error::{IngestError, Result};

/// A logical column and the header names it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

pub const ENCOUNTER_ID: ColumnSpec = ColumnSpec {
    name: "encounter_id",
    aliases: &["encounter_id", "stay_id", "visit_id", "hadm_id"],
    required: true,
};
pub const PATIENT_ID: ColumnSpec = ColumnSpec {
    name: "patient_id",
    aliases: &["patient_id", "subject_id"],
    required: true,
};
pub const ENCOUNTER_TYPE: ColumnSpec = ColumnSpec {
    name: "encounter_type",
    aliases: &["encounter_type", "event_type", "kind"],
    required: true,
};
pub const ARRIVAL: ColumnSpec = ColumnSpec {
    name: "arrival",
    aliases: &["arrival", "intime", "admittime", "arrival_time"],
    required: true,
};
pub const DEPARTURE: ColumnSpec = ColumnSpec {
    name: "departure",
    aliases: &["departure", "outtime", "dischtime", "departure_time"],
    required: false,
};
pub const DISPOSITION: ColumnSpec = ColumnSpec {
    name: "disposition",
    aliases: &["disposition", "ed_disposition", "edoutcome", "outcome"],
    required: true,
};
pub const ADMISSION_SOURCE: ColumnSpec = ColumnSpec {
    name: "admission_source",
    aliases: &["admission_source", "source"],
    required: false,
};
pub const LINKED_VISIT_ID: ColumnSpec = ColumnSpec {
    name: "linked_visit_id",
    aliases: &["linked_visit_id", "linked_stay_id", "ed_stay_id"],
    required: false,
};
pub const DIAGNOSIS_CODES: ColumnSpec = ColumnSpec {
    name: "diagnosis_codes",
    aliases: &["diagnosis_codes", "diagnosis_code", "icd_code", "icd_codes"],
    required: false,
};
pub const AGE: ColumnSpec = ColumnSpec {
    name: "age",
    aliases: &["age", "anchor_age"],
    required: false,
};
pub const SEX: ColumnSpec = ColumnSpec {
    name: "sex",
    aliases: &["sex", "gender"],
    required: false,
};
pub const RACE: ColumnSpec = ColumnSpec {
    name: "race",
    aliases: &["race", "ethnicity"],
    required: false,
};

/// Normalizes a header value: trims whitespace and a UTF-8 BOM, lowercases.
pub fn normalize_header(value: &str) -> String {
    value.trim().trim_matches('\u{feff}').trim().to_lowercase()
}

/// Find the column index for `spec`, failing if a required column is absent.
pub fn resolve_column(
    headers: &[String],
    spec: ColumnSpec,
    path: &Path,
) -> Result<Option<usize>> {
    let position = spec.aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|header| normalize_header(header) == *alias)
    });
    if position.is_none() && spec.required {
        return Err(IngestError::MissingColumn {
            column: spec.name.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(position)
}

/// Resolved column positions of the merged event table.
#[derive(Debug, Clone, Copy)]
pub struct EventColumns {
    pub encounter_id: usize,
    pub patient_id: usize,
    pub encounter_type: usize,
    pub arrival: usize,
    pub departure: Option<usize>,
    pub disposition: usize,
    pub admission_source: Option<usize>,
    pub linked_visit_id: Option<usize>,
    pub diagnosis_codes: Option<usize>,
    pub age: Option<usize>,
    pub sex: Option<usize>,
    pub race: Option<usize>,
}

impl EventColumns {
    pub fn resolve(headers: &[String], path: &Path) -> Result<Self> {
        let required = |spec: ColumnSpec| -> Result<usize> {
            resolve_column(headers, spec, path)?.ok_or_else(|| IngestError::MissingColumn {
                column: spec.name.to_string(),
                path: path.to_path_buf(),
            })
        };
        let optional = |spec: ColumnSpec| resolve_column(headers, spec, path);
        Ok(Self {
            encounter_id: required(ENCOUNTER_ID)?,
            patient_id: required(PATIENT_ID)?,
            encounter_type: required(ENCOUNTER_TYPE)?,
            arrival: required(ARRIVAL)?,
            departure: optional(DEPARTURE)?,
            disposition: required(DISPOSITION)?,
            admission_source: optional(ADMISSION_SOURCE)?,
            linked_visit_id: optional(LINKED_VISIT_ID)?,
            diagnosis_codes: optional(DIAGNOSIS_CODES)?,
            age: optional(AGE)?,
            sex: optional(SEX)?,
            race: optional(RACE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_resolves_aliases_case_insensitively() {
        let headers = headers(&[
            "\u{feff}Subject_ID",
            "stay_id",
            "Encounter_Type",
            "INTIME",
            "outtime",
            "disposition",
        ]);
        let columns = EventColumns::resolve(&headers, Path::new("events.csv")).unwrap();
        assert_eq!(columns.patient_id, 0);
        assert_eq!(columns.encounter_id, 1);
        assert_eq!(columns.arrival, 3);
        assert_eq!(columns.departure, Some(4));
        assert_eq!(columns.race, None);
    }

    #[test]
    fn test_missing_required_column() {
        let headers = headers(&["patient_id", "encounter_type", "arrival", "disposition"]);
        let err = EventColumns::resolve(&headers, Path::new("events.csv")).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { ref column, .. } if column == "encounter_id"
        ));
    }

    #[test]
    fn test_canonical_name_preferred_over_later_alias() {
        let headers = headers(&["hadm_id", "encounter_id"]);
        let position = resolve_column(&headers, ENCOUNTER_ID, Path::new("x.csv")).unwrap();
        assert_eq!(position, Some(1));
    }
}

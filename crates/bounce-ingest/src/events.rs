//! Reader for the merged ED-visit / hospital-admission event table.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use bounce_model::{
    AdmissionSource, Demographics, Disposition, EncounterKind, MergedRecord, RaceCategory, Sex,
};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::header::EventColumns;
use crate::timestamp::parse_timestamp;

/// Read the merged event table at `path`.
pub fn read_event_table(path: &Path) -> Result<Vec<MergedRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::open(path.to_path_buf(), source))?;
    parse_records(reader, path)
}

/// Parse a merged event table from any reader; `source` is used in errors.
pub fn parse_event_table<R: Read>(input: R, source: &Path) -> Result<Vec<MergedRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    parse_records(reader, source)
}

fn parse_records<R: Read>(mut reader: csv::Reader<R>, path: &Path) -> Result<Vec<MergedRecord>> {
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
    let columns = EventColumns::resolve(&headers, path)?;
    debug!(path = %path.display(), ?columns, "resolved event table columns");

    let mut records = Vec::new();
    let mut unmapped_race: BTreeSet<String> = BTreeSet::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let row = RowParser {
            record: &record,
            row: index + 1,
            path,
        };
        records.push(row.merged_record(&columns, &mut unmapped_race)?);
    }

    if !unmapped_race.is_empty() {
        warn!(
            values = ?unmapped_race,
            "unmapped race values grouped as Other"
        );
    }
    let ed_rows = records
        .iter()
        .filter(|record| record.kind == EncounterKind::Ed)
        .count();
    info!(
        path = %path.display(),
        rows = records.len(),
        ed_rows,
        admission_rows = records.len() - ed_rows,
        "event table loaded"
    );
    Ok(records)
}

struct RowParser<'a> {
    record: &'a StringRecord,
    row: usize,
    path: &'a Path,
}

impl RowParser<'_> {
    fn cell(&self, index: usize) -> &str {
        self.record.get(index).map(str::trim).unwrap_or("")
    }

    fn optional(&self, index: Option<usize>) -> Option<&str> {
        index.map(|index| self.cell(index)).filter(|value| !value.is_empty())
    }

    fn required(&self, index: usize, column: &str) -> Result<&str> {
        let value = self.cell(index);
        if value.is_empty() {
            return Err(IngestError::MissingValue {
                path: self.path.to_path_buf(),
                row: self.row,
                column: column.to_string(),
            });
        }
        Ok(value)
    }

    fn invalid(&self, column: &str, value: &str, reason: impl Into<String>) -> IngestError {
        IngestError::InvalidValue {
            path: self.path.to_path_buf(),
            row: self.row,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn timestamp(&self, column: &str, value: &str) -> Result<NaiveDateTime> {
        parse_timestamp(value).ok_or_else(|| self.invalid(column, value, "unrecognized timestamp"))
    }

    fn age(&self, value: Option<&str>) -> Result<Option<u32>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let parsed: f64 = value
            .parse()
            .map_err(|_| self.invalid("age", value, "not a number"))?;
        if !parsed.is_finite() || !(0.0..=150.0).contains(&parsed) {
            return Err(self.invalid("age", value, "outside 0-150"));
        }
        Ok(Some(parsed.floor() as u32))
    }

    fn merged_record(
        &self,
        columns: &EventColumns,
        unmapped_race: &mut BTreeSet<String>,
    ) -> Result<MergedRecord> {
        let encounter_id = self.required(columns.encounter_id, "encounter_id")?.to_string();
        let kind_text = self.required(columns.encounter_type, "encounter_type")?;
        let kind: EncounterKind = kind_text
            .parse()
            .map_err(|reason: String| self.invalid("encounter_type", kind_text, reason))?;
        let arrival_text = self.required(columns.arrival, "arrival")?;
        let arrival = self.timestamp("arrival", arrival_text)?;
        let departure = match self.optional(columns.departure) {
            Some(value) => Some(self.timestamp("departure", value)?),
            None => None,
        };

        let linked_visit_id = match kind {
            EncounterKind::Admission => self.optional(columns.linked_visit_id).map(str::to_string),
            EncounterKind::Ed => None,
        };
        let disposition = match kind {
            EncounterKind::Ed => Some(Disposition::from_text(
                self.required(columns.disposition, "disposition")?,
            )),
            EncounterKind::Admission => None,
        };
        let admission_source = match kind {
            EncounterKind::Admission => Some(match self.optional(columns.admission_source) {
                Some(value) => value
                    .parse::<AdmissionSource>()
                    .map_err(|reason| self.invalid("admission_source", value, reason))?,
                None if linked_visit_id.is_some() => AdmissionSource::ViaEd,
                None => AdmissionSource::Direct,
            }),
            EncounterKind::Ed => None,
        };
        let diagnosis_codes = match kind {
            EncounterKind::Ed => self
                .optional(columns.diagnosis_codes)
                .map(split_codes)
                .unwrap_or_default(),
            EncounterKind::Admission => Vec::new(),
        };

        let race = match self.optional(columns.race) {
            None => RaceCategory::Unknown,
            Some(value) => value.parse::<RaceCategory>().unwrap_or_else(|_| {
                unmapped_race.insert(value.to_string());
                RaceCategory::Other
            }),
        };
        let demographics = Demographics {
            age: self.age(self.optional(columns.age))?,
            sex: self.optional(columns.sex).map_or(Sex::Unknown, Sex::from_text),
            race,
        };

        Ok(MergedRecord {
            row: self.row,
            encounter_id,
            patient_id: self.cell(columns.patient_id).to_string(),
            kind,
            arrival,
            departure,
            disposition,
            admission_source,
            linked_visit_id,
            diagnosis_codes,
            demographics,
        })
    }
}

/// Split a `;`-separated code list, keeping order and dropping blanks.
fn split_codes(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

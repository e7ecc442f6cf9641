//! Integration tests for event table and diagnosis lookup reading.

use std::fs;
use std::path::Path;

use bounce_ingest::{IngestError, parse_event_table, read_diagnosis_lookup, read_event_table};
use bounce_model::{AdmissionSource, Disposition, EncounterKind, RaceCategory, Sex};
use tempfile::TempDir;

const HEADER: &str = "encounter_id,patient_id,encounter_type,arrival,departure,disposition,admission_source,linked_visit_id,diagnosis_codes,age,sex,race";

fn parse(body: &str) -> Result<Vec<bounce_model::MergedRecord>, IngestError> {
    let csv = format!("{HEADER}\n{body}");
    parse_event_table(csv.as_bytes(), Path::new("events.csv"))
}

#[test]
fn test_parses_ed_and_admission_rows() {
    let records = parse(
        "ED1,P1,ed,2024-01-01 08:00:00,2024-01-01 12:00:00,HOME,,,R07.9;I10,42,F,WHITE - RUSSIAN\n\
         A1,P1,admission,2024-01-02 09:00:00,2024-01-05 10:00:00,,,ED2,,42,F,WHITE\n\
         A2,P1,admission,2024-01-08 09:00:00,,,elective,,,42,F,WHITE\n",
    )
    .unwrap();

    assert_eq!(records.len(), 3);
    let ed = &records[0];
    assert_eq!(ed.row, 1);
    assert_eq!(ed.kind, EncounterKind::Ed);
    assert_eq!(ed.disposition, Some(Disposition::Discharged));
    assert_eq!(ed.diagnosis_codes, vec!["R07.9", "I10"]);
    assert_eq!(ed.demographics.age, Some(42));
    assert_eq!(ed.demographics.sex, Sex::Female);
    assert_eq!(ed.demographics.race, RaceCategory::White);
    assert_eq!(ed.admission_source, None);

    let linked = &records[1];
    assert_eq!(linked.kind, EncounterKind::Admission);
    assert_eq!(linked.admission_source, Some(AdmissionSource::ViaEd));
    assert_eq!(linked.linked_visit_id.as_deref(), Some("ED2"));
    assert_eq!(linked.disposition, None);

    let scheduled = &records[2];
    assert_eq!(scheduled.admission_source, Some(AdmissionSource::Scheduled));
    assert_eq!(scheduled.departure, None);
}

#[test]
fn test_unlinked_admission_defaults_to_direct() {
    let records =
        parse("A1,P1,admission,2024-01-02 09:00:00,2024-01-03 09:00:00,,,,,,,\n").unwrap();
    assert_eq!(records[0].admission_source, Some(AdmissionSource::Direct));
}

#[test]
fn test_unmapped_race_becomes_other_and_blank_unknown() {
    let records = parse(
        "ED1,P1,ed,2024-01-01 08:00,2024-01-01 10:00,HOME,,,,,M,SOMETHING ELSE\n\
         ED2,P2,ed,2024-01-01 08:00,2024-01-01 10:00,HOME,,,,,,\n",
    )
    .unwrap();
    assert_eq!(records[0].demographics.race, RaceCategory::Other);
    assert_eq!(records[1].demographics.race, RaceCategory::Unknown);
    assert_eq!(records[1].demographics.sex, Sex::Unknown);
}

#[test]
fn test_blank_patient_id_is_passed_through() {
    // Missing patient ids are an integrity error raised by the event store.
    let records = parse("ED1,,ed,2024-01-01 08:00,2024-01-01 10:00,HOME,,,,,,\n").unwrap();
    assert_eq!(records[0].patient_id, "");
}

#[test]
fn test_invalid_timestamp_names_row_and_column() {
    let err = parse(
        "ED1,P1,ed,2024-01-01 08:00,2024-01-01 10:00,HOME,,,,,,\n\
         ED2,P1,ed,not-a-date,,HOME,,,,,,\n",
    )
    .unwrap_err();
    match err {
        IngestError::InvalidValue { row, column, .. } => {
            assert_eq!(row, 2);
            assert_eq!(column, "arrival");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_disposition_on_ed_row() {
    let err = parse("ED1,P1,ed,2024-01-01 08:00,2024-01-01 10:00,,,,,,,\n").unwrap_err();
    assert!(matches!(
        err,
        IngestError::MissingValue { ref column, row: 1, .. } if column == "disposition"
    ));
}

#[test]
fn test_unknown_encounter_type() {
    let err = parse("X1,P1,clinic,2024-01-01 08:00,,HOME,,,,,,\n").unwrap_err();
    assert!(matches!(err, IngestError::InvalidValue { ref column, .. } if column == "encounter_type"));
}

#[test]
fn test_invalid_age() {
    let err = parse("ED1,P1,ed,2024-01-01 08:00,,HOME,,,,-4,,\n").unwrap_err();
    assert!(matches!(err, IngestError::InvalidValue { ref column, .. } if column == "age"));
}

#[test]
fn test_source_aliases() {
    let csv = "subject_id,stay_id,encounter_type,intime,outtime,disposition,icd_code,gender,anchor_age\n\
               10001,30001,ed,2180-07-23 12:35:00,2180-07-23 17:00:00,HOME,R10,F,52\n";
    let records = parse_event_table(csv.as_bytes(), Path::new("edstays.csv")).unwrap();
    assert_eq!(records[0].patient_id, "10001");
    assert_eq!(records[0].encounter_id, "30001");
    assert_eq!(records[0].diagnosis_codes, vec!["R10"]);
    assert_eq!(records[0].demographics.age, Some(52));
}

#[test]
fn test_empty_file_is_rejected() {
    let err = parse_event_table("".as_bytes(), Path::new("empty.csv")).unwrap_err();
    assert!(matches!(err, IngestError::EmptyCsv { .. }));
}

#[test]
fn test_read_event_table_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = read_event_table(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn test_read_event_table_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.csv");
    fs::write(
        &path,
        format!("{HEADER}\nED1,P1,ed,2024-01-01 08:00,2024-01-01 10:00,HOME,,,,,,\n\n"),
    )
    .unwrap();
    let records = read_event_table(&path).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_read_diagnosis_lookup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dx.csv");
    fs::write(
        &path,
        "icd_prefix,description\nR07,Chest pain\nr10,Abdominal pain\n,Skipped\nR07,Duplicate\n",
    )
    .unwrap();
    let lookup = read_diagnosis_lookup(&path).unwrap();
    assert_eq!(lookup.len(), 2);
    assert_eq!(lookup.get("R07").map(String::as_str), Some("Chest pain"));
    assert_eq!(lookup.get("R10").map(String::as_str), Some("Abdominal pain"));
}

#[test]
fn test_diagnosis_lookup_requires_category() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dx.csv");
    fs::write(&path, "code,category\nR07,\n").unwrap();
    let err = read_diagnosis_lookup(&path).unwrap_err();
    assert!(matches!(err, IngestError::MissingValue { row: 1, .. }));
}

//! Fatal error kinds for a bounce-back analysis run.
//!
//! Integrity and configuration errors halt the run before any output is
//! written. Sparse strata are not errors; see [`crate::SparseStratumWarning`].

use chrono::NaiveDateTime;
use thiserror::Error;

/// Malformed or inconsistent input record.
///
/// Every variant names the offending record by source row and encounter id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    /// Patient identifier is missing or blank.
    #[error("row {row}: encounter '{encounter_id}' has no patient id")]
    MissingPatientId { row: usize, encounter_id: String },

    /// Departure (or hospital discharge) precedes arrival.
    #[error(
        "row {row}: encounter '{encounter_id}' departs at {departure} before arriving at {arrival}"
    )]
    DepartureBeforeArrival {
        row: usize,
        encounter_id: String,
        arrival: NaiveDateTime,
        departure: NaiveDateTime,
    },

    /// The same encounter id appears more than once for one encounter type.
    #[error("row {row}: duplicate {kind} encounter id '{encounter_id}'")]
    DuplicateEncounter {
        row: usize,
        kind: &'static str,
        encounter_id: String,
    },

    /// An admission references an ED visit that is not in the table.
    #[error("row {row}: admission '{admission_id}' links to unknown ED visit '{visit_id}'")]
    UnknownLinkedVisit {
        row: usize,
        admission_id: String,
        visit_id: String,
    },

    /// An admission references an ED visit of another patient.
    #[error(
        "row {row}: admission '{admission_id}' of patient '{patient_id}' links to ED visit '{visit_id}' of patient '{visit_patient_id}'"
    )]
    LinkedVisitPatientMismatch {
        row: usize,
        admission_id: String,
        patient_id: String,
        visit_id: String,
        visit_patient_id: String,
    },

    /// The admission starts before the linked ED visit's arrival.
    #[error(
        "row {row}: admission '{admission_id}' at {admitted_at} precedes arrival of linked ED visit '{visit_id}' at {visit_arrival}"
    )]
    AdmissionBeforeLinkedVisit {
        row: usize,
        admission_id: String,
        admitted_at: NaiveDateTime,
        visit_id: String,
        visit_arrival: NaiveDateTime,
    },

    /// A linked ED visit id on a direct or scheduled admission.
    #[error(
        "row {row}: admission '{admission_id}' has source '{source_label}' but links to ED visit '{visit_id}'"
    )]
    LinkedVisitOnNonEdSource {
        row: usize,
        admission_id: String,
        source_label: &'static str,
        visit_id: String,
    },
}

impl DataIntegrityError {
    /// Source row of the offending record.
    pub fn row(&self) -> usize {
        match self {
            Self::MissingPatientId { row, .. }
            | Self::DepartureBeforeArrival { row, .. }
            | Self::DuplicateEncounter { row, .. }
            | Self::UnknownLinkedVisit { row, .. }
            | Self::LinkedVisitPatientMismatch { row, .. }
            | Self::AdmissionBeforeLinkedVisit { row, .. }
            | Self::LinkedVisitOnNonEdSource { row, .. } => *row,
        }
    }
}

/// Non-positive or nonsensical window configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {parameter} '{value}': {reason}")]
pub struct InvalidWindowError {
    /// Name of the offending option.
    pub parameter: &'static str,
    /// The rejected value, rendered as given.
    pub value: String,
    pub reason: &'static str,
}

/// Fatal errors raised by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),
    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindowError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_record() {
        let err = DataIntegrityError::MissingPatientId {
            row: 7,
            encounter_id: "ED-1".to_string(),
        };
        assert_eq!(err.to_string(), "row 7: encounter 'ED-1' has no patient id");
        assert_eq!(err.row(), 7);
    }

    #[test]
    fn test_invalid_window_display() {
        let err = InvalidWindowError {
            parameter: "observation_window_days",
            value: "0".to_string(),
            reason: "must be greater than zero",
        };
        assert_eq!(
            err.to_string(),
            "invalid observation_window_days '0': must be greater than zero"
        );
        let wrapped: AnalysisError = err.into();
        assert!(matches!(wrapped, AnalysisError::InvalidWindow(_)));
    }
}

//! Strongly typed encounter records.
//!
//! [`MergedRecord`] is one row of the cleaned, merged event table as
//! delivered by the upstream data-cleaning step. The event store turns these
//! rows into [`EdVisit`] and [`HospitalAdmission`] records grouped under a
//! [`Patient`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::enums::{AdmissionSource, Disposition, EncounterKind, RaceCategory, Sex};

/// Demographic attributes carried on each merged row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: Option<u32>,
    pub sex: Sex,
    pub race: RaceCategory,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            age: None,
            sex: Sex::Unknown,
            race: RaceCategory::Unknown,
        }
    }
}

/// One row of the merged event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    /// 1-based data row in the source table (header excluded).
    pub row: usize,
    pub encounter_id: String,
    pub patient_id: String,
    pub kind: EncounterKind,
    /// ED arrival, or admission time for admissions.
    pub arrival: NaiveDateTime,
    /// ED departure, or hospital discharge for admissions.
    pub departure: Option<NaiveDateTime>,
    /// Only meaningful for ED rows.
    pub disposition: Option<Disposition>,
    /// Only meaningful for admission rows.
    pub admission_source: Option<AdmissionSource>,
    pub linked_visit_id: Option<String>,
    /// Ordered; the first code is the primary diagnosis.
    pub diagnosis_codes: Vec<String>,
    pub demographics: Demographics,
}

/// Reference data for one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub demographics: Demographics,
}

/// An emergency department encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdVisit {
    pub id: String,
    pub patient_id: String,
    pub arrival: NaiveDateTime,
    pub departure: Option<NaiveDateTime>,
    pub disposition: Disposition,
    pub diagnosis_codes: Vec<String>,
    pub row: usize,
}

impl EdVisit {
    pub fn primary_diagnosis(&self) -> Option<&str> {
        self.diagnosis_codes.first().map(String::as_str)
    }

    /// Length of stay in hours, when the departure is known.
    pub fn length_of_stay_hours(&self) -> Option<f64> {
        self.departure
            .map(|departure| (departure - self.arrival).num_seconds() as f64 / 3600.0)
    }
}

/// An inpatient hospital admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalAdmission {
    pub id: String,
    pub patient_id: String,
    pub admitted_at: NaiveDateTime,
    pub discharged_at: Option<NaiveDateTime>,
    pub source: AdmissionSource,
    /// ED visit the patient was admitted through, when known.
    pub linked_visit_id: Option<String>,
    pub row: usize,
}

impl HospitalAdmission {
    pub fn is_linked_to(&self, visit_id: &str) -> bool {
        self.linked_visit_id.as_deref() == Some(visit_id)
    }
}

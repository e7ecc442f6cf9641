//! Validated, per-patient store of ED visits and hospital admissions.
//!
//! The store is built once from the merged event table and never mutated.
//! Each patient's ED visits are sorted by arrival and admissions by admission
//! time (ties broken by id), so the linker can binary-search follow-ups.

use std::collections::{BTreeMap, BTreeSet};

use bounce_model::{
    AdmissionSource, CohortStats, DataIntegrityError, Disposition, EdVisit, EncounterKind,
    HospitalAdmission, MergedRecord, Patient,
};
use chrono::NaiveDateTime;
use tracing::{debug, info};

/// All encounters of one patient.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientEvents {
    pub patient: Patient,
    /// Sorted by arrival, then id.
    pub ed_visits: Vec<EdVisit>,
    /// Sorted by admission time, then id.
    pub admissions: Vec<HospitalAdmission>,
    linked_visits: BTreeSet<String>,
}

impl PatientEvents {
    fn new(patient: Patient) -> Self {
        Self {
            patient,
            ed_visits: Vec::new(),
            admissions: Vec::new(),
            linked_visits: BTreeSet::new(),
        }
    }

    /// True when some admission names `visit_id` as the ED visit it came through.
    pub fn has_linked_admission(&self, visit_id: &str) -> bool {
        self.linked_visits.contains(visit_id)
    }

    /// The visit ended in a hospital admission, by disposition or by link.
    pub fn visit_resulted_in_admission(&self, visit: &EdVisit) -> bool {
        visit.disposition == Disposition::Admitted || self.has_linked_admission(&visit.id)
    }

    /// Discharged, departed, and not the source of any admission.
    pub fn is_index_visit(&self, visit: &EdVisit) -> bool {
        visit.disposition == Disposition::Discharged
            && visit.departure.is_some()
            && !self.has_linked_admission(&visit.id)
    }

    fn sort(&mut self) {
        self.ed_visits
            .sort_by(|a, b| a.arrival.cmp(&b.arrival).then_with(|| a.id.cmp(&b.id)));
        self.admissions.sort_by(|a, b| {
            a.admitted_at
                .cmp(&b.admitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// An ED discharge eligible for follow-up linkage.
#[derive(Debug, Clone, Copy)]
pub struct IndexEvent<'a> {
    pub patient: &'a PatientEvents,
    pub visit: &'a EdVisit,
    pub departure: NaiveDateTime,
}

/// Index events plus the QA counts of how they were selected.
#[derive(Debug, Clone)]
pub struct IndexCohort<'a> {
    pub events: Vec<IndexEvent<'a>>,
    pub stats: CohortStats,
}

/// In-memory, validated table of encounters grouped by patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    patients: BTreeMap<String, PatientEvents>,
    ed_visit_count: usize,
    admission_count: usize,
    max_timestamp: Option<NaiveDateTime>,
}

/// Where an ED visit was seen while building the store.
struct VisitRef {
    patient_id: String,
    arrival: NaiveDateTime,
}

impl EventStore {
    /// Validate and group merged records.
    ///
    /// Fails on the first record that breaks an integrity rule; records are
    /// checked in source order, linked-visit checks after all ED visits are known.
    pub fn load(records: &[MergedRecord]) -> Result<Self, DataIntegrityError> {
        let mut patients: BTreeMap<String, PatientEvents> = BTreeMap::new();
        let mut visits: BTreeMap<String, VisitRef> = BTreeMap::new();
        let mut admission_ids: BTreeSet<String> = BTreeSet::new();
        let mut admissions: Vec<HospitalAdmission> = Vec::new();
        let mut max_timestamp: Option<NaiveDateTime> = None;

        for record in records {
            let patient_id = record.patient_id.trim();
            if patient_id.is_empty() {
                return Err(DataIntegrityError::MissingPatientId {
                    row: record.row,
                    encounter_id: record.encounter_id.clone(),
                });
            }
            if let Some(departure) = record
                .departure
                .filter(|departure| *departure < record.arrival)
            {
                return Err(DataIntegrityError::DepartureBeforeArrival {
                    row: record.row,
                    encounter_id: record.encounter_id.clone(),
                    arrival: record.arrival,
                    departure,
                });
            }
            max_timestamp = max_timestamp.max(Some(record.arrival)).max(record.departure);

            let events = patients
                .entry(patient_id.to_string())
                .or_insert_with(|| {
                    PatientEvents::new(Patient {
                        id: patient_id.to_string(),
                        demographics: record.demographics.clone(),
                    })
                });

            match record.kind {
                EncounterKind::Ed => {
                    if visits.contains_key(&record.encounter_id) {
                        return Err(DataIntegrityError::DuplicateEncounter {
                            row: record.row,
                            kind: "ED visit",
                            encounter_id: record.encounter_id.clone(),
                        });
                    }
                    visits.insert(
                        record.encounter_id.clone(),
                        VisitRef {
                            patient_id: patient_id.to_string(),
                            arrival: record.arrival,
                        },
                    );
                    events.ed_visits.push(EdVisit {
                        id: record.encounter_id.clone(),
                        patient_id: patient_id.to_string(),
                        arrival: record.arrival,
                        departure: record.departure,
                        disposition: record.disposition.unwrap_or(Disposition::Other),
                        diagnosis_codes: record.diagnosis_codes.clone(),
                        row: record.row,
                    });
                }
                EncounterKind::Admission => {
                    if !admission_ids.insert(record.encounter_id.clone()) {
                        return Err(DataIntegrityError::DuplicateEncounter {
                            row: record.row,
                            kind: "admission",
                            encounter_id: record.encounter_id.clone(),
                        });
                    }
                    let source = record.admission_source.unwrap_or(
                        if record.linked_visit_id.is_some() {
                            AdmissionSource::ViaEd
                        } else {
                            AdmissionSource::Direct
                        },
                    );
                    if let Some(visit_id) = &record.linked_visit_id
                        && source != AdmissionSource::ViaEd
                    {
                        return Err(DataIntegrityError::LinkedVisitOnNonEdSource {
                            row: record.row,
                            admission_id: record.encounter_id.clone(),
                            source_label: source.as_str(),
                            visit_id: visit_id.clone(),
                        });
                    }
                    admissions.push(HospitalAdmission {
                        id: record.encounter_id.clone(),
                        patient_id: patient_id.to_string(),
                        admitted_at: record.arrival,
                        discharged_at: record.departure,
                        source,
                        linked_visit_id: record.linked_visit_id.clone(),
                        row: record.row,
                    });
                }
            }
        }

        let ed_visit_count = visits.len();
        let admission_count = admissions.len();
        for admission in admissions {
            if let Some(visit_id) = &admission.linked_visit_id {
                let Some(visit) = visits.get(visit_id) else {
                    return Err(DataIntegrityError::UnknownLinkedVisit {
                        row: admission.row,
                        admission_id: admission.id.clone(),
                        visit_id: visit_id.clone(),
                    });
                };
                if visit.patient_id != admission.patient_id {
                    return Err(DataIntegrityError::LinkedVisitPatientMismatch {
                        row: admission.row,
                        admission_id: admission.id.clone(),
                        patient_id: admission.patient_id.clone(),
                        visit_id: visit_id.clone(),
                        visit_patient_id: visit.patient_id.clone(),
                    });
                }
                if admission.admitted_at < visit.arrival {
                    return Err(DataIntegrityError::AdmissionBeforeLinkedVisit {
                        row: admission.row,
                        admission_id: admission.id.clone(),
                        admitted_at: admission.admitted_at,
                        visit_id: visit_id.clone(),
                        visit_arrival: visit.arrival,
                    });
                }
            }
            if let Some(events) = patients.get_mut(&admission.patient_id) {
                if let Some(visit_id) = &admission.linked_visit_id {
                    events.linked_visits.insert(visit_id.clone());
                }
                events.admissions.push(admission);
            }
        }

        for events in patients.values_mut() {
            events.sort();
        }

        info!(
            patients = patients.len(),
            ed_visits = ed_visit_count,
            admissions = admission_count,
            "event store loaded"
        );
        debug!(max_timestamp = ?max_timestamp, "dataset time range");

        Ok(Self {
            patients,
            ed_visit_count,
            admission_count,
            max_timestamp,
        })
    }

    /// Patients in id order.
    pub fn patient(&self, patient_id: &str) -> Option<&PatientEvents> {
        self.patients.get(patient_id)
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    pub fn ed_visit_count(&self) -> usize {
        self.ed_visit_count
    }

    pub fn admission_count(&self) -> usize {
        self.admission_count
    }

    /// Latest arrival, departure, admission or discharge in the dataset.
    pub fn max_timestamp(&self) -> Option<NaiveDateTime> {
        self.max_timestamp
    }

    /// Select index events, ordered by patient id then arrival.
    ///
    /// Every ED visit lands in exactly one QA bucket: admitted from ED,
    /// excluded by disposition, missing departure, departed after `cutoff`,
    /// or index event.
    pub fn index_cohort(&self, cutoff: Option<NaiveDateTime>) -> IndexCohort<'_> {
        let mut stats = CohortStats {
            patients: self.patients.len(),
            ed_visits: self.ed_visit_count,
            admissions: self.admission_count,
            ..CohortStats::default()
        };
        let mut events = Vec::new();
        for patient in self.patients.values() {
            for visit in &patient.ed_visits {
                if patient.visit_resulted_in_admission(visit) {
                    stats.admitted_from_ed += 1;
                    continue;
                }
                if visit.disposition != Disposition::Discharged {
                    stats.excluded_disposition += 1;
                    continue;
                }
                let Some(departure) = visit.departure else {
                    stats.missing_departure += 1;
                    continue;
                };
                if cutoff.is_some_and(|cutoff| departure > cutoff) {
                    stats.after_cutoff += 1;
                    continue;
                }
                events.push(IndexEvent {
                    patient,
                    visit,
                    departure,
                });
            }
        }
        stats.index_events = events.len();
        info!(
            index_events = stats.index_events,
            admitted_from_ed = stats.admitted_from_ed,
            excluded_disposition = stats.excluded_disposition,
            missing_departure = stats.missing_departure,
            after_cutoff = stats.after_cutoff,
            "index cohort built"
        );
        IndexCohort { events, stats }
    }
}

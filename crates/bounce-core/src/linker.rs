//! Follow-up linkage for index ED discharges.

use bounce_model::{EdVisit, HospitalAdmission, ObservationWindow};
use chrono::NaiveDateTime;

use crate::censoring::WindowStatus;
use crate::event_store::IndexEvent;

/// Candidate follow-up events of one index event, ascending by time.
#[derive(Debug, Clone)]
pub struct FollowUps<'a> {
    pub ed_revisits: Vec<&'a EdVisit>,
    pub admissions: Vec<&'a HospitalAdmission>,
    pub window: WindowStatus,
}

/// Finds follow-ups inside the observation window of an index event.
#[derive(Debug, Clone, Copy)]
pub struct Linker {
    window: ObservationWindow,
    cutoff: NaiveDateTime,
}

impl Linker {
    pub fn new(window: ObservationWindow, cutoff: NaiveDateTime) -> Self {
        Self { window, cutoff }
    }

    /// ED revisits arriving in `(departure, end]` and admissions in
    /// `(departure - tolerance, end]`, where `end` is `departure + W` capped
    /// at the cutoff. Nothing after the cutoff was collected.
    ///
    /// Binary search over the patient's sorted encounter vectors.
    pub fn find_follow_ups<'a>(&self, index: &IndexEvent<'a>) -> FollowUps<'a> {
        let departure = index.departure;
        let end = self.window.end_after(departure).min(self.cutoff);

        let visits = &index.patient.ed_visits;
        let first_visit = visits.partition_point(|visit| visit.arrival <= departure);
        let last_visit = visits.partition_point(|visit| visit.arrival <= end);
        let ed_revisits = visits[first_visit..last_visit]
            .iter()
            .collect();

        let admissions = &index.patient.admissions;
        let earliest = departure - self.window.clock_tolerance();
        let first_admission =
            admissions.partition_point(|admission| admission.admitted_at <= earliest);
        let last_admission = admissions.partition_point(|admission| admission.admitted_at <= end);
        let admissions = admissions[first_admission..last_admission]
            .iter()
            .collect();

        FollowUps {
            ed_revisits,
            admissions,
            window: WindowStatus::of(departure, &self.window, self.cutoff),
        }
    }
}

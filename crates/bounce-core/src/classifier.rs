//! Four-category outcome classification.
//!
//! Evidence is reduced from the linker output first; [`classify`] is then a
//! single total function over that evidence, so every index event receives
//! exactly one [`OutcomeLabel`].

use bounce_model::{OutcomeLabel, OverlapDefinition};
use chrono::{NaiveDateTime, TimeDelta};

use crate::event_store::PatientEvents;
use crate::linker::FollowUps;

/// Earliest ED revisit in the window and whether any revisit led to admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisitEvidence {
    /// Delay from index departure to the first revisit arrival.
    pub first: TimeDelta,
    pub admitted: bool,
}

/// What the observation window shows for one index event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowUpEvidence {
    pub revisit: Option<RevisitEvidence>,
    /// Delay to the first qualifying admission.
    pub admission: Option<TimeDelta>,
}

impl FollowUpEvidence {
    /// Reduce linked follow-ups to evidence under `definition`.
    ///
    /// With [`OverlapDefinition::Attributed`] an admission linked to an ED
    /// visit other than one of this window's revisits belongs to that visit
    /// and is ignored. With [`OverlapDefinition::RevisitThenAdmit`] an
    /// admission before the first revisit arrival is ignored once a revisit
    /// exists. Admission delays within the clock tolerance are clamped to zero.
    pub fn from_follow_ups(
        departure: NaiveDateTime,
        follow_ups: &FollowUps<'_>,
        patient: &PatientEvents,
        definition: OverlapDefinition,
    ) -> Self {
        let revisit = follow_ups.ed_revisits.first().map(|first| RevisitEvidence {
            first: first.arrival - departure,
            admitted: follow_ups
                .ed_revisits
                .iter()
                .any(|visit| patient.visit_resulted_in_admission(visit)),
        });

        let first_arrival = follow_ups.ed_revisits.first().map(|visit| visit.arrival);
        let admission = follow_ups
            .admissions
            .iter()
            .find(|admission| match definition {
                OverlapDefinition::Concurrent => true,
                OverlapDefinition::Attributed => match &admission.linked_visit_id {
                    None => true,
                    Some(visit_id) => follow_ups
                        .ed_revisits
                        .iter()
                        .any(|visit| &visit.id == visit_id),
                },
                OverlapDefinition::RevisitThenAdmit => {
                    first_arrival.is_none_or(|arrival| admission.admitted_at >= arrival)
                }
            })
            .map(|admission| (admission.admitted_at - departure).max(TimeDelta::zero()));

        Self { revisit, admission }
    }
}

/// Outcome label and time to the earliest qualifying follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: OutcomeLabel,
    pub time_to_event: Option<TimeDelta>,
}

/// Decision rule over the evidence of one index event.
pub fn classify(evidence: &FollowUpEvidence) -> Classification {
    let (label, time_to_event) = match (evidence.revisit, evidence.admission) {
        (
            Some(RevisitEvidence {
                first,
                admitted: true,
            }),
            admission,
        ) => (
            OutcomeLabel::Both,
            Some(admission.map_or(first, |admission| first.min(admission))),
        ),
        (Some(revisit), Some(admission)) => {
            (OutcomeLabel::Both, Some(revisit.first.min(admission)))
        }
        (Some(revisit), None) => (OutcomeLabel::EdOnly, Some(revisit.first)),
        (None, Some(admission)) => (OutcomeLabel::AdmitOnly, Some(admission)),
        (None, None) => (OutcomeLabel::Neither, None),
    };
    Classification {
        label,
        time_to_event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revisit(hours: i64, admitted: bool) -> Option<RevisitEvidence> {
        Some(RevisitEvidence {
            first: TimeDelta::hours(hours),
            admitted,
        })
    }

    #[test]
    fn test_admitted_revisit_is_both_without_admission_evidence() {
        let result = classify(&FollowUpEvidence {
            revisit: revisit(24, true),
            admission: None,
        });
        assert_eq!(result.label, OutcomeLabel::Both);
        assert_eq!(result.time_to_event, Some(TimeDelta::hours(24)));
    }

    #[test]
    fn test_both_takes_earlier_event() {
        let result = classify(&FollowUpEvidence {
            revisit: revisit(30, false),
            admission: Some(TimeDelta::hours(12)),
        });
        assert_eq!(result.label, OutcomeLabel::Both);
        assert_eq!(result.time_to_event, Some(TimeDelta::hours(12)));
    }

    #[test]
    fn test_single_stream_labels() {
        let ed_only = classify(&FollowUpEvidence {
            revisit: revisit(5, false),
            admission: None,
        });
        assert_eq!(ed_only.label, OutcomeLabel::EdOnly);
        assert_eq!(ed_only.time_to_event, Some(TimeDelta::hours(5)));

        let admit_only = classify(&FollowUpEvidence {
            revisit: None,
            admission: Some(TimeDelta::hours(48)),
        });
        assert_eq!(admit_only.label, OutcomeLabel::AdmitOnly);
        assert_eq!(admit_only.time_to_event, Some(TimeDelta::hours(48)));
    }

    #[test]
    fn test_no_evidence_is_neither() {
        let result = classify(&FollowUpEvidence::default());
        assert_eq!(result.label, OutcomeLabel::Neither);
        assert_eq!(result.time_to_event, None);
    }
}

//! Complete vs censored observation windows.
//!
//! A window is censored when it extends past the last moment the dataset can
//! speak for: the configured data cutoff, or the latest recorded timestamp.
//! A `NEITHER` outcome in a censored window means "window incomplete", not
//! "confirmed absent".

use bounce_model::ObservationWindow;
use chrono::NaiveDateTime;

/// Whether an index event's observation window is fully covered by the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Complete,
    Censored,
}

impl WindowStatus {
    pub fn of(departure: NaiveDateTime, window: &ObservationWindow, cutoff: NaiveDateTime) -> Self {
        if is_censored(departure, window, cutoff) {
            WindowStatus::Censored
        } else {
            WindowStatus::Complete
        }
    }

    pub fn is_censored(&self) -> bool {
        matches!(self, WindowStatus::Censored)
    }
}

/// True iff `departure + window` lies after `dataset_max`.
pub fn is_censored(
    departure: NaiveDateTime,
    window: &ObservationWindow,
    dataset_max: NaiveDateTime,
) -> bool {
    window.end_after(departure) > dataset_max
}

/// The explicit cutoff when configured, else the dataset's latest timestamp.
pub fn resolve_cutoff(
    data_cutoff: Option<NaiveDateTime>,
    dataset_max: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    data_cutoff.or(dataset_max)
}

//! Cohort construction and outcome classification for ED bounce-back analysis.
//!
//! Control flow: [`EventStore`] → [`Linker`] → [`classify`] → [`aggregate`],
//! with the censoring policy consulted by the linker and the rate calculator.
//! [`AnalysisContext`] runs the stages in order.

pub mod censoring;
pub mod classifier;
pub mod diagnosis;
pub mod event_store;
pub mod linker;
pub mod pipeline;
pub mod rates;

pub use censoring::{WindowStatus, is_censored, resolve_cutoff};
pub use classifier::{Classification, FollowUpEvidence, RevisitEvidence, classify};
pub use diagnosis::{DiagnosisLookup, UNKNOWN_CATEGORY, UNMAPPED_CATEGORY};
pub use event_store::{EventStore, IndexCohort, IndexEvent, PatientEvents};
pub use linker::{FollowUps, Linker};
pub use pipeline::{AnalysisContext, AnalysisOutput};
pub use rates::{RateSettings, aggregate, month_range, rate_for};

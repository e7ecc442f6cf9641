pub mod cohort;
pub mod enums;
pub mod error;
pub mod options;
pub mod privacy;
pub mod rates;
pub mod records;

pub use cohort::{ClassifiedVisit, CohortStats, LabelCounts, StratumAttributes};
pub use enums::{
    AdmissionSource, AgeGroup, Disposition, EncounterKind, OutcomeLabel, RaceCategory, Sex,
};
pub use error::{AnalysisError, DataIntegrityError, InvalidWindowError, Result};
pub use options::{
    AnalysisOptions, CensoringPolicy, DEFAULT_SPARSE_THRESHOLD, DEFAULT_WINDOW_DAYS,
    MAX_WINDOW_DAYS, ObservationWindow, OverlapDefinition, StratumDimension,
};
pub use privacy::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data_enabled};
pub use rates::{AggregateRate, SparseReason, SparseStratumWarning, StratumKey, percentage};
pub use records::{Demographics, EdVisit, HospitalAdmission, MergedRecord, Patient};

//! Input tables for the bounce-back engine: the merged event table produced
//! by the upstream cleaning step and the diagnosis grouping lookup.

pub mod diagnosis;
pub mod error;
pub mod events;
pub mod header;
pub mod timestamp;

pub use diagnosis::{normalize_code, read_diagnosis_lookup};
pub use error::{IngestError, Result};
pub use events::{parse_event_table, read_event_table};
pub use header::{ColumnSpec, EventColumns, normalize_header, resolve_column};
pub use timestamp::{format_timestamp, parse_timestamp};

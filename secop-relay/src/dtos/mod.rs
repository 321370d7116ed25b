pub mod contracts;

pub use contracts::{AnalysisEnvelope, DateParams, DateQuery, RecordsEnvelope};

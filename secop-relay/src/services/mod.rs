pub mod analyzer;
pub mod providers;
pub mod query;
pub mod secop;

pub use analyzer::{AnalysisResult, RelevanceAnalyzer};
pub use query::{FieldSet, FixedFilters, QueryProfile, QuerySpec};
pub use secop::{fetch_records, FetchError, RecordSource, SecopClient, SecopConfig};

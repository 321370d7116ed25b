use crate::domain::DateSpec;
use crate::models::ContractRecord;
use crate::services::AnalysisResult;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// Query string shared by the record endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    /// Earliest publication date, `YYYY-MM-DD`. Defaults to the previous business day.
    pub fecha: Option<String>,
}

/// `fecha` extracted from the query string.
///
/// A query string that does not deserialize (e.g. `fecha` given twice) is a
/// JSON 400 like every other bad request, not axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct DateQuery(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for DateQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<DateParams>::try_from_uri(&parts.uri).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Invalid query string: {}", e.body_text()))
        })?;

        Ok(DateQuery(params.fecha))
    }
}

/// Body of `/raw` and `/filtered`.
#[derive(Debug, Serialize)]
pub struct RecordsEnvelope {
    pub date_used: DateSpec,
    pub total_records: usize,
    pub data: Vec<ContractRecord>,
}

impl RecordsEnvelope {
    pub fn new(date_used: DateSpec, data: Vec<ContractRecord>) -> Self {
        Self {
            date_used,
            total_records: data.len(),
            data,
        }
    }
}

/// Body of `/analyzed`.
#[derive(Debug, Serialize)]
pub struct AnalysisEnvelope {
    pub date_used: DateSpec,
    pub total_records_analyzed: usize,
    pub ai_analysis: AnalysisResult,
}

use crate::dtos::{AnalysisEnvelope, DateQuery, RecordsEnvelope};
use crate::services::{fetch_records, FieldSet};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// Every SECOP column for processes published since the resolved date.
#[tracing::instrument(skip(state))]
pub async fn raw_contracts(
    State(state): State<AppState>,
    DateQuery(fecha): DateQuery,
) -> Result<Json<RecordsEnvelope>, AppError> {
    records_for(&state, FieldSet::All, fecha.as_deref())
        .await
        .map(Json)
}

/// Same filter as `/raw`, limited to the curated 20-field selection.
#[tracing::instrument(skip(state))]
pub async fn filtered_contracts(
    State(state): State<AppState>,
    DateQuery(fecha): DateQuery,
) -> Result<Json<RecordsEnvelope>, AppError> {
    records_for(&state, FieldSet::FullFiltered, fecha.as_deref())
        .await
        .map(Json)
}

/// Reduced records scored for relevance by the chat model.
#[tracing::instrument(skip(state))]
pub async fn analyzed_contracts(
    State(state): State<AppState>,
    DateQuery(fecha): DateQuery,
) -> Result<Json<AnalysisEnvelope>, AppError> {
    let date_used = state.dates.resolve(fecha.as_deref())?;
    let query = state.profile.query_for(FieldSet::Reduced, date_used);
    let records = fetch_records(state.records.as_ref(), &query).await;

    tracing::info!(date = %date_used, count = records.len(), "Analyzing SECOP records");
    let ai_analysis = state.analyzer.analyze(&records).await;

    Ok(Json(AnalysisEnvelope {
        date_used,
        total_records_analyzed: records.len(),
        ai_analysis,
    }))
}

async fn records_for(
    state: &AppState,
    field_set: FieldSet,
    fecha: Option<&str>,
) -> Result<RecordsEnvelope, AppError> {
    let date_used = state.dates.resolve(fecha)?;
    let query = state.profile.query_for(field_set, date_used);
    let data = fetch_records(state.records.as_ref(), &query).await;

    tracing::info!(
        date = %date_used,
        field_set = ?field_set,
        count = data.len(),
        "Served SECOP records"
    );

    Ok(RecordsEnvelope::new(date_used, data))
}

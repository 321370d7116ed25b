//! Relevance scoring of contracting processes by a chat model.
//!
//! The model gets a fixed instruction describing the firm and the legal
//! framework, plus the records as JSON, and must answer with JSON. Whatever
//! JSON it produces is passed through untouched; failures become explicit
//! markers instead of HTTP errors.

use crate::models::ContractRecord;
use crate::services::providers::{ChatMessage, ChatParams, ChatProvider};
use metrics::counter;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_FIRM_NAME: &str = "la firma de ingeniería";

pub const COMMUNICATION_ERROR: &str = "communication error";
pub const INVALID_JSON: &str = "invalid JSON from model";
pub const NO_CONTENT: &str = "no content";

const SYSTEM_PROMPT_TEMPLATE: &str = "\
Eres un experto en contratación pública colombiana (Ley 80 de 1993, Ley 1150 de 2007 \
y el Decreto 1082 de 2015) y en el Sistema Electrónico de Contratación Pública SECOP II.

Evalúas procesos de contratación para {firm}, una firma dedicada exclusivamente a \
consultoría y diseño de ingeniería: estudios, diseños, interventoría de diseños y \
asesoría técnica. La firma NO ejecuta obras: descarta cualquier proceso cuyo objeto \
principal sea construcción, mantenimiento, suministro o ejecución de obra, aunque \
incluya componentes de diseño.

Para cada proceso relevante indica por qué encaja con el perfil de la firma.

Responde únicamente con JSON válido, sin texto adicional, con esta forma:
{\"procesos_relevantes\": [{\"id_del_proceso\": \"...\", \"entidad\": \"...\", \
\"nombre_del_procedimiento\": \"...\", \"precio_base\": \"...\", \"urlproceso\": \"...\", \
\"justificacion\": \"...\"}], \"resumen\": \"...\"}
Si ningún proceso es relevante, devuelve una lista vacía en \"procesos_relevantes\".";

/// Outcome of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    /// Whatever JSON the model produced.
    Judgment(Value),
    /// Nothing was sent because there were no records.
    NoRecords,
    /// The chat API could not be reached or refused the request.
    CommunicationError(String),
    /// The reply was not JSON after fence stripping.
    InvalidJson { raw: String },
    /// The reply carried no text.
    NoContent,
}

impl AnalysisResult {
    pub fn to_value(&self) -> Value {
        match self {
            AnalysisResult::Judgment(value) => value.clone(),
            AnalysisResult::NoRecords => json!({
                "procesos_relevantes": [],
                "message": "no records to analyze",
            }),
            AnalysisResult::CommunicationError(details) => json!({
                "error": COMMUNICATION_ERROR,
                "details": details,
            }),
            AnalysisResult::InvalidJson { raw } => json!({
                "error": INVALID_JSON,
                "raw": raw,
            }),
            AnalysisResult::NoContent => json!({ "error": NO_CONTENT }),
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            AnalysisResult::Judgment(_) => "ok",
            AnalysisResult::NoRecords => "no_records",
            AnalysisResult::CommunicationError(_) => "communication_error",
            AnalysisResult::InvalidJson { .. } => "invalid_json",
            AnalysisResult::NoContent => "no_content",
        }
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalysisResult::Judgment(value) => value.serialize(serializer),
            other => other.to_value().serialize(serializer),
        }
    }
}

/// Remove one leading fence marker (with an optional language tag such as
/// `json`) and one trailing fence marker, then trim.
///
/// This is text cleanup, not a Markdown parser: inner fences are left alone.
pub fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        cleaned = &rest[tag_len..];
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }

    cleaned.trim()
}

/// Turn raw model output into an [`AnalysisResult`].
pub fn parse_reply(content: Option<&str>) -> AnalysisResult {
    let Some(text) = content.filter(|text| !text.trim().is_empty()) else {
        return AnalysisResult::NoContent;
    };

    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => AnalysisResult::Judgment(value),
        Err(e) => {
            tracing::warn!(error = %e, reply_len = cleaned.len(), "Model reply is not valid JSON");
            AnalysisResult::InvalidJson {
                raw: cleaned.to_string(),
            }
        }
    }
}

pub fn system_prompt(firm_name: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{firm}", firm_name)
}

fn user_prompt(records: &[ContractRecord]) -> String {
    let payload = Value::Array(records.iter().cloned().map(Value::Object).collect());
    format!(
        "Analiza los siguientes {} procesos de contratación publicados en SECOP II:\n{}",
        records.len(),
        payload
    )
}

/// Sends records to a chat provider and interprets the reply.
#[derive(Clone)]
pub struct RelevanceAnalyzer {
    provider: Arc<dyn ChatProvider>,
    system_prompt: String,
}

impl RelevanceAnalyzer {
    pub fn new(provider: Arc<dyn ChatProvider>, firm_name: &str) -> Self {
        Self {
            provider,
            system_prompt: system_prompt(firm_name),
        }
    }

    pub async fn analyze(&self, records: &[ContractRecord]) -> AnalysisResult {
        let result = if records.is_empty() {
            AnalysisResult::NoRecords
        } else {
            self.request_judgment(records).await
        };

        counter!(
            "relevance_analysis_total",
            "model" => self.provider.model().to_string(),
            "outcome" => result.outcome()
        )
        .increment(1);

        result
    }

    async fn request_judgment(&self, records: &[ContractRecord]) -> AnalysisResult {
        let messages = [
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(user_prompt(records)),
        ];
        let params = ChatParams {
            temperature: Some(0.0),
            max_tokens: None,
        };

        match self.provider.complete(&messages, &params).await {
            Ok(response) => {
                tracing::info!(
                    model = %self.provider.model(),
                    record_count = records.len(),
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    finish_reason = ?response.finish_reason,
                    "Received relevance analysis"
                );
                parse_reply(response.content.as_deref())
            }
            Err(e) => {
                tracing::error!(
                    model = %self.provider.model(),
                    error = %e,
                    "Chat completion request failed"
                );
                AnalysisResult::CommunicationError(e.to_string())
            }
        }
    }
}

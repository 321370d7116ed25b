#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use secop_relay::config::{OpenAiSettings, RelayConfig, RelaySettings, SecopSettings};
use secop_relay::domain::DateResolver;
use secop_relay::models::ContractRecord;
use secop_relay::services::analyzer::DEFAULT_FIRM_NAME;
use secop_relay::services::providers::mock::MockChatProvider;
use secop_relay::services::{FetchError, QueryProfile, QuerySpec, RecordSource, RelevanceAnalyzer};
use secop_relay::startup::{build_router, AppState};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub enum StubBehavior {
    Records(Vec<ContractRecord>),
    Fail,
    Panic,
}

/// Record source that returns a canned outcome and remembers its queries.
pub struct StubSource {
    behavior: StubBehavior,
    calls: AtomicUsize,
    last_query: Mutex<Option<QuerySpec>>,
}

impl StubSource {
    pub fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        })
    }

    pub fn with_records(count: usize) -> Arc<Self> {
        Self::new(StubBehavior::Records(sample_records(count)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> QuerySpec {
        self.last_query
            .lock()
            .unwrap()
            .clone()
            .expect("no query was issued")
    }
}

#[async_trait]
impl RecordSource for StubSource {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<ContractRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());

        match &self.behavior {
            StubBehavior::Records(records) => Ok(records.clone()),
            StubBehavior::Fail => Err(FetchError::Upstream {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            StubBehavior::Panic => panic!("stub record source exploded"),
        }
    }
}

pub fn sample_records(count: usize) -> Vec<ContractRecord> {
    (0..count)
        .map(|i| {
            let value = json!({
                "id_del_proceso": format!("CO1.REQ.{}", 1000 + i),
                "entidad": "INSTITUTO NACIONAL DE VIAS",
                "nombre_del_procedimiento": format!("Estudios y diseños tramo {}", i),
                "precio_base": format!("{}", 250_000_000 + i * 1_000_000),
            });
            match value {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

pub fn resolver() -> DateResolver {
    DateResolver::new(-5).expect("valid offset")
}

pub fn test_app(source: Arc<StubSource>, provider: Arc<MockChatProvider>) -> Router {
    let state = AppState::new(
        resolver(),
        QueryProfile::default(),
        source,
        RelevanceAnalyzer::new(provider, DEFAULT_FIRM_NAME),
    );
    build_router(state)
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn test_config(secop_url: &str, openai_url: &str) -> RelayConfig {
    RelayConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
        },
        secop: SecopSettings {
            dataset_url: secop_url.to_string(),
            app_token: None,
            timeout_secs: 5,
            min_price: 100_000_000,
            excluded_modality: "Contratación directa".to_string(),
            category_code: "V1.8110".to_string(),
        },
        openai: OpenAiSettings {
            base_url: openai_url.to_string(),
            api_key: Secret::new("sk-test".to_string()),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
        },
        relay: RelaySettings {
            utc_offset_hours: -5,
            firm_name: DEFAULT_FIRM_NAME.to_string(),
        },
    }
}

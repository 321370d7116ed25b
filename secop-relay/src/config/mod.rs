use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Colombia does not observe daylight saving time.
const DEFAULT_UTC_OFFSET_HOURS: i32 = -5;
const DEFAULT_SECOP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub secop: SecopSettings,
    pub openai: OpenAiSettings,
    pub relay: RelaySettings,
}

#[derive(Debug, Clone)]
pub struct SecopSettings {
    /// Full dataset resource URL, e.g. `https://www.datos.gov.co/resource/p6dx-8zbt.json`.
    pub dataset_url: String,
    /// Socrata application token sent as `X-App-Token`.
    pub app_token: Option<Secret<String>>,
    pub timeout_secs: u64,
    /// Minimum `precio_base` (COP) a process must have.
    pub min_price: u64,
    /// `modalidad_de_contratacion` value that is filtered out.
    pub excluded_modality: String,
    /// Substring required in `codigo_principal_de_categoria`.
    pub category_code: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Offset used to decide what "today" is for the business-day rule.
    pub utc_offset_hours: i32,
    /// Firm the relevance prompt evaluates processes for.
    pub firm_name: String,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(RelayConfig {
            common: common_config,
            secop: SecopSettings {
                dataset_url: get_env("SECOP_API_URL", None)?,
                app_token: env::var("SECOP_APP_TOKEN")
                    .ok()
                    .filter(|token| !token.is_empty())
                    .map(Secret::new),
                timeout_secs: get_parsed_env("SECOP_TIMEOUT_SECS", DEFAULT_SECOP_TIMEOUT_SECS)?,
                min_price: get_parsed_env("SECOP_MIN_PRICE", crate::services::query::DEFAULT_MIN_PRICE)?,
                excluded_modality: get_env(
                    "SECOP_EXCLUDED_MODALITY",
                    Some(crate::services::query::DEFAULT_EXCLUDED_MODALITY),
                )?,
                category_code: get_env(
                    "SECOP_CATEGORY_CODE",
                    Some(crate::services::query::DEFAULT_CATEGORY_CODE),
                )?,
            },
            openai: OpenAiSettings {
                base_url: get_env("OPENAI_API_URL", Some("https://api.openai.com/v1"))?,
                api_key: Secret::new(get_env("OPENAI_API_KEY", None)?),
                model: get_env("OPENAI_MODEL", Some("gpt-4o-mini"))?,
                timeout_secs: get_parsed_env("OPENAI_TIMEOUT_SECS", DEFAULT_OPENAI_TIMEOUT_SECS)?,
            },
            relay: RelaySettings {
                utc_offset_hours: get_parsed_env("RELAY_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?,
                firm_name: get_env(
                    "RELAY_FIRM_NAME",
                    Some(crate::services::analyzer::DEFAULT_FIRM_NAME),
                )?,
            },
        })
    }
}

impl SecopSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OpenAiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

fn get_parsed_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => val.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, val, e))
        }),
        _ => Ok(default),
    }
}

//! Runtime configuration.
//!
//! Everything has a default except the service address. Values come from the
//! environment (`AnalyzerConfig::from_env`) and can be overridden with the
//! `with_*` builder methods. Unparsable numbers are ignored with a warning and
//! the default is kept.

use crate::models::ModelCatalog;
use crate::tokens::USD_TO_INR_RATE;
use crate::{Error, ErrorContext, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_API_URL: &str = "OPTIMIZER_API_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "OPTIMIZER_HTTP_TIMEOUT_SECS";
pub const ENV_DEBOUNCE_MS: &str = "OPTIMIZER_DEBOUNCE_MS";
pub const ENV_OUTPUT_TOKENS: &str = "OPTIMIZER_OUTPUT_TOKENS";
pub const ENV_EXCHANGE_RATE: &str = "OPTIMIZER_EXCHANGE_RATE";
pub const ENV_MODELS_PATH: &str = "OPTIMIZER_MODELS_PATH";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_OUTPUT_TOKENS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Base address of the optimizer service, e.g. `http://127.0.0.1:8000`.
    pub api_url: Option<String>,
    /// Overall HTTP timeout; `None` keeps the client default.
    pub http_timeout: Option<Duration>,
    /// Quiet period before typed text is analyzed.
    pub debounce: Duration,
    /// Initial "expected output tokens" used for cost estimates.
    pub output_tokens: u64,
    /// USD to secondary currency rate.
    pub exchange_rate: f64,
    /// Optional YAML model catalog replacing the built-in one.
    pub models_path: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            http_timeout: None,
            debounce: DEFAULT_DEBOUNCE,
            output_tokens: DEFAULT_OUTPUT_TOKENS,
            exchange_rate: USD_TO_INR_RATE,
            models_path: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        cfg.api_url = non_empty(ENV_API_URL);
        let timeout = parse_var::<u64>(ENV_HTTP_TIMEOUT_SECS, non_empty(ENV_HTTP_TIMEOUT_SECS));
        if let Some(secs) = timeout {
            if secs > 0 {
                cfg.http_timeout = Some(Duration::from_secs(secs));
            }
        }
        if let Some(ms) = parse_var::<u64>(ENV_DEBOUNCE_MS, non_empty(ENV_DEBOUNCE_MS)) {
            cfg.debounce = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<u64>(ENV_OUTPUT_TOKENS, non_empty(ENV_OUTPUT_TOKENS)) {
            cfg.output_tokens = n;
        }
        if let Some(rate) = parse_var::<f64>(ENV_EXCHANGE_RATE, non_empty(ENV_EXCHANGE_RATE)) {
            if rate.is_finite() && rate > 0.0 {
                cfg.exchange_rate = rate;
            } else {
                warn!(var = ENV_EXCHANGE_RATE, "ignoring non-positive exchange rate");
            }
        }
        cfg.models_path = non_empty(ENV_MODELS_PATH).map(PathBuf::from);
        cfg
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_output_tokens(mut self, n: u64) -> Self {
        self.output_tokens = n;
        self
    }

    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = rate;
        self
    }

    pub fn with_models_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.models_path = Some(path.into());
        self
    }

    /// The service address, or a configuration error when it is missing.
    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "analysis endpoint address is not configured",
                    ErrorContext::new()
                        .with_field_path(ENV_API_URL)
                        .with_source("config"),
                )
            })
    }

    /// Startup validation: the service address must be present and usable.
    pub fn validate(&self) -> Result<()> {
        let raw = self.api_url()?;
        let url = url::Url::parse(raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid analysis endpoint address: {}", e),
                ErrorContext::new()
                    .with_field_path(ENV_API_URL)
                    .with_source("config"),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported endpoint scheme '{}'", url.scheme()),
                ErrorContext::new()
                    .with_field_path(ENV_API_URL)
                    .with_source("config"),
            ));
        }
        if !(self.exchange_rate.is_finite() && self.exchange_rate > 0.0) {
            return Err(Error::configuration_with_context(
                "exchange rate must be a positive number",
                ErrorContext::new()
                    .with_field_path(ENV_EXCHANGE_RATE)
                    .with_source("config"),
            ));
        }
        Ok(())
    }

    /// The configured catalog file, or the built-in models.
    pub fn load_catalog(&self) -> Result<ModelCatalog> {
        match &self.models_path {
            Some(path) => ModelCatalog::from_yaml_file(path),
            None => Ok(ModelCatalog::builtin()),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = key, value = %raw, "ignoring unparsable value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = AnalyzerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, AnalyzerConfig::default());
        assert_eq!(cfg.debounce, Duration::from_millis(500));
        assert_eq!(cfg.output_tokens, 500);
        assert_eq!(cfg.exchange_rate, 88.21);
    }

    #[test]
    fn missing_address_is_a_configuration_error() {
        let cfg = AnalyzerConfig::from_lookup(lookup(&[(ENV_API_URL, "  ")]));
        assert!(matches!(cfg.validate(), Err(Error::Configuration { .. })));
    }

    #[test]
    fn env_values_are_read() {
        let cfg = AnalyzerConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://127.0.0.1:8000"),
            (ENV_HTTP_TIMEOUT_SECS, "15"),
            (ENV_DEBOUNCE_MS, "250"),
            (ENV_OUTPUT_TOKENS, "1000"),
            (ENV_EXCHANGE_RATE, "90.5"),
            (ENV_MODELS_PATH, "models.yaml"),
        ]));
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.api_url().unwrap(), "http://127.0.0.1:8000");
        assert_eq!(cfg.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(cfg.debounce, Duration::from_millis(250));
        assert_eq!(cfg.output_tokens, 1000);
        assert_eq!(cfg.exchange_rate, 90.5);
        assert_eq!(cfg.models_path, Some(PathBuf::from("models.yaml")));
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let cfg = AnalyzerConfig::from_lookup(lookup(&[
            (ENV_DEBOUNCE_MS, "soon"),
            (ENV_EXCHANGE_RATE, "-3"),
        ]));
        assert_eq!(cfg.debounce, DEFAULT_DEBOUNCE);
        assert_eq!(cfg.exchange_rate, USD_TO_INR_RATE);
    }

    #[test]
    fn builder_overrides() {
        let cfg = AnalyzerConfig::new()
            .with_api_url("ftp://nope")
            .with_debounce(Duration::from_millis(10));
        assert_eq!(cfg.debounce, Duration::from_millis(10));
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.load_catalog().unwrap().len(), 3);
    }
}

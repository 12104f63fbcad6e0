//! Configuration for the analyst service

use crate::error::{AnalystError, Result};
use analyst_llm::LLMProvider;
use analyst_llm::providers::ollama::{OllamaConfig, OllamaProvider};
use analyst_llm::providers::openai::{OpenAIConfig, OpenAIProvider};
use analyst_utils::{env_bool, env_or, env_parse, env_var};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default TWSE listed-company open data endpoint
pub const DEFAULT_TWSE_URL: &str = "https://openapi.twse.com.tw/v1/opendata/t187ap03_L";

/// Default TPEx OTC-company open data endpoint
pub const DEFAULT_TPEX_URL: &str = "https://www.tpex.org.tw/openapi/v1/mopsfin_t187ap03_O";

/// Reasoning backend used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LlmBackend {
    /// Native Ollama server (default)
    #[default]
    Ollama,
    /// Any OpenAI-compatible chat completions endpoint
    OpenAI,
}

impl FromStr for LlmBackend {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            other => Err(AnalystError::ConfigError(format!(
                "unknown LLM backend '{other}' (expected 'ollama' or 'openai')"
            ))),
        }
    }
}

/// Configuration for the analyst service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// Path of the persisted company directory
    pub companies_path: PathBuf,

    /// Calendar days of daily bars fetched per analysis
    pub lookback_days: u32,

    /// Reasoning backend
    pub llm_backend: LlmBackend,

    /// Model name passed to the backend
    pub model: String,

    /// Base URL of the backend; provider default when unset
    pub llm_base_url: Option<String>,

    /// API key for OpenAI-compatible backends
    pub llm_api_key: Option<String>,

    /// Maximum tokens per section
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Timeout for a single backend call
    pub llm_timeout: Duration,

    /// Timeout for exchange list and market data requests
    pub request_timeout: Duration,

    /// Ask the backend to resolve queries the directory cannot match
    pub llm_lookup: bool,

    /// Directory where successful results are written; disabled when unset
    pub report_dir: Option<PathBuf>,

    /// Listed-company source endpoint
    pub twse_url: String,

    /// OTC-company source endpoint
    pub tpex_url: String,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            companies_path: PathBuf::from("companies.json"),
            lookback_days: 30,
            llm_backend: LlmBackend::Ollama,
            model: "gpt-oss:20b".to_string(),
            llm_base_url: None,
            llm_api_key: None,
            max_tokens: 2048,
            temperature: 0.3,
            llm_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            llm_lookup: false,
            report_dir: None,
            twse_url: DEFAULT_TWSE_URL.to_string(),
            tpex_url: DEFAULT_TPEX_URL.to_string(),
        }
    }
}

impl AnalystConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalystConfigBuilder {
        AnalystConfigBuilder::default()
    }

    /// Load configuration from `ANALYST_*` environment variables
    ///
    /// Unset variables keep their defaults. `OLLAMA_BASE_URL` and
    /// `OPENAI_API_BASE` / `OPENAI_API_KEY` are honoured for the matching
    /// backend when the `ANALYST_LLM_*` equivalents are absent.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let llm_backend = match env_var("ANALYST_LLM_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.llm_backend,
        };

        let llm_base_url = env_var("ANALYST_LLM_BASE_URL").or_else(|| match llm_backend {
            LlmBackend::Ollama => env_var("OLLAMA_BASE_URL"),
            LlmBackend::OpenAI => env_var("OPENAI_API_BASE"),
        });

        let config = Self {
            companies_path: env_var("ANALYST_COMPANIES_PATH")
                .map_or(defaults.companies_path, PathBuf::from),
            lookback_days: env_parse("ANALYST_LOOKBACK_DAYS")?.unwrap_or(defaults.lookback_days),
            llm_backend,
            model: env_or("ANALYST_MODEL", &defaults.model),
            llm_base_url,
            llm_api_key: env_var("ANALYST_LLM_API_KEY").or_else(|| env_var("OPENAI_API_KEY")),
            max_tokens: env_parse("ANALYST_MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
            temperature: env_parse("ANALYST_TEMPERATURE")?.unwrap_or(defaults.temperature),
            llm_timeout: env_parse("ANALYST_LLM_TIMEOUT_SECS")?
                .map_or(defaults.llm_timeout, Duration::from_secs),
            request_timeout: env_parse("ANALYST_REQUEST_TIMEOUT_SECS")?
                .map_or(defaults.request_timeout, Duration::from_secs),
            llm_lookup: env_bool("ANALYST_LLM_LOOKUP")?.unwrap_or(defaults.llm_lookup),
            report_dir: env_var("ANALYST_REPORT_DIR").map(PathBuf::from),
            twse_url: env_or("ANALYST_TWSE_URL", DEFAULT_TWSE_URL),
            tpex_url: env_or("ANALYST_TPEX_URL", DEFAULT_TPEX_URL),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(AnalystError::ConfigError(
                "lookback_days must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(AnalystError::ConfigError("model must not be empty".to_string()));
        }

        if self.max_tokens == 0 {
            return Err(AnalystError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnalystError::ConfigError(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }

    /// Construct the configured reasoning backend
    pub fn build_llm_provider(&self) -> Result<Arc<dyn LLMProvider>> {
        let timeout_secs = self.llm_timeout.as_secs().max(1);

        let provider: Arc<dyn LLMProvider> = match self.llm_backend {
            LlmBackend::Ollama => {
                let config = match &self.llm_base_url {
                    Some(url) => OllamaConfig::new(url.as_str()),
                    None => OllamaConfig::default(),
                };
                Arc::new(OllamaProvider::with_config(config.with_timeout(timeout_secs))?)
            }
            LlmBackend::OpenAI => {
                let mut config = OpenAIConfig::new(self.llm_api_key.clone().unwrap_or_default());
                if let Some(url) = &self.llm_base_url {
                    config = config.with_api_base(url.as_str());
                }
                Arc::new(OpenAIProvider::with_config(config.with_timeout(timeout_secs))?)
            }
        };

        Ok(provider)
    }
}

/// Builder for AnalystConfig
#[derive(Debug, Default)]
pub struct AnalystConfigBuilder {
    companies_path: Option<PathBuf>,
    lookback_days: Option<u32>,
    llm_backend: Option<LlmBackend>,
    model: Option<String>,
    llm_base_url: Option<String>,
    llm_api_key: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    llm_timeout: Option<Duration>,
    llm_lookup: Option<bool>,
    report_dir: Option<PathBuf>,
}

impl AnalystConfigBuilder {
    /// Set the company directory path
    pub fn companies_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.companies_path = Some(path.into());
        self
    }

    /// Set the market data lookback window
    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the reasoning backend
    pub fn llm_backend(mut self, backend: LlmBackend) -> Self {
        self.llm_backend = Some(backend);
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the backend base URL
    pub fn llm_base_url(mut self, url: impl Into<String>) -> Self {
        self.llm_base_url = Some(url.into());
        self
    }

    /// Set the backend API key
    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    /// Set maximum tokens per section
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set backend call timeout
    pub fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    /// Enable or disable LLM-assisted company lookup
    pub fn llm_lookup(mut self, enabled: bool) -> Self {
        self.llm_lookup = Some(enabled);
        self
    }

    /// Write successful results into this directory
    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalystConfig> {
        let defaults = AnalystConfig::default();

        let config = AnalystConfig {
            companies_path: self.companies_path.unwrap_or(defaults.companies_path),
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            llm_backend: self.llm_backend.unwrap_or(defaults.llm_backend),
            model: self.model.unwrap_or(defaults.model),
            llm_base_url: self.llm_base_url,
            llm_api_key: self.llm_api_key,
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            request_timeout: defaults.request_timeout,
            llm_lookup: self.llm_lookup.unwrap_or(defaults.llm_lookup),
            report_dir: self.report_dir,
            twse_url: defaults.twse_url,
            tpex_url: defaults.tpex_url,
        };

        config.validate()?;
        Ok(config)
    }
}

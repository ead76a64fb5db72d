//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! API keys are never serialized and are redacted in debug output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{circuit_breaker as cb_constants, llm as llm_constants, monitor, network};
use crate::types::{Result, WardenError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Log source and output settings
    pub monitor: MonitorConfig,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Issue registry settings
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            monitor: MonitorConfig::default(),
            llm: LlmConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        let params = self.llm.params();
        if !(0.0..=2.0).contains(&params.temperature) {
            return Err(WardenError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                params.temperature
            )));
        }

        if params.max_tokens == 0 {
            return Err(WardenError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(WardenError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.circuit_breaker.failure_threshold == 0 {
            return Err(WardenError::Config(
                "LLM circuit_breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }

        if self.monitor.poll_interval_secs == 0 {
            return Err(WardenError::Config(
                "Monitor poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Monitor Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Log file to watch (LOG_FILE_PATH)
    pub log_file: PathBuf,

    /// JSON array of generated tickets (OUTPUT_FILE)
    pub output_file: PathBuf,

    /// Seconds between polls
    pub poll_interval_secs: u64,

    /// Read the existing file content on startup instead of only new lines
    pub from_start: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(monitor::DEFAULT_LOG_FILE),
            output_file: PathBuf::from(monitor::DEFAULT_OUTPUT_FILE),
            poll_interval_secs: monitor::DEFAULT_POLL_INTERVAL_SECS,
            from_start: true,
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Provider variant, selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LlmClass {
    #[default]
    #[serde(rename = "AzureOpenAI", alias = "azure", alias = "azure-openai")]
    AzureOpenAi,
    #[serde(rename = "OpenAI", alias = "openai")]
    OpenAi,
}

impl std::fmt::Display for LlmClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmClass::AzureOpenAi => write!(f, "AzureOpenAI"),
            LlmClass::OpenAi => write!(f, "OpenAI"),
        }
    }
}

impl std::str::FromStr for LlmClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azureopenai" | "azure" | "azure-openai" => Ok(LlmClass::AzureOpenAi),
            "openai" => Ok(LlmClass::OpenAi),
            _ => Err(format!(
                "Unsupported LLM class: {}. Valid values: AzureOpenAI, OpenAI",
                s
            )),
        }
    }
}

/// Effective sampling parameters for one provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Use the LLM backend at all (USE_LLM)
    pub enabled: bool,

    /// Provider variant (LLM_CLASS)
    pub class: LlmClass,

    /// Overrides the provider's temperature (LLM_TEMPERATURE)
    pub temperature: Option<f32>,

    /// Overrides the provider's max tokens (LLM_MAX_TOKENS)
    pub max_tokens: Option<u32>,

    /// Deadline for a single generation call
    pub timeout_secs: u64,

    pub azure: AzureOpenAiConfig,

    pub openai: OpenAiConfig,

    pub circuit_breaker: BreakerConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            class: LlmClass::default(),
            temperature: None,
            max_tokens: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            azure: AzureOpenAiConfig::default(),
            openai: OpenAiConfig::default(),
            circuit_breaker: BreakerConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Sampling parameters for the selected class, with overrides applied
    pub fn params(&self) -> GenerationParams {
        let (temperature, max_tokens) = match self.class {
            LlmClass::AzureOpenAi => (self.azure.temperature, self.azure.max_tokens),
            LlmClass::OpenAi => (self.openai.temperature, self.openai.max_tokens),
        };
        GenerationParams {
            temperature: self.temperature.unwrap_or(temperature),
            max_tokens: self.max_tokens.unwrap_or(max_tokens),
        }
    }

    /// Model name for the selected class
    pub fn model(&self) -> &str {
        match self.class {
            LlmClass::AzureOpenAi => &self.azure.model,
            LlmClass::OpenAi => &self.openai.model,
        }
    }
}

/// Azure OpenAI settings (AZURE_OPENAI_*)
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureOpenAiConfig {
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub model: String,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: None,
            model: llm_constants::DEFAULT_MODEL.to_string(),
            api_version: llm_constants::DEFAULT_AZURE_API_VERSION.to_string(),
            temperature: llm_constants::DEFAULT_TEMPERATURE,
            max_tokens: llm_constants::DEFAULT_MAX_TOKENS,
        }
    }
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("deployment", &self.deployment)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// OpenAI settings (OPENAI_*)
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: llm_constants::DEFAULT_OPENAI_API_BASE.to_string(),
            model: llm_constants::DEFAULT_MODEL.to_string(),
            temperature: llm_constants::DEFAULT_TEMPERATURE,
            max_tokens: llm_constants::DEFAULT_MAX_TOKENS,
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: cb_constants::FAILURE_THRESHOLD,
            recovery_secs: cb_constants::RECOVERY_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Record tickets in the SQLite issue registry
    pub enabled: bool,

    /// Registry database file (DB_PATH)
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(".logwarden/issues.db"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

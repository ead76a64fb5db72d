//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/logwarden/config.toml)
//! 3. Project config (.logwarden/config.toml) or an explicit `--config` file
//! 4. Flat environment variables (LOG_FILE_PATH, OPENAI_API_KEY, ...)
//! 5. Prefixed environment variables (LOGWARDEN_LLM__TIMEOUT_SECS -> llm.timeout_secs)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::types::Config;
use crate::types::{Result, WardenError};

/// Flat environment variables and the config keys they set
const ENV_MAPPING: &[(&str, &str)] = &[
    ("LOG_FILE_PATH", "monitor.log_file"),
    ("OUTPUT_FILE", "monitor.output_file"),
    ("USE_LLM", "llm.enabled"),
    ("LLM_CLASS", "llm.class"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_MAX_TOKENS", "llm.max_tokens"),
    ("LLM_TIMEOUT_SECS", "llm.timeout_secs"),
    ("AZURE_OPENAI_ENDPOINT", "llm.azure.endpoint"),
    ("AZURE_OPENAI_API_KEY", "llm.azure.api_key"),
    ("AZURE_OPENAI_DEPLOYMENT_NAME", "llm.azure.deployment"),
    ("AZURE_OPENAI_MODEL", "llm.azure.model"),
    ("AZURE_OPENAI_API_VERSION", "llm.azure.api_version"),
    ("AZURE_OPENAI_TEMPERATURE", "llm.azure.temperature"),
    ("AZURE_OPENAI_MAX_TOKENS", "llm.azure.max_tokens"),
    ("OPENAI_API_KEY", "llm.openai.api_key"),
    ("OPENAI_MODEL", "llm.openai.model"),
    ("OPENAI_API_BASE", "llm.openai.api_base"),
    ("OPENAI_TEMPERATURE", "llm.openai.temperature"),
    ("OPENAI_MAX_TOKENS", "llm.openai.max_tokens"),
    ("DB_PATH", "storage.path"),
];

/// Remote database settings that are recognized but not supported
const REMOTE_DB_VARS: &[&str] = &["DB_HOST", "DB_PORT", "DB_NAME", "DB_USER", "DB_PASSWORD"];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project (or `explicit`) → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(WardenError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                debug!("Loading config from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let project_path = Self::project_config_path();
                if project_path.exists() {
                    debug!("Loading project config from: {}", project_path.display());
                    figment = figment.merge(Toml::file(&project_path));
                }
            }
        }

        figment = figment
            .merge(Self::flat_env())
            .merge(Env::prefixed("LOGWARDEN_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| WardenError::Config(format!("Configuration error: {}", e)))?;

        Self::warn_remote_db();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| WardenError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn flat_env() -> Env {
        let keys: Vec<&str> = ENV_MAPPING.iter().map(|(var, _)| *var).collect();
        Env::raw().only(&keys).map(|key| {
            ENV_MAPPING
                .iter()
                .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
                .map(|(_, path)| (*path).into())
                .unwrap_or_else(|| key.as_str().to_string().into())
        })
    }

    fn warn_remote_db() {
        let set: Vec<&str> = REMOTE_DB_VARS
            .iter()
            .copied()
            .filter(|var| env::var_os(var).is_some())
            .collect();
        if !set.is_empty() {
            warn!(
                vars = %set.join(", "),
                "Remote database settings are not supported; using the local SQLite registry"
            );
        }
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/logwarden/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("logwarden"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".logwarden")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration; API keys are never included
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| WardenError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            WardenError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = Self::project_config_path();
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, Self::default_config())?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    /// Default config content (TOML); credentials belong in the environment
    fn default_config() -> String {
        r#"# logwarden configuration
# Credentials are read from the environment (AZURE_OPENAI_API_KEY, OPENAI_API_KEY).

version = "1.0"

[monitor]
log_file = "app.log"
output_file = "errors.json"
poll_interval_secs = 5
from_start = true

[llm]
enabled = true
class = "AzureOpenAI"
timeout_secs = 30

[llm.azure]
model = "gpt-4"
api_version = "2024-02-15-preview"
temperature = 0.1
max_tokens = 500

[llm.openai]
api_base = "https://api.openai.com/v1"
model = "gpt-4"
temperature = 0.1
max_tokens = 500

[llm.circuit_breaker]
failure_threshold = 5
recovery_secs = 60

[storage]
enabled = true
path = ".logwarden/issues.db"
"#
        .to_string()
    }
}

//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/logwarden/config.toml)
//! 3. Project config (.logwarden/config.toml) or `--config <file>`
//! 4. Environment variables (LOG_FILE_PATH, OPENAI_API_KEY, LOGWARDEN_*)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;

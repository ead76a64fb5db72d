//! CLI Common Utilities
//!
//! Shared configuration and storage access for command handlers.

use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, ConfigLoader};
use crate::storage::{Database, IssueStore};
use crate::types::{Result, WardenError};

/// Command execution context
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Merged configuration (defaults, files, environment)
    pub config: Config,
}

impl CommandContext {
    /// Load configuration, honoring an explicit `--config` file
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            config: ConfigLoader::load(config_path)?,
        })
    }

    /// Turn off LLM generation for this invocation
    pub fn disable_llm(&mut self, no_llm: bool) {
        if no_llm {
            self.config.llm.enabled = false;
        }
    }

    /// Open the issue registry, failing when storage is disabled
    pub fn issue_store(&self) -> Result<IssueStore> {
        if !self.config.storage.enabled {
            return Err(WardenError::Config(
                "Issue registry is disabled (storage.enabled = false)".to_string(),
            ));
        }
        open_issue_store(&self.config.storage.path)
    }
}

/// Open and initialize the registry database at `path`
pub fn open_issue_store(path: &Path) -> Result<IssueStore> {
    let db = Database::open(path)?;
    db.initialize()?;
    Ok(IssueStore::new(Arc::new(db)))
}

//! logwarden - Log Monitor with LLM Incident Tickets
//!
//! Tails a log file, detects error entries and turns each one into an
//! incident ticket `(title, description)`. Ticket content comes from an
//! OpenAI-compatible LLM provider; when the provider is disabled, misconfigured
//! or failing, a regex extractor produces the ticket locally.
//!
//! ## Quick Start
//!
//! ```ignore
//! use logwarden::{ConfigLoader, LogMonitor};
//!
//! let config = ConfigLoader::load(None)?;
//! let mut monitor = LogMonitor::from_config(&config)?;
//! let stats = monitor.run().await;
//! ```
//!
//! ## Modules
//!
//! - [`monitor`]: log reading, error block parsing, the polling loop
//! - [`ai`]: LLM providers, ticket generation, token usage
//! - [`extract`]: regex title extraction and classification
//! - [`output`]: the `errors.json` sink
//! - [`storage`]: SQLite issue registry with connection pooling
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod extract;
pub mod monitor;
pub mod output;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, LlmClass, LlmConfig};

// Error Types
pub use types::error::{ErrorCategory, Result, ResultExt, WardenError};

// Domain Types
pub use types::{ErrorLogEntry, GeneratedTicket, LogLevel, TicketContent, TicketSource};

// Storage
pub use storage::{Database, IssueStore, SharedDatabase};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use ai::{LlmAvailability, LlmProvider, SharedUsage, TicketGenerator, UsageTracker};
pub use monitor::{LogMonitor, MonitorStats};
pub use output::{ErrorRecord, JsonSink};

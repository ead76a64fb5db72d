//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// HTTP/Network constants
pub mod network {
    /// Default LLM request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;
}

/// Circuit breaker constants
pub mod circuit_breaker {
    /// Consecutive failures before opening the circuit
    pub const FAILURE_THRESHOLD: u32 = 5;

    /// Seconds to wait before letting a probe request through
    pub const RECOVERY_TIMEOUT_SECS: u64 = 60;

    /// Successful probes needed to close the circuit again
    pub const SUCCESS_THRESHOLD: u32 = 1;
}

/// LLM generation defaults
pub mod llm {
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    pub const DEFAULT_MAX_TOKENS: u32 = 500;

    pub const DEFAULT_MODEL: &str = "gpt-4";

    pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

    pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

    /// Per-call usage records kept in memory; totals are unbounded counters
    pub const USAGE_HISTORY_LIMIT: usize = 100;
}

/// Ticket shaping constants
pub mod ticket {
    /// Longest accepted title, for both backends
    pub const MAX_TITLE_CHARS: usize = 200;

    /// Shorter cleaned titles are replaced with the generic title
    pub const MIN_TITLE_CHARS: usize = 10;

    pub const GENERIC_TITLE: &str = "Error detected in logs";
}

/// Monitor loop constants
pub mod monitor {
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

    pub const DEFAULT_LOG_FILE: &str = "app.log";

    pub const DEFAULT_OUTPUT_FILE: &str = "errors.json";
}

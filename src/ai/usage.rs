//! Token Usage Tracking
//!
//! Running totals for the whole run plus the most recent per-call records.
//! Counters are atomics so the tracker can be shared by `Arc` without a lock
//! on the hot path. The record window is bounded and sits behind a `RwLock`.
//!
//! ## Usage
//!
//! ```ignore
//! let usage = create_shared_usage();
//! usage.record(TokenUsageRecord::from_response(&response, true, estimated_input));
//! println!("{}", usage.summary().display());
//! ```

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::ai::provider::{LlmResponse, TokenUsage};
use crate::constants::llm::USAGE_HISTORY_LIMIT;

/// One attempted provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenUsageRecord {
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub success: bool,
    /// Counts were estimated locally instead of reported by the provider
    pub estimated: bool,
    pub latency_ms: u64,
}

impl TokenUsageRecord {
    pub fn total(&self) -> u64 {
        self.input_tokens as u64 + self.output_tokens as u64
    }

    /// Record for a completed call; falls back to `estimated_input` when the
    /// provider did not report usage
    pub fn from_response(response: &LlmResponse, success: bool, estimated_input: u32) -> Self {
        let (usage, estimated) = match response.usage {
            Some(usage) => (usage, false),
            None => (
                TokenUsage {
                    input_tokens: estimated_input,
                    output_tokens: 0,
                },
                true,
            ),
        };
        Self {
            provider: response.metadata.provider.clone(),
            model: response.metadata.model.clone(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            success,
            estimated,
            latency_ms: response.timing.total_ms,
        }
    }

    /// Record for a call that failed before a response arrived
    pub fn failed(provider: &str, model: &str, estimated_input: u32, latency_ms: u64) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            input_tokens: estimated_input,
            output_tokens: 0,
            success: false,
            estimated: true,
            latency_ms,
        }
    }
}

/// Thread-safe usage aggregate
pub struct UsageTracker {
    start_time: Instant,
    calls: AtomicU64,
    failed_calls: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    estimated_calls: AtomicU64,
    total_latency_ms: AtomicU64,
    history_limit: usize,
    records: RwLock<VecDeque<TokenUsageRecord>>,
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::with_history_limit(USAGE_HISTORY_LIMIT)
    }

    /// Tracker keeping at most `history_limit` recent records
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            start_time: Instant::now(),
            calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            estimated_calls: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            history_limit,
            records: RwLock::new(VecDeque::with_capacity(history_limit.min(64))),
        }
    }

    pub fn record(&self, record: TokenUsageRecord) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !record.success {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }
        if record.estimated {
            self.estimated_calls.fetch_add(1, Ordering::Relaxed);
        }
        self.input_tokens
            .fetch_add(record.input_tokens as u64, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(record.output_tokens as u64, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(record.latency_ms, Ordering::Relaxed);

        tracing::debug!(
            provider = %record.provider,
            input_tokens = record.input_tokens,
            output_tokens = record.output_tokens,
            success = record.success,
            estimated = record.estimated,
            "Token usage recorded"
        );

        if self.history_limit == 0 {
            return;
        }
        let mut records = self.records.write().unwrap_or_else(|poisoned| {
            tracing::error!("Usage records RwLock poisoned, recovering");
            poisoned.into_inner()
        });
        if records.len() == self.history_limit {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Total tokens consumed so far
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.load(Ordering::Relaxed) + self.output_tokens.load(Ordering::Relaxed)
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Most recent records, oldest first
    pub fn records(&self) -> Vec<TokenUsageRecord> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> UsageSummary {
        let calls = self.calls.load(Ordering::Relaxed);
        let input_tokens = self.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.output_tokens.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        UsageSummary {
            elapsed_ms: self.start_time.elapsed().as_millis() as u64,
            calls,
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            estimated_calls: self.estimated_calls.load(Ordering::Relaxed),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            avg_latency_ms: if calls > 0 {
                total_latency as f64 / calls as f64
            } else {
                0.0
            },
        }
    }
}

/// Snapshot of the usage aggregate
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub elapsed_ms: u64,
    pub calls: u64,
    pub failed_calls: u64,
    pub estimated_calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
}

impl UsageSummary {
    pub fn display(&self) -> String {
        format!(
            "LLM Calls: {} ({} failed)\n\
             Tokens: {} (input: {}, output: {})\n\
             Estimated Records: {}\n\
             Avg Latency: {:.0}ms",
            self.calls,
            self.failed_calls,
            self.total_tokens,
            self.input_tokens,
            self.output_tokens,
            self.estimated_calls,
            self.avg_latency_ms
        )
    }
}

/// Shared usage tracker
pub type SharedUsage = Arc<UsageTracker>;

pub fn create_shared_usage() -> SharedUsage {
    Arc::new(UsageTracker::new())
}

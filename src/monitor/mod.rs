//! Log Monitor
//!
//! Polls a log file, groups error blocks into entries, turns each entry into
//! a ticket and hands it to the output sinks. Sink failures are logged and
//! counted; they never stop the loop.

pub mod parser;
pub mod reader;

pub use parser::{parse_lines, parse_lines_at, resolve_timestamp};
pub use reader::LogReader;

use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::ai::TicketGenerator;
use crate::config::Config;
use crate::output::{ErrorRecord, JsonSink};
use crate::storage::{Database, IssueStore, RecordOutcome};
use crate::types::{ErrorLogEntry, GeneratedTicket, Result, TicketSource};

/// Counters for one monitoring session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub lines_processed: u64,
    pub errors_found: u64,
    pub llm_tickets: u64,
    pub regex_tickets: u64,
    pub sink_failures: u64,
    pub read_failures: u64,
}

impl MonitorStats {
    pub fn display(&self) -> String {
        format!(
            "Lines: {} | Errors: {} | LLM tickets: {} | Regex tickets: {} | Sink failures: {}",
            self.lines_processed,
            self.errors_found,
            self.llm_tickets,
            self.regex_tickets,
            self.sink_failures
        )
    }
}

pub struct LogMonitor {
    reader: LogReader,
    source: String,
    generator: TicketGenerator,
    json_sink: Option<JsonSink>,
    issues: Option<IssueStore>,
    poll_interval: Duration,
    stats: MonitorStats,
}

impl LogMonitor {
    pub fn new<P: AsRef<Path>>(log_file: P, generator: TicketGenerator) -> Self {
        let log_file = log_file.as_ref();
        Self {
            reader: LogReader::new(log_file),
            source: log_file.display().to_string(),
            generator,
            json_sink: None,
            issues: None,
            poll_interval: Duration::from_secs(crate::constants::monitor::DEFAULT_POLL_INTERVAL_SECS),
            stats: MonitorStats::default(),
        }
    }

    /// Wire a monitor from configuration: generator, `errors.json` sink and,
    /// when enabled, the issue registry
    pub fn from_config(config: &Config) -> Result<Self> {
        let generator = TicketGenerator::from_config(&config.llm);
        info!(backend = %generator.availability().describe(), "Ticket generator initialized");

        let mut monitor = Self::new(&config.monitor.log_file, generator)
            .with_json_sink(JsonSink::open(&config.monitor.output_file)?)
            .with_poll_interval(Duration::from_secs(config.monitor.poll_interval_secs));

        if !config.monitor.from_start {
            monitor = monitor.from_end();
        }

        if config.storage.enabled {
            let db = Database::open(&config.storage.path)?;
            db.initialize()?;
            monitor = monitor.with_issue_store(IssueStore::new(Arc::new(db)));
        }

        Ok(monitor)
    }

    pub fn with_json_sink(mut self, sink: JsonSink) -> Self {
        self.json_sink = Some(sink);
        self
    }

    pub fn with_issue_store(mut self, store: IssueStore) -> Self {
        self.issues = Some(store);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Skip content already in the file
    pub fn from_end(mut self) -> Self {
        self.reader = LogReader::at_end(self.reader.path());
        self
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn generator(&self) -> &TicketGenerator {
        &self.generator
    }

    /// Poll until Ctrl-C
    pub async fn run(&mut self) -> MonitorStats {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Poll every interval until `shutdown` completes
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> MonitorStats {
        info!(
            path = %self.source,
            interval_secs = self.poll_interval.as_secs_f64(),
            backend = %self.generator.availability().describe(),
            "Starting log monitoring"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Monitoring stopped gracefully");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll().await;
                }
            }
        }

        self.flush_partial().await;
        self.log_summary();
        self.stats.clone()
    }

    /// Single pass over everything currently readable, including a final
    /// line without a trailing newline
    pub async fn run_once(&mut self) -> MonitorStats {
        self.poll().await;
        self.flush_partial().await;
        self.log_summary();
        self.stats.clone()
    }

    /// Read new lines and process them; returns the tickets produced
    pub async fn poll(&mut self) -> Vec<GeneratedTicket> {
        match self.reader.read_new_lines() {
            Ok(lines) => self.process_lines(&lines).await,
            Err(e) => {
                self.stats.read_failures += 1;
                warn!(path = %self.source, "Failed to read log file: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn process_lines(&mut self, lines: &[String]) -> Vec<GeneratedTicket> {
        if lines.is_empty() {
            return Vec::new();
        }
        self.stats.lines_processed += lines.len() as u64;

        let entries = parse_lines(lines, &self.source);
        debug!(lines = lines.len(), errors = entries.len(), "Processed log chunk");

        let mut tickets = Vec::with_capacity(entries.len());
        for entry in entries {
            tickets.push(self.handle_entry(&entry).await);
        }
        tickets
    }

    async fn flush_partial(&mut self) {
        if let Some(line) = self.reader.finish() {
            self.process_lines(&[line]).await;
        }
    }

    async fn handle_entry(&mut self, entry: &ErrorLogEntry) -> GeneratedTicket {
        self.stats.errors_found += 1;
        let ticket = self.generator.generate(entry).await;

        match ticket.source {
            TicketSource::Llm => self.stats.llm_tickets += 1,
            TicketSource::Regex => self.stats.regex_tickets += 1,
        }

        info!(
            level = %entry.level,
            timestamp = %entry.timestamp_iso(),
            generated_by = %ticket.source,
            title = %ticket.content.title,
            "Error ticket generated"
        );

        if let Some(sink) = &self.json_sink
            && let Err(e) = sink.append(&ErrorRecord::new(entry, &ticket))
        {
            self.stats.sink_failures += 1;
            error!(path = %sink.path().display(), "Failed to write error record: {}", e);
        }

        if let Some(store) = &self.issues {
            match store.record(&ticket, entry) {
                Ok(RecordOutcome::Created { id }) => info!(id = %id, "Created new issue"),
                Ok(RecordOutcome::Updated { id, occurrence }) => {
                    info!(id = %id, occurrence, "Updated existing issue")
                }
                Err(e) => {
                    self.stats.sink_failures += 1;
                    error!("Failed to record issue: {}", e);
                }
            }
        }

        ticket
    }

    fn log_summary(&self) {
        let s = &self.stats;
        info!(
            lines_processed = s.lines_processed,
            errors_found = s.errors_found,
            llm_tickets = s.llm_tickets,
            regex_tickets = s.regex_tickets,
            sink_failures = s.sink_failures,
            read_failures = s.read_failures,
            "Monitoring statistics"
        );

        let usage = self.generator.usage().summary();
        if usage.calls > 0 {
            info!(
                calls = usage.calls,
                failed_calls = usage.failed_calls,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WardenError;
    use std::io::Write;
    use tempfile::TempDir;

    const LOG: &str = "\
2024-01-01 09:59:59 INFO service started
2024-01-01 10:00:00 ERROR Database connection timeout after 30s
    at db.pool.acquire(pool.rs:42)
2024-01-01 10:00:05 WARN slow request
2024-01-01 10:00:09 ERROR Database connection timeout after 30s
2024-01-01 10:01:00 CRITICAL Disk quota exceeded on /data
";

    fn append(path: &Path, text: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    fn store() -> IssueStore {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        IssueStore::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_run_once_writes_all_sinks() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        let out = dir.path().join("errors.json");
        append(&log, LOG);

        let mut monitor = LogMonitor::new(&log, TicketGenerator::regex_only())
            .with_json_sink(JsonSink::open(&out).unwrap())
            .with_issue_store(store());

        let stats = monitor.run_once().await;
        assert_eq!(stats.lines_processed, 6);
        assert_eq!(stats.errors_found, 3);
        assert_eq!(stats.regex_tickets, 3);
        assert_eq!(stats.llm_tickets, 0);
        assert_eq!(stats.sink_failures, 0);

        let records = JsonSink::open(&out).unwrap().read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].error_context.contains("pool.rs:42"));
        assert_eq!(records[2].title, "Disk quota exceeded on /data");

        let issues = monitor.issues.as_ref().unwrap().list(None).unwrap();
        assert_eq!(issues.len(), 2);
        let timeout = issues
            .iter()
            .find(|i| i.fingerprint == "Database connection timeout after 30s")
            .unwrap();
        assert_eq!(timeout.occurrence, 2);
    }

    #[tokio::test]
    async fn test_poll_only_processes_new_lines() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        append(&log, "2024-01-01 ERROR first failure in worker\n");

        let mut monitor = LogMonitor::new(&log, TicketGenerator::regex_only());
        assert_eq!(monitor.poll().await.len(), 1);
        assert!(monitor.poll().await.is_empty());

        append(&log, "2024-01-01 FATAL second failure in worker\n");
        let tickets = monitor.poll().await;
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].content.title, "second failure in worker");
        assert_eq!(monitor.stats().errors_found, 2);
    }

    #[tokio::test]
    async fn test_from_end_skips_existing_content() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        append(&log, LOG);

        let mut monitor = LogMonitor::new(&log, TicketGenerator::regex_only()).from_end();
        assert!(monitor.poll().await.is_empty());
        assert_eq!(monitor.stats().lines_processed, 0);
    }

    #[tokio::test]
    async fn test_sink_failure_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        let out = dir.path().join("errors.json");
        append(&log, LOG);

        let sink = JsonSink::open(&out).unwrap();
        std::fs::write(&out, "{}").unwrap();

        let mut monitor = LogMonitor::new(&log, TicketGenerator::regex_only()).with_json_sink(sink);
        let stats = monitor.run_once().await;
        assert_eq!(stats.errors_found, 3);
        assert_eq!(stats.sink_failures, 3);
    }

    #[tokio::test]
    async fn test_missing_log_file_is_quiet() {
        let dir = TempDir::new().unwrap();
        let mut monitor =
            LogMonitor::new(dir.path().join("absent.log"), TicketGenerator::regex_only());
        let stats = monitor.run_once().await;
        assert_eq!(stats, MonitorStats::default());
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline_is_flushed() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        append(&log, "2024-01-01 ERROR Connection refused by upstream");

        let mut monitor = LogMonitor::new(&log, TicketGenerator::regex_only());
        let stats = monitor.run_once().await;
        assert_eq!(stats.errors_found, 1);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        append(&log, LOG);

        let mut monitor = LogMonitor::new(&log, TicketGenerator::regex_only())
            .with_poll_interval(Duration::from_secs(3600));
        let stats = monitor
            .run_until(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(stats.errors_found, 3);
    }

    #[test]
    fn test_from_config_rejects_unwritable_output() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let mut config = Config::default();
        config.llm.enabled = false;
        config.storage.enabled = false;
        config.monitor.output_file = blocker.join("errors.json");

        assert!(matches!(
            LogMonitor::from_config(&config),
            Err(WardenError::Io(_))
        ));
    }
}

//! Monitor Command
//!
//! Tail the configured log file and generate tickets for new errors.
//!
//! Usage:
//!   logwarden monitor [--log-file PATH] [--output PATH] [--interval SECS] [--no-llm] [--once]

use std::path::PathBuf;

use crate::cli::{CommandContext, Output};
use crate::monitor::LogMonitor;
use crate::types::Result;

#[derive(Debug, Default, Clone)]
pub struct MonitorOptions {
    pub log_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub interval: Option<u64>,
    pub no_llm: bool,
    pub once: bool,
}

pub async fn run(mut ctx: CommandContext, options: MonitorOptions) -> Result<()> {
    let out = Output::new();
    ctx.disable_llm(options.no_llm);

    let monitor_config = &mut ctx.config.monitor;
    if let Some(log_file) = options.log_file {
        monitor_config.log_file = log_file;
    }
    if let Some(output) = options.output {
        monitor_config.output_file = output;
    }
    if let Some(interval) = options.interval {
        monitor_config.poll_interval_secs = interval.max(1);
    }

    if !ctx.config.monitor.log_file.exists() {
        out.warning(&format!(
            "{} does not exist yet; waiting for it to appear",
            ctx.config.monitor.log_file.display()
        ));
    }

    let mut monitor = LogMonitor::from_config(&ctx.config)?;
    out.info(&format!(
        "Monitoring {} (tickets via {})",
        ctx.config.monitor.log_file.display(),
        monitor.generator().availability().describe()
    ));

    let stats = if options.once {
        monitor.run_once().await
    } else {
        out.info("Press Ctrl-C to stop");
        monitor.run().await
    };

    out.stats(&stats);
    out.usage(&monitor.generator().usage().summary());
    out.success(&format!(
        "Tickets written to {}",
        ctx.config.monitor.output_file.display()
    ));
    Ok(())
}

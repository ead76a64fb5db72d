//! Scan Command
//!
//! One pass over an existing log file from the beginning.
//!
//! Usage:
//!   logwarden scan <FILE> [--output PATH] [--no-llm]

use std::path::PathBuf;

use crate::cli::{CommandContext, Output};
use crate::monitor::LogMonitor;
use crate::types::{Result, WardenError};

pub async fn run(
    mut ctx: CommandContext,
    file: PathBuf,
    output: Option<PathBuf>,
    no_llm: bool,
) -> Result<()> {
    let out = Output::new();

    if !file.is_file() {
        return Err(WardenError::Config(format!(
            "Log file not found: {}",
            file.display()
        )));
    }

    ctx.disable_llm(no_llm);
    ctx.config.monitor.log_file = file;
    ctx.config.monitor.from_start = true;
    if let Some(output) = output {
        ctx.config.monitor.output_file = output;
    }

    let mut monitor = LogMonitor::from_config(&ctx.config)?;
    let stats = monitor.run_once().await;

    out.stats(&stats);
    out.usage(&monitor.generator().usage().summary());
    if stats.errors_found == 0 {
        out.info("No errors found");
    } else {
        out.success(&format!(
            "{} ticket(s) written to {}",
            stats.errors_found,
            ctx.config.monitor.output_file.display()
        ));
    }
    Ok(())
}

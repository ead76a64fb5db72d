use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logwarden::cli::CommandContext;
use logwarden::cli::commands;
use logwarden::storage::IssueStatus;

#[derive(Parser)]
#[command(name = "logwarden")]
#[command(
    version,
    about = "Turn error log entries into incident tickets with an LLM or regex fallback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of .logwarden/config.toml
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a log file and generate tickets for new errors
    Monitor {
        #[arg(long, help = "Log file to watch (overrides LOG_FILE_PATH)")]
        log_file: Option<PathBuf>,
        #[arg(long, short, help = "Output JSON file (overrides OUTPUT_FILE)")]
        output: Option<PathBuf>,
        #[arg(long, short, help = "Poll interval in seconds")]
        interval: Option<u64>,
        #[arg(long, help = "Use regex extraction only")]
        no_llm: bool,
        #[arg(long, help = "Process current content once and exit")]
        once: bool,
    },

    /// Process an existing log file once from the beginning
    Scan {
        #[arg(help = "Log file to scan")]
        file: PathBuf,
        #[arg(long, short, help = "Output JSON file (overrides OUTPUT_FILE)")]
        output: Option<PathBuf>,
        #[arg(long, help = "Use regex extraction only")]
        no_llm: bool,
    },

    /// Generate a ticket for a single log line
    Generate {
        #[arg(help = "Log line")]
        line: String,
        #[arg(long, help = "Use regex extraction only")]
        no_llm: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Inspect the issue registry
    Issues {
        #[command(subcommand)]
        action: IssuesAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum IssuesAction {
    /// List recorded issues
    List {
        #[arg(long, short, help = "Only issues with this status")]
        status: Option<IssueStatus>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show one issue with its logs
    Show {
        #[arg(help = "Issue id or unique prefix")]
        id: String,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Mark an issue resolved
    Resolve {
        #[arg(help = "Issue id or unique prefix")]
        id: String,
    },
    /// Set an issue's status
    Status {
        #[arg(help = "Issue id or unique prefix")]
        id: String,
        #[arg(help = "open, in_progress, resolved, closed")]
        status: IssueStatus,
    },
    /// Delete an issue and its logs
    Delete {
        #[arg(help = "Issue id or unique prefix")]
        id: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mlogwarden encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    // A missing .env is not an error
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Monitor {
            log_file,
            output,
            interval,
            no_llm,
            once,
        } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::monitor::run(
                ctx,
                commands::monitor::MonitorOptions {
                    log_file,
                    output,
                    interval,
                    no_llm,
                    once,
                },
            ))?;
        }
        Commands::Scan {
            file,
            output,
            no_llm,
        } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::scan::run(ctx, file, output, no_llm))?;
        }
        Commands::Generate {
            line,
            no_llm,
            format,
        } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(ctx, &line, no_llm, &format))?;
        }
        Commands::Issues { action } => {
            let ctx = CommandContext::load(config_path)?;
            match action {
                IssuesAction::List { status, format } => {
                    commands::issues::list(&ctx, status, &format)?;
                }
                IssuesAction::Show { id, format } => {
                    commands::issues::show(&ctx, &id, &format)?;
                }
                IssuesAction::Resolve { id } => {
                    commands::issues::resolve(&ctx, &id)?;
                }
                IssuesAction::Status { id, status } => {
                    commands::issues::set_status(&ctx, &id, status)?;
                }
                IssuesAction::Delete { id } => {
                    commands::issues::delete(&ctx, &id)?;
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(config_path, global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}

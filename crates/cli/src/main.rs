mod config;
mod reconcile;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Fleet maintenance reminder tooling.
#[derive(Parser)]
#[command(
    name = "fleetlog",
    version,
    about = "Fleet maintenance reminder tooling"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute the due / not due status of every reminder
    Reconcile {
        /// Path to the JSON reminder store
        #[arg(long)]
        data: Option<PathBuf>,
        /// Reference time (RFC 3339); defaults to the current time
        #[arg(long, value_parser = parse_rfc3339)]
        at: Option<OffsetDateTime>,
        /// Maximum number of status writes in flight
        #[arg(long)]
        concurrency: Option<usize>,
        /// Only read reminders whose status is out of date
        #[arg(long)]
        prefilter: bool,
    },

    /// Start the reminder HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Path to the JSON reminder store
        #[arg(long)]
        data: Option<PathBuf>,
        /// Run a reconciliation pass every N seconds
        #[arg(long)]
        reconcile_interval: Option<u64>,
    },
}

fn parse_rfc3339(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|e| format!("invalid RFC 3339 timestamp: {e}"))
}

/// Install the global tracing subscriber. `FLEETLOG_LOG` wins over
/// `RUST_LOG`; without either, `info` and above is logged to stderr.
fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = std::env::var("FLEETLOG_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                cli.output,
                cli.quiet,
            );
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Reconcile {
            data,
            at,
            concurrency,
            prefilter,
        } => {
            if let Some(data) = data {
                config.data = data;
            }
            if let Some(concurrency) = concurrency {
                config.reconcile.concurrency = concurrency;
            }
            if prefilter {
                config.reconcile.prefilter = true;
            }
            let code = rt.block_on(reconcile::cmd_reconcile(&config, at, cli.output, cli.quiet));
            process::exit(code);
        }
        Commands::Serve {
            port,
            data,
            reconcile_interval,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data) = data {
                config.data = data;
            }
            if reconcile_interval.is_some() {
                config.reconcile_interval_secs = reconcile_interval;
            }
            if let Err(e) = rt.block_on(serve::start_server(config)) {
                report_error(&format!("Server error: {}", e), cli.output, cli.quiet);
                process::exit(1);
            }
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

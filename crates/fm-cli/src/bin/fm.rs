//! FerroMap CLI Binary
//!
//! # Usage
//!
//! ```bash
//! # Resolve every mapper in a file and report diagnostics
//! fm check car_mapper.toml
//!
//! # Show the ordered dispatch arms of an entry point
//! fm dispatch car_mapper.toml --entry Map
//!
//! # Run an entry point against a JSON object
//! fm map car_mapper.toml --entry MapCarToDto --input car.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use fm_cli::{
    cli::CliConfig,
    commands::{self, check::CheckArgs, dispatch::DispatchArgs, map::MapArgs},
    diagnostics::setup_error_reporting,
    Result,
};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "fm",
    version = env!("CARGO_PKG_VERSION"),
    about = "FerroMap: declarative object-to-object mapping with runtime type dispatch",
    long_about = r#"
FerroMap resolves mapper files (a type model plus mapping declarations) into
mapping plans and ordered dispatch tables, and can run them against JSON input.

EXAMPLES:
    fm check car_mapper.toml                                # Validate a mapper file
    fm dispatch car_mapper.toml --entry Map                 # Show dispatch arms
    fm map car_mapper.toml --entry Map --input car.json     # Map a JSON object
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a mapper file and report diagnostics
    Check(CheckArgs),

    /// Print the ordered dispatch arms of entry points
    Dispatch(DispatchArgs),

    /// Run an entry point against a JSON object
    Map(MapArgs),
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    /// `--log` wins over `--quiet`, which wins over `-v`; with none of them
    /// `RUST_LOG` is honored and warnings are shown.
    fn log_filter(&self) -> EnvFilter {
        let directive = match (self.log, self.quiet, self.verbose) {
            (Some(level), _, _) => level.directive(),
            (None, true, _) => "error",
            (None, false, 0) => {
                return EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
            }
            (None, false, 1) => "info",
            (None, false, 2) => "debug",
            (None, false, _) => "trace",
        };
        EnvFilter::new(directive)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_error_reporting()?;
    setup_logging(cli.log_filter(), cli.log_format);

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }

    let config = CliConfig::load(cli.config.as_deref())?;
    console::set_colors_enabled(config.output.color);

    let result = match cli.command {
        Commands::Check(args) => commands::check_command(args, &config).map(|_| ()),
        Commands::Dispatch(args) => commands::dispatch_command(args, &config),
        Commands::Map(args) => commands::map_command(args, &config),
    };

    if let Err(e) = result {
        if !fm_cli::diagnostics::render_cli_error(&e) {
            error!("{}", e);
        }
        debug!(?e, "command failed");
        std::process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr; stdout carries command output such as mapped JSON.
fn setup_logging(filter: EnvFilter, format: LogFormat) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(layer).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}

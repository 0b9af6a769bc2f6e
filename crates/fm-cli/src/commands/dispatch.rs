//! Prints the dispatch tables of polymorphic and runtime-target entry points.

use crate::commands::common::resolve_file;
use crate::{cli::CliConfig, CliError, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

/// Arguments for the dispatch command
#[derive(Debug, Clone, Args)]
pub struct DispatchArgs {
    /// Mapper file (TOML or JSON)
    pub file: PathBuf,
    /// Mapper to inspect when the file declares several
    #[arg(long)]
    pub mapper: Option<String>,
    /// Only print this entry point
    #[arg(long)]
    pub entry: Option<String>,
}

/// Renders the requested dispatch tables, one block per entry point.
pub fn render_dispatches(args: &DispatchArgs, config: &CliConfig) -> Result<Vec<String>> {
    let outcome = resolve_file(&args.file, config)?.select(args.mapper.as_deref())?;
    match &args.entry {
        Some(entry) => {
            let dispatch = outcome.dispatch(entry).ok_or_else(|| {
                CliError::InvalidInput(format!(
                    "`{}` is not a polymorphic or runtime-target entry point of `{}`",
                    entry, outcome.name
                ))
            })?;
            Ok(vec![dispatch.to_string()])
        }
        None => Ok(outcome
            .dispatches()
            .into_iter()
            .map(|dispatch| dispatch.to_string())
            .collect()),
    }
}

/// Execute the dispatch command
pub fn dispatch_command(args: DispatchArgs, config: &CliConfig) -> Result<()> {
    let blocks = render_dispatches(&args, config)?;
    if blocks.is_empty() {
        println!("{} no dispatching entry points", style("ℹ").blue());
    }
    for block in blocks {
        println!("{}\n", block);
    }
    Ok(())
}

//! Runs one entry point against a JSON document.

use crate::commands::common::resolve_file;
use crate::{cli::CliConfig, CliError, Result};
use clap::Args;
use fm_core::{TypeLookup, Value};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the map command
#[derive(Debug, Clone, Args)]
pub struct MapArgs {
    /// Mapper file (TOML or JSON)
    pub file: PathBuf,
    /// Mapper to run when the file declares several
    #[arg(long)]
    pub mapper: Option<String>,
    /// Mapping to call
    #[arg(long)]
    pub entry: String,
    /// JSON document holding the source object
    #[arg(long)]
    pub input: PathBuf,
    /// Requested target type; defaults to the entry point's declared target
    #[arg(long)]
    pub target: Option<String>,
}

/// Maps the input document and returns the result as JSON.
pub fn map_json(args: &MapArgs, config: &CliConfig) -> Result<JsonValue> {
    let outcome = resolve_file(&args.file, config)?.select(args.mapper.as_deref())?;
    if let Some(failure) = outcome.failure(&args.entry) {
        return Err(CliError::Mapping(failure.clone()));
    }
    let runtime = outcome.into_runtime();
    let catalog = runtime.catalog().clone();
    let entry = runtime.entry_point(&args.entry)?;

    let input = std::fs::read_to_string(&args.input)?;
    let json: JsonValue = serde_json::from_str(&input).map_err(|e| {
        CliError::InvalidInput(format!("Failed to parse {}: {}", args.input.display(), e))
    })?;
    let source = Value::from_json(&json, &catalog, Some(entry.descriptor().source))?;

    let requested = match &args.target {
        Some(name) => catalog.require(name)?,
        None => entry.descriptor().target.id,
    };
    info!(
        "mapping {} with `{}` to {}",
        source.type_name(&catalog),
        entry.name(),
        catalog.name(requested)
    );

    let mapped = entry.call(Some(&source), requested)?;
    Ok(mapped
        .map(|value| value.to_json(&catalog))
        .unwrap_or(JsonValue::Null))
}

/// Execute the map command
pub fn map_command(args: MapArgs, config: &CliConfig) -> Result<()> {
    let mapped = map_json(&args, config)?;
    let rendered = serde_json::to_string_pretty(&mapped)
        .map_err(|e| CliError::InvalidInput(format!("Failed to render result: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

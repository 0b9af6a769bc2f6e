//! Mapper validation command implementation

use crate::commands::common::resolve_file;
use crate::diagnostics::print_diagnostics;
use crate::{cli::CliConfig, CliError, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

/// Arguments for the check command
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Mapper file (TOML or JSON)
    pub file: PathBuf,
    /// Treat warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Totals over every mapper in a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub mappers: usize,
    pub mappings: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl CheckSummary {
    pub fn passed(&self, deny_warnings: bool) -> bool {
        self.failed == 0 && self.errors == 0 && !(deny_warnings && self.warnings > 0)
    }
}

/// Execute the check command
pub fn check_command(args: CheckArgs, config: &CliConfig) -> Result<CheckSummary> {
    let resolved = resolve_file(&args.file, config)?;
    let mut summary = CheckSummary::default();

    for (name, outcome) in &resolved.outcomes {
        let diagnostics = outcome.all_diagnostics();
        summary.mappers += 1;
        summary.mappings += outcome.registry.len();
        summary.failed += outcome.failures.len();
        summary.errors += diagnostics.iter().filter(|d| d.is_error()).count();
        summary.warnings += diagnostics
            .iter()
            .filter(|d| d.level == fm_core::diagnostics::DiagnosticLevel::Warning)
            .count();

        let marker = if outcome.has_errors() {
            style("✗").red()
        } else {
            style("✓").green()
        };
        println!(
            "{} {} ({} mappings)",
            marker,
            style(name).bold(),
            outcome.registry.len()
        );
        print_diagnostics(&diagnostics, &config.output);
    }

    println!(
        "{} mapper(s), {} mapping(s), {} error(s), {} warning(s)",
        summary.mappers, summary.mappings, summary.errors, summary.warnings
    );

    if summary.passed(args.deny_warnings) {
        Ok(summary)
    } else {
        Err(CliError::Resolution(format!(
            "{} failed with {} error(s) and {} warning(s)",
            args.file.display(),
            summary.errors,
            summary.warnings
        )))
    }
}

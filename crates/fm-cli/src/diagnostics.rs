//! Diagnostic and error reporting utilities

use crate::cli::OutputConfig;
use crate::{CliError, Result};
use console::style;
use fm_core::diagnostics::{Diagnostic, DiagnosticLevel};

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Renders a command failure through miette. Returns `false` for errors
/// that carry nothing beyond their message.
pub fn render_cli_error(error: &CliError) -> bool {
    match error {
        CliError::Mapping(inner) => {
            eprintln!("{:?}", miette::Report::new(inner.clone()));
            true
        }
        CliError::Resolution(_) | CliError::Config(_) | CliError::InvalidInput(_) => {
            eprintln!("{}", style(error).red());
            true
        }
        CliError::Io(_) => false,
    }
}

/// Whether `diagnostic` is printed under `output`.
pub fn is_visible(diagnostic: &Diagnostic, output: &OutputConfig) -> bool {
    diagnostic.level != DiagnosticLevel::Info || output.show_info
}

/// One diagnostic line, colored by level.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let rendered = diagnostic.render_plain();
    match diagnostic.level {
        DiagnosticLevel::Error => style(rendered).red().to_string(),
        DiagnosticLevel::Warning => style(rendered).yellow().to_string(),
        DiagnosticLevel::Info => style(rendered).dim().to_string(),
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic], output: &OutputConfig) {
    for diagnostic in diagnostics.iter().filter(|d| is_visible(d, output)) {
        println!("  {}", format_diagnostic(diagnostic));
    }
}

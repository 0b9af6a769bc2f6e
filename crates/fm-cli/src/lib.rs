//! FerroMap CLI Library
//!
//! Command-line front end for resolving mapper files, inspecting the
//! generated dispatch tables and running mappings against JSON input.

pub mod cli;
pub mod commands;
pub mod diagnostics;

pub use fm_core;
pub use fm_mapper;

// CLI-specific error handling
pub mod error {
    use miette::Diagnostic;
    use thiserror::Error;

    #[derive(Error, Debug, Diagnostic)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        #[diagnostic(code(ferromap::cli::config))]
        Config(String),

        #[error("Invalid input: {0}")]
        #[diagnostic(code(ferromap::cli::invalid_input))]
        InvalidInput(String),

        #[error(transparent)]
        #[diagnostic(transparent)]
        Mapping(#[from] fm_core::Error),

        #[error("Resolution failed: {0}")]
        #[diagnostic(
            code(ferromap::cli::resolution),
            help("run `fm check` on the mapper file for the full list of diagnostics")
        )]
        Resolution(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};

//! Helpers shared by the commands that read mapper files.

use crate::cli::CliConfig;
use crate::{CliError, Result};
use fm_core::TypeCatalog;
use fm_mapper::{Mapper, MapperFile, MapperOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Validate that all provided paths exist (and optionally are files).
pub fn validate_paths_exist(inputs: &[PathBuf], must_be_files: bool) -> Result<()> {
    for input in inputs {
        if !input.exists() {
            return Err(CliError::InvalidInput(format!(
                "Input path does not exist: {}",
                input.display()
            )));
        }
        if must_be_files && !input.is_file() {
            return Err(CliError::InvalidInput(format!(
                "Input path is not a file: {}",
                input.display()
            )));
        }
    }
    Ok(())
}

/// Reads a mapper file; `.json` files are JSON, everything else is TOML.
pub fn load_mapper_file(path: &Path) -> Result<MapperFile> {
    validate_paths_exist(&[path.to_path_buf()], true)?;
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let file = if is_json {
        serde_json::from_str(&content).map_err(|e| {
            CliError::InvalidInput(format!("Failed to parse {}: {}", path.display(), e))
        })?
    } else {
        toml::from_str(&content).map_err(|e| {
            CliError::InvalidInput(format!("Failed to parse {}: {}", path.display(), e))
        })?
    };
    debug!("loaded mapper file {}", path.display());
    Ok(file)
}

/// A mapper file resolved against its own type model.
pub struct ResolvedFile {
    pub catalog: Arc<TypeCatalog>,
    pub outcomes: Vec<(String, MapperOutcome)>,
}

impl ResolvedFile {
    /// The mapper called `name`, or the only mapper in the file.
    pub fn select(self, name: Option<&str>) -> Result<MapperOutcome> {
        let available: Vec<String> = self.outcomes.iter().map(|(n, _)| n.clone()).collect();
        let mut outcomes = self.outcomes;
        match name {
            Some(name) => outcomes
                .into_iter()
                .find(|(candidate, _)| candidate == name)
                .map(|(_, outcome)| outcome)
                .ok_or_else(|| {
                    CliError::InvalidInput(format!(
                        "no mapper named `{}` (available: {})",
                        name,
                        available.join(", ")
                    ))
                }),
            None if outcomes.len() == 1 => Ok(outcomes.remove(0).1),
            None => Err(CliError::InvalidInput(format!(
                "the file declares {} mappers, choose one with --mapper (available: {})",
                outcomes.len(),
                available.join(", ")
            ))),
        }
    }
}

pub fn resolve_file(path: &Path, config: &CliConfig) -> Result<ResolvedFile> {
    let file = load_mapper_file(path)?;
    let catalog = Arc::new(file.catalog_spec().build()?);
    info!(
        "resolving {} mapper(s) over {} types",
        file.mappers.len(),
        catalog.len()
    );
    let mapper = Mapper::new(catalog.clone(), config.mapper.options());
    let outcomes = mapper.resolve_all(&file.mappers);
    Ok(ResolvedFile { catalog, outcomes })
}

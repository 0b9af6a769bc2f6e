//! CLI configuration and settings management

use crate::{CliError, Result};
use fm_mapper::{EnumMappingStrategy, MapperOptions, UnmappedEnumPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration loaded from config files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Defaults for mappers that do not set their own options
    pub mapper: MapperDefaults,

    /// Terminal output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperDefaults {
    /// Enum matching strategy
    pub enum_strategy: EnumMappingStrategy,

    /// Case-insensitive fallback for by-name enum matching
    pub enum_ignore_case: bool,

    /// Policy for enum members without a counterpart; unset defers to
    /// `FERROMAP_STRICT_ENUMS`
    pub unmapped_enum_policy: Option<UnmappedEnumPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Colored terminal output
    pub color: bool,

    /// Print info-level diagnostics such as unmapped source members
    pub show_info: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_info: false,
        }
    }
}

impl MapperDefaults {
    pub fn options(&self) -> MapperOptions {
        let fallback = MapperOptions::default();
        MapperOptions {
            enum_strategy: self.enum_strategy,
            enum_ignore_case: self.enum_ignore_case,
            unmapped_enum_policy: self
                .unmapped_enum_policy
                .unwrap_or(fallback.unmapped_enum_policy),
        }
    }
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = config_path {
            Self::load_from_file(path)?
        } else {
            let mut config = Self::default();

            // Lowest precedence first: system, home, current directory
            if let Some(system_config) = Self::default_config_path() {
                if let Ok(system_config) = Self::load_from_file(&system_config) {
                    config = config.merge(system_config);
                }
            }

            if let Some(home_dir) = dirs::home_dir() {
                let home_config = home_dir.join(".ferromap.toml");
                if let Ok(home_config) = Self::load_from_file(&home_config) {
                    config = config.merge(home_config);
                }
            }

            if let Ok(local_config) = Self::load_from_file(Path::new("ferromap.toml")) {
                config = config.merge(local_config);
            }

            config
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merge this configuration with another, with the other taking precedence.
    ///
    /// Files are read whole, so the later file replaces every section it
    /// parsed; a policy left unset keeps the earlier value.
    pub fn merge(self, other: Self) -> Self {
        Self {
            mapper: MapperDefaults {
                unmapped_enum_policy: other
                    .mapper
                    .unmapped_enum_policy
                    .or(self.mapper.unmapped_enum_policy),
                ..other.mapper
            },
            output: other.output,
        }
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ferromap").join("config.toml"))
    }
}

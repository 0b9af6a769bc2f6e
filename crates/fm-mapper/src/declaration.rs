//! Configuration records describing what a mapper should generate.

use fm_core::config;
use fm_core::types::{CatalogSpec, TypeSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumMappingStrategy {
    /// Match members by their numeric constant.
    #[default]
    ByValue,
    /// Match members by identifier; numeric values are ignored.
    ByName,
}

/// What happens when an enum member has no counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedEnumPolicy {
    /// Report a warning and fail at translation time if the member is seen.
    #[default]
    Warn,
    /// Fail resolution of the declaration.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Body is synthesized from the type shapes.
    #[default]
    Generated,
    /// `Map(source, targetType)`: dispatches on the runtime source type and
    /// the requested target type.
    RuntimeTarget,
    /// Body is provided as a handler when the runtime is built.
    UserImplemented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRename {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTypeSpec {
    pub source: String,
    pub target: String,
}

/// One declared mapping method. Type references are names with an optional `?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDeclaration {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: MappingKind,
    #[serde(default)]
    pub renames: Vec<PropertyRename>,
    #[serde(default)]
    pub ignore_source: Vec<String>,
    #[serde(default)]
    pub ignore_target: Vec<String>,
    #[serde(default)]
    pub derived: Vec<DerivedTypeSpec>,
    #[serde(default)]
    pub enum_strategy: Option<EnumMappingStrategy>,
}

impl MappingDeclaration {
    pub fn new(name: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
            kind: MappingKind::Generated,
            renames: Vec::new(),
            ignore_source: Vec::new(),
            ignore_target: Vec::new(),
            derived: Vec::new(),
            enum_strategy: None,
        }
    }

    pub fn runtime_target(name: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, source, target).with_kind(MappingKind::RuntimeTarget)
    }

    pub fn with_kind(mut self, kind: MappingKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_rename(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.renames.push(PropertyRename {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    pub fn with_ignored_source(mut self, path: impl Into<String>) -> Self {
        self.ignore_source.push(path.into());
        self
    }

    pub fn with_ignored_target(mut self, path: impl Into<String>) -> Self {
        self.ignore_target.push(path.into());
        self
    }

    pub fn with_derived(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.derived.push(DerivedTypeSpec {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    pub fn with_enum_strategy(mut self, strategy: EnumMappingStrategy) -> Self {
        self.enum_strategy = Some(strategy);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperOptions {
    pub enum_strategy: EnumMappingStrategy,
    pub enum_ignore_case: bool,
    pub unmapped_enum_policy: UnmappedEnumPolicy,
}

impl Default for MapperOptions {
    fn default() -> Self {
        let unmapped_enum_policy = if config::strict_enum_mode() {
            UnmappedEnumPolicy::Error
        } else {
            UnmappedEnumPolicy::Warn
        };
        Self {
            enum_strategy: EnumMappingStrategy::ByValue,
            enum_ignore_case: false,
            unmapped_enum_policy,
        }
    }
}

/// A mapper: options shared by a list of mapping declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperDeclaration {
    pub name: String,
    #[serde(default)]
    pub enum_strategy: Option<EnumMappingStrategy>,
    #[serde(default)]
    pub enum_ignore_case: Option<bool>,
    #[serde(default)]
    pub unmapped_enum_policy: Option<UnmappedEnumPolicy>,
    #[serde(default)]
    pub mappings: Vec<MappingDeclaration>,
}

impl MapperDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enum_strategy: None,
            enum_ignore_case: None,
            unmapped_enum_policy: None,
            mappings: Vec::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: MappingDeclaration) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn with_enum_strategy(mut self, strategy: EnumMappingStrategy) -> Self {
        self.enum_strategy = Some(strategy);
        self
    }

    pub fn with_unmapped_enum_policy(mut self, policy: UnmappedEnumPolicy) -> Self {
        self.unmapped_enum_policy = Some(policy);
        self
    }

    /// Options for this mapper, falling back to `defaults` for unset fields.
    pub fn options(&self, defaults: &MapperOptions) -> MapperOptions {
        MapperOptions {
            enum_strategy: self.enum_strategy.unwrap_or(defaults.enum_strategy),
            enum_ignore_case: self.enum_ignore_case.unwrap_or(defaults.enum_ignore_case),
            unmapped_enum_policy: self
                .unmapped_enum_policy
                .unwrap_or(defaults.unmapped_enum_policy),
        }
    }
}

/// On-disk layout: the type model plus any number of mappers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapperFile {
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    #[serde(default, rename = "mapper")]
    pub mappers: Vec<MapperDeclaration>,
}

impl MapperFile {
    pub fn catalog_spec(&self) -> CatalogSpec {
        CatalogSpec {
            types: self.types.clone(),
        }
    }
}

//! Turns a [`MapperDeclaration`] into registered mappings and their bodies.
//!
//! Resolution runs in three passes:
//! 1. every declaration is validated on its own ([`resolve_mapping`]) and its
//!    descriptor registered, in declaration order;
//! 2. bodies are built, which may register inferred mappings for nested
//!    members and derived-type associations;
//! 3. polymorphic and runtime-target entry points get their dispatch tables.
//!
//! A failing declaration is reported with its name and never stops its siblings.

use crate::declaration::{
    MapperDeclaration, MapperOptions, MappingDeclaration, MappingKind, UnmappedEnumPolicy,
};
use crate::descriptor::{DerivedTypeAssociation, MappingDescriptor, MappingHandle, MappingOrigin};
use crate::dispatch::Dispatch;
use crate::enums::EnumMappingPlan;
use crate::path::PropertyPath;
use crate::properties::{PlanRequest, PropertyMappingPlan, PropertyPlanner};
use crate::registry::MappingRegistry;
use crate::runtime::MappingRuntime;
use crate::specificity::{order_by_specificity, DispatchCandidate};
use fm_core::collections::ConcurrentMap;
use fm_core::config;
use fm_core::diagnostics::Diagnostic;
use fm_core::{Error, Result, TypeCatalog, TypeId, TypeLookup, TypeRef};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Executable shape of one mapping.
#[derive(Debug, Clone)]
pub enum MappingBody {
    Properties(PropertyMappingPlan),
    Enum(EnumMappingPlan),
    /// The source value is already assignable to the target type.
    Assign,
    Dispatch(Dispatch),
    UserImplemented,
}

/// A declaration whose types and paths all resolved.
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub descriptor: MappingDescriptor,
    pub options: MapperOptions,
    pub renames: Vec<(PropertyPath, PropertyPath)>,
    pub ignored_source: Vec<PropertyPath>,
    pub ignored_target: Vec<PropertyPath>,
    pub derived: Vec<(TypeId, TypeId)>,
    pub enum_plan: Option<EnumMappingPlan>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedMapping {
    fn inferred(descriptor: MappingDescriptor, options: MapperOptions) -> Self {
        Self {
            descriptor,
            options,
            renames: Vec::new(),
            ignored_source: Vec::new(),
            ignored_target: Vec::new(),
            derived: Vec::new(),
            enum_plan: None,
            diagnostics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("`{declaration}`: {error}")]
pub struct DeclarationError {
    pub declaration: String,
    #[source]
    pub error: Error,
}

fn unsupported(declaration: &MappingDeclaration, reason: impl Into<String>) -> Error {
    Error::UnsupportedSignature {
        mapping: declaration.name.clone(),
        reason: reason.into(),
    }
}

fn resolve_paths(lookup: &dyn TypeLookup, root: TypeId, paths: &[String]) -> Result<Vec<PropertyPath>> {
    paths
        .iter()
        .map(|path| PropertyPath::parse(lookup, root, path))
        .collect()
}

/// Validates one declaration against the type model.
///
/// Every rename and ignore path must resolve, derived associations must
/// narrow the declared types, and an enum-to-enum declaration gets its
/// translation table. Nothing is registered here.
pub fn resolve_mapping(
    lookup: &dyn TypeLookup,
    options: &MapperOptions,
    declaration: &MappingDeclaration,
    handle: MappingHandle,
    declaration_order: usize,
) -> Result<ResolvedMapping> {
    let source = lookup.parse_type_ref(&declaration.source)?;
    let target = lookup.parse_type_ref(&declaration.target)?;
    let source_node = lookup.node(source.id);
    let target_node = lookup.node(target.id);

    let options = MapperOptions {
        enum_strategy: declaration.enum_strategy.unwrap_or(options.enum_strategy),
        ..*options
    };
    let configures_members = !declaration.renames.is_empty()
        || !declaration.ignore_source.is_empty()
        || !declaration.ignore_target.is_empty();

    match declaration.kind {
        MappingKind::RuntimeTarget => {
            if source_node.is_value_type() || target_node.is_value_type() {
                return Err(unsupported(
                    declaration,
                    "runtime target mappings need reference types on both sides",
                ));
            }
            if configures_members {
                return Err(unsupported(
                    declaration,
                    "runtime target mappings cannot rename or ignore members",
                ));
            }
        }
        MappingKind::UserImplemented => {
            if configures_members || !declaration.derived.is_empty() {
                return Err(unsupported(
                    declaration,
                    "user-implemented mappings cannot carry member configuration",
                ));
            }
        }
        MappingKind::Generated => {}
    }

    let renames = declaration
        .renames
        .iter()
        .map(|rename| {
            Ok((
                PropertyPath::parse(lookup, source.id, &rename.source)?,
                PropertyPath::parse(lookup, target.id, &rename.target)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    let ignored_source = resolve_paths(lookup, source.id, &declaration.ignore_source)?;
    let ignored_target = resolve_paths(lookup, target.id, &declaration.ignore_target)?;

    let mut derived = Vec::with_capacity(declaration.derived.len());
    for spec in &declaration.derived {
        let derived_source = lookup.require(&spec.source)?;
        let derived_target = lookup.require(&spec.target)?;
        for (declared, candidate, name) in [
            (source.id, derived_source, &spec.source),
            (target.id, derived_target, &spec.target),
        ] {
            if !lookup.is_assignable_from(declared, candidate) {
                return Err(Error::DerivedTypeNotAssignable {
                    derived: name.clone(),
                    declared: lookup.name(declared).to_string(),
                });
            }
        }
        // Inferred fan-out mappings are either plain assignments or property plans.
        let convertible = lookup.is_assignable_from(derived_target, derived_source)
            || !(lookup.node(derived_source).is_value_type()
                || lookup.node(derived_target).is_value_type());
        if !convertible {
            return Err(unsupported(
                declaration,
                format!(
                    "derived association `{}` -> `{}` has no conversion",
                    spec.source, spec.target
                ),
            ));
        }
        if (derived_source, derived_target) == (source.id, target.id) {
            return Err(unsupported(
                declaration,
                "a derived association cannot repeat the mapping's own types",
            ));
        }
        if derived.contains(&(derived_source, derived_target)) {
            return Err(Error::AmbiguousMapping {
                source_type: spec.source.clone(),
                target_type: spec.target.clone(),
                existing: declaration.name.clone(),
            });
        }
        derived.push((derived_source, derived_target));
    }

    let mut diagnostics = Vec::new();
    let mut enum_plan = None;
    if declaration.kind == MappingKind::Generated && derived.is_empty() {
        if source_node.is_enum() && target_node.is_enum() {
            let plan = EnumMappingPlan::plan(
                lookup,
                source.id,
                target.id,
                options.enum_strategy,
                options.enum_ignore_case,
            )?;
            let gaps = plan.gap_errors();
            if options.unmapped_enum_policy == UnmappedEnumPolicy::Error {
                if let Some(first) = gaps.into_iter().next() {
                    return Err(first);
                }
            } else {
                for gap in gaps {
                    tracing::warn!("{}: {}", declaration.name, gap);
                    diagnostics.push(
                        Diagnostic::warning(gap.to_string())
                            .with_declaration(&declaration.name)
                            .with_code("ferromap::unmapped_enum_member"),
                    );
                }
            }
            enum_plan = Some(plan);
        } else if !lookup.is_assignable_from(target.id, source.id)
            && !(source_node.is_class() && target_node.is_class())
        {
            return Err(unsupported(
                declaration,
                format!(
                    "no conversion from `{}` to `{}`",
                    lookup.display(source),
                    lookup.display(target)
                ),
            ));
        }
    } else if declaration.kind == MappingKind::Generated
        && (source_node.is_value_type() || target_node.is_value_type())
    {
        return Err(unsupported(
            declaration,
            "derived-type mappings need reference types on both sides",
        ));
    }

    let descriptor = MappingDescriptor {
        handle,
        name: declaration.name.clone(),
        source,
        target,
        kind: declaration.kind,
        origin: MappingOrigin::Declared,
        declaration_order,
    };

    Ok(ResolvedMapping {
        descriptor,
        options,
        renames,
        ignored_source,
        ignored_target,
        derived,
        enum_plan,
        diagnostics,
    })
}

/// Result of resolving one mapper.
#[derive(Debug, Clone)]
pub struct MapperOutcome {
    pub name: String,
    pub catalog: Arc<TypeCatalog>,
    pub registry: MappingRegistry,
    pub bodies: HashMap<MappingHandle, MappingBody>,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<DeclarationError>,
}

impl MapperOutcome {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn descriptor(&self, name: &str) -> Option<&MappingDescriptor> {
        self.registry.by_name(name)
    }

    pub fn body(&self, name: &str) -> Option<&MappingBody> {
        self.descriptor(name)
            .and_then(|descriptor| self.bodies.get(&descriptor.handle))
    }

    pub fn dispatch(&self, name: &str) -> Option<&Dispatch> {
        match self.body(name) {
            Some(MappingBody::Dispatch(dispatch)) => Some(dispatch),
            _ => None,
        }
    }

    /// Every dispatch table, in registration order of their entry points.
    pub fn dispatches(&self) -> Vec<&Dispatch> {
        self.registry
            .iter()
            .filter_map(|descriptor| match self.bodies.get(&descriptor.handle) {
                Some(MappingBody::Dispatch(dispatch)) => Some(dispatch),
                _ => None,
            })
            .collect()
    }

    pub fn failure(&self, declaration: &str) -> Option<&Error> {
        self.failures
            .iter()
            .find(|failure| failure.declaration == declaration)
            .map(|failure| &failure.error)
    }

    /// Diagnostics followed by one error diagnostic per failed declaration.
    pub fn all_diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.diagnostics.clone();
        all.extend(self.failures.iter().map(|failure| {
            Diagnostic::from_error(&failure.error).with_declaration(&failure.declaration)
        }));
        all
    }

    pub fn into_runtime(self) -> MappingRuntime {
        MappingRuntime::new(self)
    }
}

/// Resolves mapper declarations against one immutable type catalog.
#[derive(Debug, Clone)]
pub struct Mapper {
    catalog: Arc<TypeCatalog>,
    options: MapperOptions,
}

struct Resolution<'a> {
    lookup: &'a dyn TypeLookup,
    options: MapperOptions,
    registry: MappingRegistry,
    pending: HashMap<MappingHandle, ResolvedMapping>,
    queue: VecDeque<MappingHandle>,
    bodies: HashMap<MappingHandle, MappingBody>,
    diagnostics: Vec<Diagnostic>,
    failures: Vec<DeclarationError>,
}

impl<'a> Resolution<'a> {
    fn fail(&mut self, declaration: &str, error: Error) {
        tracing::debug!("declaration `{}` failed: {}", declaration, error);
        self.failures.push(DeclarationError {
            declaration: declaration.to_string(),
            error,
        });
    }

    /// Existing mapping for `(source, target)` or a newly inferred one.
    fn mapping_for(&mut self, source: TypeRef, target: TypeRef, exact: bool) -> Result<MappingHandle> {
        let existing = if exact {
            self.registry.find_exact(source, target)
        } else {
            self.registry.find_compatible(source.id, target.id)
        };
        if let Some(existing) = existing {
            return Ok(existing.handle);
        }

        let name = self
            .registry
            .unique_name(&format!("MapTo{}", self.lookup.name(target.id)));
        let descriptor = MappingDescriptor {
            handle: self.registry.allocate(),
            name,
            source,
            target,
            kind: MappingKind::Generated,
            origin: MappingOrigin::Inferred,
            declaration_order: self.registry.next_order(),
        };
        let handle = self.registry.register(self.lookup, descriptor.clone())?;
        self.pending
            .insert(handle, ResolvedMapping::inferred(descriptor, self.options));
        self.queue.push_back(handle);
        Ok(handle)
    }

    fn build_generated(&mut self, mapping: &ResolvedMapping) -> MappingBody {
        if let Some(plan) = &mapping.enum_plan {
            return MappingBody::Enum(plan.clone());
        }
        let descriptor = &mapping.descriptor;
        let lookup = self.lookup;
        if lookup.is_assignable_from(descriptor.target.id, descriptor.source.id) {
            return MappingBody::Assign;
        }

        let request = PlanRequest {
            name: &descriptor.name,
            source: descriptor.source.id,
            target: descriptor.target.id,
            renames: &mapping.renames,
            ignored_source: &mapping.ignored_source,
            ignored_target: &mapping.ignored_target,
        };
        let planner = PropertyPlanner::new(lookup, mapping.options);
        let mut nested = |from: TypeRef, to: TypeRef| match self.mapping_for(from, to, false) {
            Ok(handle) => Some(handle),
            Err(error) => {
                tracing::warn!("could not infer nested mapping: {}", error);
                None
            }
        };
        let report = planner.plan(&request, &mut nested);
        self.diagnostics.extend(report.diagnostics);
        MappingBody::Properties(report.value.unwrap_or_default())
    }

    fn fan_out(&mut self, mapping: &ResolvedMapping) -> Result<()> {
        let mut associations = Vec::with_capacity(mapping.derived.len());
        for (source, target) in &mapping.derived {
            let handle = self.mapping_for(TypeRef::new(*source), TypeRef::new(*target), true)?;
            associations.push(DerivedTypeAssociation {
                source: *source,
                target: *target,
                handle,
            });
        }
        self.registry
            .register_derived(self.lookup, mapping.descriptor.handle, associations)
    }

    fn candidates(&self, entry: &MappingDescriptor) -> Vec<DispatchCandidate> {
        let associations = self.registry.find_all_for_entry_point(entry.handle);
        if !associations.is_empty() {
            return associations
                .iter()
                .enumerate()
                .filter_map(|(order, association)| {
                    let mapping = self.registry.get(association.handle)?;
                    Some(DispatchCandidate {
                        source: TypeRef::new(association.source)
                            .with_nullable(mapping.source.nullable),
                        target: TypeRef::new(association.target)
                            .with_nullable(mapping.target.nullable),
                        handle: association.handle,
                        name: mapping.name.clone(),
                        declaration_order: order,
                    })
                })
                .collect();
        }

        self.registry
            .iter()
            .filter(|candidate| {
                candidate.is_declared()
                    && !candidate.is_runtime_target()
                    && self.bodies.contains_key(&candidate.handle)
                    && self.lookup.is_assignable_from(entry.source.id, candidate.source.id)
                    && self.lookup.is_assignable_from(entry.target.id, candidate.target.id)
            })
            .map(|candidate| DispatchCandidate {
                source: candidate.source,
                target: candidate.target,
                handle: candidate.handle,
                name: candidate.name.clone(),
                declaration_order: candidate.declaration_order,
            })
            .collect()
    }
}

impl Mapper {
    pub fn new(catalog: Arc<TypeCatalog>, options: MapperOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn resolve(&self, declaration: &MapperDeclaration) -> MapperOutcome {
        let lookup: &dyn TypeLookup = &*self.catalog;
        let options = declaration.options(&self.options);
        tracing::debug!(
            "resolving mapper `{}` with {} declarations",
            declaration.name,
            declaration.mappings.len()
        );

        let mut state = Resolution {
            lookup,
            options,
            registry: MappingRegistry::new(),
            pending: HashMap::new(),
            queue: VecDeque::new(),
            bodies: HashMap::new(),
            diagnostics: Vec::new(),
            failures: Vec::new(),
        };

        // pass 1: validate and register declared mappings
        for mapping in &declaration.mappings {
            let handle = state.registry.allocate();
            let order = state.registry.next_order();
            let resolved = resolve_mapping(lookup, &options, mapping, handle, order).and_then(
                |resolved| {
                    state
                        .registry
                        .register(lookup, resolved.descriptor.clone())?;
                    Ok(resolved)
                },
            );
            match resolved {
                Ok(resolved) => {
                    state.diagnostics.extend(resolved.diagnostics.iter().cloned());
                    state.pending.insert(handle, resolved);
                    state.queue.push_back(handle);
                }
                Err(error) => state.fail(&mapping.name, error),
            }
        }

        // pass 2: bodies, inferring nested and derived mappings as needed
        let mut polymorphic = Vec::new();
        let mut runtime_targets = Vec::new();
        while let Some(handle) = state.queue.pop_front() {
            let Some(mapping) = state.pending.remove(&handle) else {
                continue;
            };
            if !mapping.derived.is_empty() {
                if let Err(error) = state.fan_out(&mapping) {
                    state.fail(&mapping.descriptor.name, error);
                    continue;
                }
            }
            match mapping.descriptor.kind {
                MappingKind::RuntimeTarget => runtime_targets.push(handle),
                MappingKind::Generated if !mapping.derived.is_empty() => polymorphic.push(handle),
                MappingKind::Generated => {
                    let body = state.build_generated(&mapping);
                    state.bodies.insert(handle, body);
                }
                MappingKind::UserImplemented => {
                    state.bodies.insert(handle, MappingBody::UserImplemented);
                }
            }
        }

        // pass 3: dispatch tables; derived entry points first so that runtime
        // target entry points can route to them
        for handle in polymorphic.into_iter().chain(runtime_targets) {
            let Some(entry) = state.registry.get(handle).cloned() else {
                continue;
            };
            let ordered = order_by_specificity(lookup, state.candidates(&entry));
            let dispatch = Dispatch::build(self.catalog.clone(), &entry, ordered);
            if dispatch.arms().is_empty() {
                state.diagnostics.push(
                    Diagnostic::warning(format!(
                        "entry point `{}` has no reachable mapping",
                        entry.name
                    ))
                    .with_declaration(&entry.name)
                    .with_code("ferromap::empty_dispatch"),
                );
            }
            state.bodies.insert(handle, MappingBody::Dispatch(dispatch));
        }

        MapperOutcome {
            name: declaration.name.clone(),
            catalog: self.catalog.clone(),
            registry: state.registry,
            bodies: state.bodies,
            diagnostics: state.diagnostics,
            failures: state.failures,
        }
    }

    /// Resolves independent mappers concurrently. Results are sorted by mapper name.
    pub fn resolve_all(&self, declarations: &[MapperDeclaration]) -> Vec<(String, MapperOutcome)> {
        let results = ConcurrentMap::new();
        let store = |declaration: &MapperDeclaration| {
            let outcome = self.resolve(declaration);
            if results.insert_first(declaration.name.clone(), outcome).is_err() {
                tracing::warn!(
                    "mapper `{}` is declared more than once; keeping the first",
                    declaration.name
                );
            }
        };

        if config::sequential_mode() {
            declarations.iter().for_each(store);
        } else {
            let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
            let chunk = declarations.len().div_ceil(workers).max(1);
            std::thread::scope(|scope| {
                for batch in declarations.chunks(chunk) {
                    let store = &store;
                    scope.spawn(move || batch.iter().for_each(store));
                }
            });
        }
        results.into_sorted_vec()
    }
}

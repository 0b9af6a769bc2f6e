//! Member-by-member plans for generated object mappings.

use crate::declaration::{MapperOptions, UnmappedEnumPolicy};
use crate::descriptor::MappingHandle;
use crate::enums::EnumMappingPlan;
use crate::path::PropertyPath;
use fm_core::diagnostics::{Diagnostic, DiagnosticReport};
use fm_core::{TypeId, TypeLookup, TypeRef};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberConversion {
    /// The source value is assignable as is.
    Direct,
    Enum(EnumMappingPlan),
    /// Object-to-object conversion through another mapping.
    Nested(MappingHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAssignment {
    pub source: PropertyPath,
    pub target: PropertyPath,
    pub conversion: MemberConversion,
    /// Skip the assignment when the source reads null; the target cannot hold null.
    pub skip_null: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMappingPlan {
    pub assignments: Vec<PropertyAssignment>,
}

impl PropertyMappingPlan {
    pub fn target_names(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|assignment| assignment.target.full_name())
            .collect()
    }
}

/// Inputs a planner needs about one generated mapping.
pub struct PlanRequest<'a> {
    pub name: &'a str,
    pub source: TypeId,
    pub target: TypeId,
    pub renames: &'a [(PropertyPath, PropertyPath)],
    pub ignored_source: &'a [PropertyPath],
    pub ignored_target: &'a [PropertyPath],
}

/// Builds [`PropertyMappingPlan`]s.
///
/// Nested object conversions are delegated to `nested`, which returns the
/// handle of an existing or newly inferred mapping for a pair of class types.
pub struct PropertyPlanner<'a> {
    lookup: &'a dyn TypeLookup,
    options: MapperOptions,
}

impl<'a> PropertyPlanner<'a> {
    pub fn new(lookup: &'a dyn TypeLookup, options: MapperOptions) -> Self {
        Self { lookup, options }
    }

    pub fn plan(
        &self,
        request: &PlanRequest<'_>,
        nested: &mut dyn FnMut(TypeRef, TypeRef) -> Option<MappingHandle>,
    ) -> DiagnosticReport<PropertyMappingPlan> {
        let lookup = self.lookup;
        let mut diagnostics = Vec::new();
        let mut plan = PropertyMappingPlan::default();

        let ignored_source: HashSet<String> =
            request.ignored_source.iter().map(PropertyPath::full_name).collect();
        let ignored_target: HashSet<String> =
            request.ignored_target.iter().map(PropertyPath::full_name).collect();
        let mut used_source: HashSet<String> = HashSet::new();
        let mut covered_target: HashSet<String> = HashSet::new();

        for (source, target) in request.renames {
            if ignored_target.contains(&target.full_name()) {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "target member `{}` is both renamed and ignored; the rename wins",
                        target
                    ))
                    .with_declaration(request.name),
                );
            }
            used_source.insert(source.first().name.clone());
            covered_target.insert(target.first().name.clone());
            if let Some(assignment) =
                self.assignment(request, source.clone(), target.clone(), nested, &mut diagnostics)
            {
                plan.assignments.push(assignment);
            }
        }

        for member in lookup.members_of(request.target) {
            if !member.is_public()
                || covered_target.contains(&member.name)
                || ignored_target.contains(&member.name)
            {
                continue;
            }

            let source_member = lookup.members_of(request.source).into_iter().find(|candidate| {
                candidate.is_public()
                    && candidate.name == member.name
                    && !ignored_source.contains(&candidate.name)
            });
            let Some(source_member) = source_member else {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "target member `{}` of `{}` is not mapped",
                        member.name,
                        lookup.name(request.target)
                    ))
                    .with_declaration(request.name)
                    .with_code("ferromap::unmapped_target_member")
                    .with_suggestion("declare a rename or ignore the member"),
                );
                continue;
            };
            let (Ok(source), Ok(target)) = (
                PropertyPath::resolve(lookup, request.source, &[source_member.name.as_str()]),
                PropertyPath::resolve(lookup, request.target, &[member.name.as_str()]),
            ) else {
                continue;
            };
            used_source.insert(source_member.name.clone());
            if let Some(assignment) = self.assignment(request, source, target, nested, &mut diagnostics) {
                plan.assignments.push(assignment);
            }
        }

        for member in lookup.members_of(request.source) {
            if member.is_public()
                && !used_source.contains(&member.name)
                && !ignored_source.contains(&member.name)
            {
                diagnostics.push(
                    Diagnostic::info(format!(
                        "source member `{}` of `{}` is not mapped",
                        member.name,
                        lookup.name(request.source)
                    ))
                    .with_declaration(request.name)
                    .with_code("ferromap::unmapped_source_member"),
                );
            }
        }

        DiagnosticReport::success_with_diagnostics(plan, diagnostics)
    }

    fn assignment(
        &self,
        request: &PlanRequest<'_>,
        source: PropertyPath,
        target: PropertyPath,
        nested: &mut dyn FnMut(TypeRef, TypeRef) -> Option<MappingHandle>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<PropertyAssignment> {
        let lookup = self.lookup;
        let from = source.member_type();
        let to = target.member_type();
        let skip_null = source.may_be_null() && !to.nullable;

        let conversion = if lookup.is_assignable_from(to.id, from.id) {
            MemberConversion::Direct
        } else if lookup.node(from.id).is_enum() && lookup.node(to.id).is_enum() {
            match EnumMappingPlan::plan(
                lookup,
                from.id,
                to.id,
                self.options.enum_strategy,
                self.options.enum_ignore_case,
            ) {
                Ok(plan) => {
                    for gap in plan.gap_errors() {
                        diagnostics.push(self.enum_gap(request.name, &gap));
                    }
                    MemberConversion::Enum(plan)
                }
                Err(error) => {
                    diagnostics.push(Diagnostic::from_error(&error).with_declaration(request.name));
                    return None;
                }
            }
        } else if lookup.node(from.id).is_class() && lookup.node(to.id).is_class() {
            match nested(from.non_nullable(), to.non_nullable()) {
                Some(handle) => MemberConversion::Nested(handle),
                None => {
                    diagnostics.push(self.incompatible(request.name, &source, &target));
                    return None;
                }
            }
        } else {
            diagnostics.push(self.incompatible(request.name, &source, &target));
            return None;
        };

        Some(PropertyAssignment {
            source,
            target,
            conversion,
            skip_null,
        })
    }

    fn enum_gap(&self, declaration: &str, gap: &fm_core::Error) -> Diagnostic {
        let diagnostic = match self.options.unmapped_enum_policy {
            UnmappedEnumPolicy::Warn => {
                tracing::warn!("{}: {}", declaration, gap);
                Diagnostic::warning(gap.to_string())
            }
            UnmappedEnumPolicy::Error => Diagnostic::error(gap.to_string()),
        };
        diagnostic
            .with_declaration(declaration)
            .with_code("ferromap::unmapped_enum_member")
    }

    fn incompatible(&self, declaration: &str, source: &PropertyPath, target: &PropertyPath) -> Diagnostic {
        let lookup = self.lookup;
        tracing::warn!(
            "{}: skipping `{}` -> `{}`, no conversion from {} to {}",
            declaration,
            source,
            target,
            lookup.display(source.member_type()),
            lookup.display(target.member_type())
        );
        Diagnostic::warning(format!(
            "could not map member `{}` of type `{}` to `{}` of type `{}`",
            source,
            lookup.display(source.member_type()),
            target,
            lookup.display(target.member_type())
        ))
        .with_declaration(declaration)
        .with_code("ferromap::incompatible_member")
    }
}

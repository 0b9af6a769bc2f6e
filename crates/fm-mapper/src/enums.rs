//! Enum-to-enum translation tables.

use crate::declaration::EnumMappingStrategy;
use fm_core::{EnumMember, Error, Result, TypeId, TypeLookup, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMemberMapping {
    pub source: EnumMember,
    pub target: Option<EnumMember>,
}

/// Source member to target member table for one pair of enums.
///
/// The table is partial: source members without a counterpart are kept as
/// gaps so the caller can decide whether that is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMappingPlan {
    pub strategy: EnumMappingStrategy,
    pub source: TypeId,
    pub target: TypeId,
    source_name: String,
    target_name: String,
    entries: Vec<EnumMemberMapping>,
    target_members: Vec<EnumMember>,
}

impl EnumMappingPlan {
    pub fn plan(
        lookup: &dyn TypeLookup,
        source: TypeId,
        target: TypeId,
        strategy: EnumMappingStrategy,
        ignore_case: bool,
    ) -> Result<Self> {
        let source_node = lookup.node(source);
        let target_node = lookup.node(target);
        let (Some(source_members), Some(target_members)) =
            (source_node.enum_members(), target_node.enum_members())
        else {
            return Err(Error::UnsupportedSignature {
                mapping: format!("{} -> {}", source_node.name, target_node.name),
                reason: "enum mappings require enum types on both sides".to_string(),
            });
        };

        let entries = source_members
            .iter()
            .map(|member| EnumMemberMapping {
                source: member.clone(),
                target: match strategy {
                    EnumMappingStrategy::ByValue => target_members
                        .iter()
                        .find(|candidate| candidate.value == member.value)
                        .cloned(),
                    EnumMappingStrategy::ByName => {
                        find_by_name(target_members, &member.name, ignore_case).cloned()
                    }
                },
            })
            .collect();

        Ok(Self {
            strategy,
            source,
            target,
            source_name: source_node.name.clone(),
            target_name: target_node.name.clone(),
            entries,
            target_members: target_members.to_vec(),
        })
    }

    pub fn entries(&self) -> &[EnumMemberMapping] {
        &self.entries
    }

    /// Source members that have no counterpart.
    pub fn gaps(&self) -> impl Iterator<Item = &EnumMember> {
        self.entries
            .iter()
            .filter(|entry| entry.target.is_none())
            .map(|entry| &entry.source)
    }

    /// Target members that no source member maps to.
    pub fn unmapped_targets(&self) -> Vec<&EnumMember> {
        self.target_members
            .iter()
            .filter(|target| {
                !self
                    .entries
                    .iter()
                    .any(|entry| entry.target.as_ref() == Some(*target))
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.gaps().next().is_none()
    }

    /// One [`Error::UnmappedEnumMember`] per gap.
    pub fn gap_errors(&self) -> Vec<Error> {
        self.gaps()
            .map(|member| self.unmapped(member.name.clone(), member.value))
            .collect()
    }

    fn unmapped(&self, member: String, value: i64) -> Error {
        Error::UnmappedEnumMember {
            enum_type: self.source_name.clone(),
            member,
            value,
            target_enum: self.target_name.clone(),
        }
    }

    /// Translates a numeric source value to the numeric target value.
    ///
    /// Values that are not declared on the source enum only translate by value.
    pub fn translate(&self, value: i64) -> Result<i64> {
        match self.entries.iter().find(|entry| entry.source.value == value) {
            Some(EnumMemberMapping {
                target: Some(target),
                ..
            }) => Ok(target.value),
            Some(entry) => Err(self.unmapped(entry.source.name.clone(), value)),
            None if self.strategy == EnumMappingStrategy::ByValue => self
                .target_members
                .iter()
                .find(|candidate| candidate.value == value)
                .map(|candidate| candidate.value)
                .ok_or_else(|| self.unmapped(value.to_string(), value)),
            None => Err(self.unmapped(value.to_string(), value)),
        }
    }

    /// Translates a runtime enum (or raw integer) value.
    pub fn translate_value(&self, value: &Value) -> Result<Value> {
        let raw = match value {
            Value::Enum { ty, value } if *ty == self.source => *value,
            Value::Int(value) => *value,
            other => {
                return Err(Error::Generic(format!(
                    "expected a value of enum `{}`, got {:?}",
                    self.source_name, other
                )))
            }
        };
        Ok(Value::Enum {
            ty: self.target,
            value: self.translate(raw)?,
        })
    }
}

fn find_by_name<'a>(members: &'a [EnumMember], name: &str, ignore_case: bool) -> Option<&'a EnumMember> {
    members
        .iter()
        .find(|candidate| candidate.name == name)
        .or_else(|| {
            if ignore_case {
                members
                    .iter()
                    .find(|candidate| candidate.name.eq_ignore_ascii_case(name))
            } else {
                None
            }
        })
}

/// Translates `value` with `plan`.
pub fn translate_enum_value(plan: &EnumMappingPlan, value: &Value) -> Result<Value> {
    plan.translate_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_core::TypeCatalog;
    use pretty_assertions::assert_eq;

    fn catalog() -> TypeCatalog {
        let mut builder = TypeCatalog::builder();
        builder
            .add_enum("CarColor", [("Red", 1), ("Blue", 2), ("Green", 3), ("Black", 4)])
            .add_enum("CarColorDto", [("Yellow", 1), ("Red", 2), ("Blue", 3), ("black", 4)])
            .add_class("Car", None);
        builder.build().unwrap()
    }

    fn ids(catalog: &TypeCatalog) -> (TypeId, TypeId) {
        (
            catalog.find("CarColor").unwrap(),
            catalog.find("CarColorDto").unwrap(),
        )
    }

    #[test]
    fn by_name_ignores_numeric_values() {
        let catalog = catalog();
        let (source, target) = ids(&catalog);
        let plan =
            EnumMappingPlan::plan(&catalog, source, target, EnumMappingStrategy::ByName, false)
                .unwrap();
        assert_eq!(plan.translate(1).unwrap(), 2);
        assert_eq!(plan.translate(2).unwrap(), 3);
        let gaps: Vec<&str> = plan.gaps().map(|m| m.name.as_str()).collect();
        assert_eq!(gaps, vec!["Green", "Black"]);
        let unmapped: Vec<&str> = plan.unmapped_targets().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(unmapped, vec!["Yellow", "black"]);
    }

    #[test]
    fn by_name_can_ignore_case() {
        let catalog = catalog();
        let (source, target) = ids(&catalog);
        let plan =
            EnumMappingPlan::plan(&catalog, source, target, EnumMappingStrategy::ByName, true)
                .unwrap();
        assert_eq!(plan.translate(4).unwrap(), 4);
        let gaps: Vec<&str> = plan.gaps().map(|m| m.name.as_str()).collect();
        assert_eq!(gaps, vec!["Green"]);
    }

    #[test]
    fn by_value_matches_constants() {
        let catalog = catalog();
        let (source, target) = ids(&catalog);
        let plan =
            EnumMappingPlan::plan(&catalog, source, target, EnumMappingStrategy::ByValue, false)
                .unwrap();
        assert!(plan.is_complete());
        assert_eq!(plan.translate(1).unwrap(), 1);
        assert_eq!(
            plan.translate_value(&Value::Enum { ty: source, value: 3 }).unwrap(),
            Value::Enum { ty: target, value: 3 }
        );
    }

    #[test]
    fn gap_translation_fails_with_member_name() {
        let catalog = catalog();
        let (source, target) = ids(&catalog);
        let plan =
            EnumMappingPlan::plan(&catalog, source, target, EnumMappingStrategy::ByName, false)
                .unwrap();
        assert_eq!(
            translate_enum_value(&plan, &Value::Enum { ty: source, value: 3 }).unwrap_err(),
            Error::UnmappedEnumMember {
                enum_type: "CarColor".to_string(),
                member: "Green".to_string(),
                value: 3,
                target_enum: "CarColorDto".to_string(),
            }
        );
        assert_eq!(plan.gap_errors().len(), 2);
    }

    #[test]
    fn by_value_reports_constants_without_counterpart() {
        let mut builder = TypeCatalog::builder();
        builder
            .add_enum("Trim", [("Base", 0), ("Sport", 1), ("Luxury", 2)])
            .add_enum("TrimDto", [("Standard", 0), ("Sporty", 1)]);
        let catalog = builder.build().unwrap();
        let source = catalog.find("Trim").unwrap();
        let target = catalog.find("TrimDto").unwrap();
        let plan =
            EnumMappingPlan::plan(&catalog, source, target, EnumMappingStrategy::ByValue, false)
                .unwrap();

        assert!(!plan.is_complete());
        let gaps: Vec<&str> = plan.gaps().map(|m| m.name.as_str()).collect();
        assert_eq!(gaps, vec!["Luxury"]);
        let luxury = Error::UnmappedEnumMember {
            enum_type: "Trim".to_string(),
            member: "Luxury".to_string(),
            value: 2,
            target_enum: "TrimDto".to_string(),
        };
        assert_eq!(plan.gap_errors(), vec![luxury.clone()]);

        assert_eq!(plan.translate(1).unwrap(), 1);
        assert_eq!(plan.translate(2).unwrap_err(), luxury);
        assert_eq!(
            plan.translate_value(&Value::Enum { ty: source, value: 2 }).unwrap_err(),
            luxury
        );
    }

    #[test]
    fn non_enum_types_are_rejected() {
        let catalog = catalog();
        let (source, _) = ids(&catalog);
        let car = catalog.find("Car").unwrap();
        assert!(matches!(
            EnumMappingPlan::plan(&catalog, source, car, EnumMappingStrategy::ByValue, false),
            Err(Error::UnsupportedSignature { .. })
        ));
    }
}

//! Runtime selection among several type-pair mappings.

use crate::descriptor::{MappingDescriptor, MappingHandle};
use crate::specificity::DispatchCandidate;
use fm_core::{Error, Result, TypeCatalog, TypeId, TypeLookup, TypeRef, Value};
use std::fmt;
use std::sync::Arc;

/// Guard and handler of one dispatch arm.
///
/// The arm fires when the runtime source type is assignable to `source` and
/// the requested target type is assignable from `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchArm {
    pub source: TypeId,
    pub target: TypeId,
    pub handle: MappingHandle,
    pub name: String,
}

/// Ordered decision list for one entry point.
///
/// Arms are evaluated top to bottom and the first matching arm wins; when
/// none matches the call fails with [`Error::UnresolvableDispatch`]. The
/// table is immutable and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Dispatch {
    catalog: Arc<TypeCatalog>,
    entry: String,
    source: TypeRef,
    target: TypeRef,
    arms: Vec<DispatchArm>,
}

impl Dispatch {
    /// Builds the arms for `entry` from candidates already in specificity order.
    ///
    /// When the entry point returns a non-nullable type, candidates whose
    /// target is nullable are dropped here, so they are never reachable.
    pub fn build(
        catalog: Arc<TypeCatalog>,
        entry: &MappingDescriptor,
        ordered: Vec<DispatchCandidate>,
    ) -> Self {
        let arms = ordered
            .into_iter()
            .filter(|candidate| {
                let keep = entry.target.nullable || !candidate.target.nullable;
                if !keep {
                    tracing::trace!(
                        "{}: dropping `{}`, its nullable result cannot satisfy a non-nullable return",
                        entry.name,
                        candidate.name
                    );
                }
                keep
            })
            .map(|candidate| DispatchArm {
                source: candidate.source.id,
                target: candidate.target.id,
                handle: candidate.handle,
                name: candidate.name,
            })
            .collect();

        Self {
            catalog,
            entry: entry.name.clone(),
            source: entry.source,
            target: entry.target,
            arms,
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn arms(&self) -> &[DispatchArm] {
        &self.arms
    }

    pub fn returns_nullable(&self) -> bool {
        self.target.nullable
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    fn guard(&self, arm: &DispatchArm, runtime: TypeId, requested: TypeId) -> bool {
        self.catalog.is_assignable_from(arm.source, runtime)
            && self.catalog.is_assignable_from(requested, arm.target)
    }

    /// First arm whose guard holds for `runtime` and `requested`.
    pub fn select(&self, runtime: TypeId, requested: TypeId) -> Result<&DispatchArm> {
        for arm in &self.arms {
            if self.guard(arm, runtime, requested) {
                tracing::trace!(
                    "{}: {} -> {} handled by `{}`",
                    self.entry,
                    self.catalog.name(runtime),
                    self.catalog.name(requested),
                    arm.name
                );
                return Ok(arm);
            }
        }
        Err(Error::UnresolvableDispatch {
            source_type: self.catalog.name(runtime).to_string(),
            target_type: self.catalog.name(requested).to_string(),
        })
    }

    /// Selects an arm for `source` and runs `apply` with it.
    ///
    /// A null source yields `Ok(None)` when the entry point returns a
    /// nullable type and an unresolvable-dispatch error otherwise.
    pub fn invoke<F>(&self, source: Option<&Value>, requested: TypeId, apply: F) -> Result<Option<Value>>
    where
        F: FnOnce(&DispatchArm, &Value) -> Result<Value>,
    {
        let Some(value) = source.filter(|value| !value.is_null()) else {
            if self.returns_nullable() {
                return Ok(None);
            }
            return Err(Error::UnresolvableDispatch {
                source_type: "null".to_string(),
                target_type: self.catalog.name(requested).to_string(),
            });
        };
        let runtime = value.runtime_type(&self.catalog).ok_or_else(|| {
            Error::Generic(format!("value {:?} has no type in the catalog", value))
        })?;
        let arm = self.select(runtime, requested)?;
        apply(arm, value).map(crate::runtime::non_null)
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}({} source, targetType) -> {}",
            self.entry,
            self.catalog.display(self.source),
            self.catalog.display(self.target)
        )?;
        for arm in &self.arms {
            writeln!(
                f,
                "    {} x when targetType.is_assignable_from({}) => {}(x)",
                self.catalog.name(arm.source),
                self.catalog.name(arm.target),
                arm.name
            )?;
        }
        write!(f, "    _ => unresolvable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::MappingKind;
    use crate::descriptor::MappingOrigin;
    use fm_core::value::ObjectValue;
    use pretty_assertions::assert_eq;

    fn catalog() -> Arc<TypeCatalog> {
        let mut builder = TypeCatalog::builder();
        builder
            .add_class("A", None)
            .add_class("B", None)
            .add_class("C", None)
            .add_class("D", None)
            .add_class("X", None);
        Arc::new(builder.build().unwrap())
    }

    fn entry(catalog: &TypeCatalog, nullable: bool) -> MappingDescriptor {
        MappingDescriptor {
            handle: MappingHandle(0),
            name: "Map".to_string(),
            source: TypeRef::new(catalog.any()).with_nullable(nullable),
            target: TypeRef::new(catalog.any()).with_nullable(nullable),
            kind: MappingKind::RuntimeTarget,
            origin: MappingOrigin::Declared,
            declaration_order: 0,
        }
    }

    fn candidates(catalog: &TypeCatalog) -> Vec<DispatchCandidate> {
        vec![
            DispatchCandidate {
                source: TypeRef::new(catalog.find("A").unwrap()),
                target: TypeRef::new(catalog.find("B").unwrap()),
                handle: MappingHandle(1),
                name: "MapToB".to_string(),
                declaration_order: 1,
            },
            DispatchCandidate {
                source: TypeRef::new(catalog.find("C").unwrap()),
                target: TypeRef::nullable(catalog.find("D").unwrap()),
                handle: MappingHandle(2),
                name: "MapToD".to_string(),
                declaration_order: 2,
            },
        ]
    }

    #[test]
    fn nullable_targets_are_filtered_for_non_nullable_entry() {
        let catalog = catalog();
        let dispatch = Dispatch::build(catalog.clone(), &entry(&catalog, false), candidates(&catalog));
        let names: Vec<&str> = dispatch.arms().iter().map(|arm| arm.name.as_str()).collect();
        assert_eq!(names, vec!["MapToB"]);

        let dispatch = Dispatch::build(catalog.clone(), &entry(&catalog, true), candidates(&catalog));
        assert_eq!(dispatch.arms().len(), 2);
    }

    #[test]
    fn unrelated_runtime_type_is_unresolvable() {
        let catalog = catalog();
        let dispatch = Dispatch::build(catalog.clone(), &entry(&catalog, false), candidates(&catalog));
        let x = catalog.find("X").unwrap();
        let b = catalog.find("B").unwrap();
        assert_eq!(
            dispatch.select(x, b).unwrap_err(),
            Error::UnresolvableDispatch {
                source_type: "X".to_string(),
                target_type: "B".to_string(),
            }
        );
        // the requested target type must accept the arm's target
        let a = catalog.find("A").unwrap();
        let c = catalog.find("C").unwrap();
        assert!(dispatch.select(a, c).is_err());
        assert_eq!(dispatch.select(a, catalog.any()).unwrap().name, "MapToB");
    }

    #[test]
    fn null_source_follows_return_nullability() {
        let catalog = catalog();
        let any = catalog.any();
        let nullable = Dispatch::build(catalog.clone(), &entry(&catalog, true), candidates(&catalog));
        let result = nullable.invoke(Some(&Value::Null), any, |_, _| unreachable!());
        assert_eq!(result.unwrap(), None);

        let strict = Dispatch::build(catalog.clone(), &entry(&catalog, false), candidates(&catalog));
        let err = strict.invoke(None, any, |_, _| unreachable!()).unwrap_err();
        assert!(matches!(err, Error::UnresolvableDispatch { source_type, .. } if source_type == "null"));
    }

    #[test]
    fn invoke_short_circuits_on_first_arm() {
        let catalog = catalog();
        let dispatch = Dispatch::build(catalog.clone(), &entry(&catalog, false), candidates(&catalog));
        let a = catalog.find("A").unwrap();
        let b = catalog.find("B").unwrap();
        let source = Value::Object(ObjectValue::new(a));
        let mapped = dispatch
            .invoke(Some(&source), catalog.any(), |arm, _| {
                assert_eq!(arm.name, "MapToB");
                Ok(Value::object(b))
            })
            .unwrap();
        assert_eq!(mapped, Some(Value::object(b)));
    }

    #[test]
    fn display_lists_arms_and_fallback() {
        let catalog = catalog();
        let dispatch = Dispatch::build(catalog.clone(), &entry(&catalog, false), candidates(&catalog));
        assert_eq!(
            dispatch.to_string(),
            "Map(object source, targetType) -> object\n    A x when targetType.is_assignable_from(B) => MapToB(x)\n    _ => unresolvable"
        );
    }
}

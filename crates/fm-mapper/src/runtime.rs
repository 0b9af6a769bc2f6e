//! Executes resolved mappings over [`Value`]s.

use crate::descriptor::{MappingDescriptor, MappingHandle};
use crate::path::PropertyPath;
use crate::properties::{MemberConversion, PropertyMappingPlan};
use crate::registry::MappingRegistry;
use crate::resolve::{MapperOutcome, MappingBody};
use fm_core::{Error, Result, TypeCatalog, TypeId, TypeLookup, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Body supplied by the caller for a user-implemented mapping.
pub type MappingHandler = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Immutable, shareable executor for one resolved mapper.
#[derive(Clone)]
pub struct MappingRuntime {
    catalog: Arc<TypeCatalog>,
    registry: MappingRegistry,
    bodies: HashMap<MappingHandle, MappingBody>,
    handlers: HashMap<String, MappingHandler>,
}

impl fmt::Debug for MappingRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&String> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("MappingRuntime")
            .field("mappings", &self.registry.len())
            .field("handlers", &handlers)
            .finish()
    }
}

impl MappingRuntime {
    pub fn new(outcome: MapperOutcome) -> Self {
        Self {
            catalog: outcome.catalog,
            registry: outcome.registry,
            bodies: outcome.bodies,
            handlers: HashMap::new(),
        }
    }

    /// Supplies the body of the user-implemented mapping called `name`.
    pub fn with_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    fn descriptor(&self, name: &str) -> Result<&MappingDescriptor> {
        self.registry
            .by_name(name)
            .ok_or_else(|| Error::UnknownMapping(name.to_string()))
    }

    /// Runs the mapping called `name`, requesting its declared target type.
    pub fn map(&self, name: &str, source: &Value) -> Result<Value> {
        let descriptor = self.descriptor(name)?;
        self.execute(descriptor.handle, source, descriptor.target.id)
    }

    pub fn entry_point(&self, name: &str) -> Result<EntryPoint<'_>> {
        let descriptor = self.descriptor(name)?;
        Ok(EntryPoint {
            runtime: self,
            descriptor,
        })
    }

    fn execute(&self, handle: MappingHandle, source: &Value, requested: TypeId) -> Result<Value> {
        let descriptor = self
            .registry
            .get(handle)
            .ok_or_else(|| Error::UnknownMapping(handle.to_string()))?;
        let body = self
            .bodies
            .get(&handle)
            .ok_or_else(|| Error::UnknownMapping(descriptor.name.clone()))?;
        tracing::trace!(
            "{}: mapping {} value",
            descriptor.name,
            source.type_name(&self.catalog)
        );

        match body {
            MappingBody::Dispatch(dispatch) => {
                let mapped = dispatch.invoke(Some(source), requested, |arm, value| {
                    self.execute(arm.handle, value, arm.target)
                })?;
                Ok(mapped.unwrap_or(Value::Null))
            }
            _ if source.is_null() => {
                if descriptor.target.nullable {
                    return Ok(Value::Null);
                }
                Err(Error::Generic(format!(
                    "`{}` cannot map null to non-nullable `{}`",
                    descriptor.name,
                    self.catalog.display(descriptor.target)
                )))
            }
            MappingBody::Properties(plan) => self.apply_properties(descriptor, plan, source),
            MappingBody::Enum(plan) => plan.translate_value(source),
            MappingBody::Assign => Ok(source.clone()),
            MappingBody::UserImplemented => {
                let handler = self
                    .handlers
                    .get(&descriptor.name)
                    .ok_or_else(|| Error::MissingHandler(descriptor.name.clone()))?;
                let mapped = handler(source)?;
                if mapped.is_null() && !descriptor.target.nullable {
                    return Err(Error::Generic(format!(
                        "handler for `{}` returned null for non-nullable `{}`",
                        descriptor.name,
                        self.catalog.display(descriptor.target)
                    )));
                }
                Ok(mapped)
            }
        }
    }

    fn apply_properties(
        &self,
        descriptor: &MappingDescriptor,
        plan: &PropertyMappingPlan,
        source: &Value,
    ) -> Result<Value> {
        let mut result = Value::object(descriptor.target.id);
        for assignment in &plan.assignments {
            let value = match source.get_path(&assignment.source.names()) {
                None => continue,
                Some(Value::Null) if assignment.skip_null => continue,
                Some(Value::Null) => Value::Null,
                Some(value) => self.convert(&assignment.conversion, value)?,
            };
            write_path(&mut result, &assignment.target, value)?;
        }
        Ok(result)
    }

    fn convert(&self, conversion: &MemberConversion, value: &Value) -> Result<Value> {
        match conversion {
            MemberConversion::Direct => Ok(value.clone()),
            MemberConversion::Enum(plan) => plan.translate_value(value),
            MemberConversion::Nested(handle) => {
                let target = self
                    .registry
                    .get(*handle)
                    .ok_or_else(|| Error::UnknownMapping(handle.to_string()))?
                    .target
                    .id;
                self.execute(*handle, value, target)
            }
        }
    }
}

/// Stores `value` at `path`, creating intermediate objects typed after the
/// member they fill.
fn write_path(root: &mut Value, path: &PropertyPath, value: Value) -> Result<()> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(Error::EmptyPropertyPath(path.full_name()));
    };
    let mut current = root;
    for segment in parents {
        let Value::Object(object) = current else {
            return Err(Error::Generic(format!(
                "cannot write `{}`: `{}` is not an object",
                path, segment.name
            )));
        };
        let slot = object
            .fields
            .entry(segment.name.clone())
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::object(segment.ty.id);
        }
        current = slot;
    }
    let Value::Object(object) = current else {
        return Err(Error::Generic(format!(
            "cannot write `{}`: parent is not an object",
            path
        )));
    };
    object.fields.insert(last.name.clone(), value);
    Ok(())
}

/// A named mapping called with a caller-chosen target type.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint<'r> {
    runtime: &'r MappingRuntime,
    descriptor: &'r MappingDescriptor,
}

impl<'r> EntryPoint<'r> {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &MappingDescriptor {
        self.descriptor
    }

    /// Maps `source` to a value assignable to `requested`.
    ///
    /// `None` stands for a null source and, on success, for a null result of
    /// a nullable entry point.
    pub fn call(&self, source: Option<&Value>, requested: TypeId) -> Result<Option<Value>> {
        let runtime = self.runtime;
        let catalog = &runtime.catalog;
        let descriptor = self.descriptor;
        let body = runtime
            .bodies
            .get(&descriptor.handle)
            .ok_or_else(|| Error::UnknownMapping(descriptor.name.clone()))?;

        if let MappingBody::Dispatch(dispatch) = body {
            return dispatch.invoke(source, requested, |arm, value| {
                runtime.execute(arm.handle, value, arm.target)
            });
        }

        let source = source.filter(|value| !value.is_null());
        let unresolvable = || Error::UnresolvableDispatch {
            source_type: source
                .map(|value| value.type_name(catalog))
                .unwrap_or_else(|| "null".to_string()),
            target_type: catalog.name(requested).to_string(),
        };
        if !catalog.is_assignable_from(requested, descriptor.target.id) {
            return Err(unresolvable());
        }
        let Some(value) = source else {
            if descriptor.target.nullable {
                return Ok(None);
            }
            return Err(unresolvable());
        };
        match value.runtime_type(catalog) {
            Some(runtime_type) if catalog.is_assignable_from(descriptor.source.id, runtime_type) => {
                runtime
                    .execute(descriptor.handle, value, requested)
                    .map(non_null)
            }
            _ => Err(unresolvable()),
        }
    }
}

/// Null results surface as `None`, the same as a null source.
pub(crate) fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

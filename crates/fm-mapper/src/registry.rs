//! Catalog of the mappings declared or inferred for one mapper.

use crate::descriptor::{DerivedTypeAssociation, MappingDescriptor, MappingHandle};
use fm_core::{ensure, Error, Result, TypeId, TypeLookup, TypeRef};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    descriptors: Vec<MappingDescriptor>,
    by_handle: HashMap<MappingHandle, usize>,
    by_pair: HashMap<(TypeRef, TypeRef), usize>,
    by_name: HashMap<String, usize>,
    derived: HashMap<MappingHandle, Vec<DerivedTypeAssociation>>,
    next_handle: u32,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a handle for a descriptor that is about to be registered.
    pub fn allocate(&mut self) -> MappingHandle {
        let handle = MappingHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Position the next registered descriptor will take in declaration order.
    pub fn next_order(&self) -> usize {
        self.descriptors.len()
    }

    /// Adds a descriptor. A second descriptor for an identical
    /// `(source, target)` pair is rejected as ambiguous.
    pub fn register(
        &mut self,
        lookup: &dyn TypeLookup,
        descriptor: MappingDescriptor,
    ) -> Result<MappingHandle> {
        let pair = descriptor.pair();
        if let Some(existing) = self.by_pair.get(&pair) {
            return Err(Error::AmbiguousMapping {
                source_type: lookup.display(pair.0),
                target_type: lookup.display(pair.1),
                existing: self.descriptors[*existing].name.clone(),
            });
        }
        ensure!(
            !self.by_name.contains_key(&descriptor.name),
            "mapping name `{}` is declared more than once",
            descriptor.name
        );
        ensure!(
            !self.by_handle.contains_key(&descriptor.handle),
            "mapping handle {} is already registered",
            descriptor.handle
        );

        let index = self.descriptors.len();
        let handle = descriptor.handle;
        self.by_pair.insert(pair, index);
        self.by_name.insert(descriptor.name.clone(), index);
        self.by_handle.insert(handle, index);
        tracing::debug!(
            "registered mapping {} `{}`: {} -> {}",
            handle,
            descriptor.name,
            lookup.display(pair.0),
            lookup.display(pair.1)
        );
        self.descriptors.push(descriptor);
        Ok(handle)
    }

    /// Attaches derived-type associations to a registered entry point.
    ///
    /// The same source type may appear several times as long as the target
    /// types differ; every association is kept.
    pub fn register_derived(
        &mut self,
        lookup: &dyn TypeLookup,
        entry_point: MappingHandle,
        associations: Vec<DerivedTypeAssociation>,
    ) -> Result<()> {
        let Some(entry) = self.get(entry_point) else {
            return Err(Error::UnknownMapping(entry_point.to_string()));
        };
        let entry_name = entry.name.clone();

        let known = self.find_all_for_entry_point(entry_point);
        let mut accepted: Vec<DerivedTypeAssociation> = Vec::with_capacity(associations.len());
        for association in associations {
            let duplicate = known.iter().chain(accepted.iter()).any(|other| {
                other.source == association.source && other.target == association.target
            });
            if duplicate {
                return Err(Error::AmbiguousMapping {
                    source_type: lookup.name(association.source).to_string(),
                    target_type: lookup.name(association.target).to_string(),
                    existing: entry_name,
                });
            }
            accepted.push(association);
        }

        self.derived.entry(entry_point).or_default().extend(accepted);
        Ok(())
    }

    pub fn find_exact(&self, source: TypeRef, target: TypeRef) -> Option<&MappingDescriptor> {
        self.by_pair
            .get(&(source, target))
            .map(|index| &self.descriptors[*index])
    }

    /// Like [`Self::find_exact`] but tolerant of nullability: the non-nullable
    /// pair wins, otherwise the first registered variant.
    pub fn find_compatible(&self, source: TypeId, target: TypeId) -> Option<&MappingDescriptor> {
        self.find_exact(TypeRef::new(source), TypeRef::new(target))
            .or_else(|| {
                self.descriptors
                    .iter()
                    .find(|d| d.source.id == source && d.target.id == target && !d.is_runtime_target())
            })
    }

    pub fn find_all_for_entry_point(&self, entry_point: MappingHandle) -> &[DerivedTypeAssociation] {
        self.derived
            .get(&entry_point)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, handle: MappingHandle) -> Option<&MappingDescriptor> {
        self.by_handle.get(&handle).map(|index| &self.descriptors[*index])
    }

    pub fn by_name(&self, name: &str) -> Option<&MappingDescriptor> {
        self.by_name.get(name).map(|index| &self.descriptors[*index])
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MappingDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// `base`, or `base` with the smallest numeric suffix that is still free.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.by_name.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|suffix| format!("{}{}", base, suffix))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

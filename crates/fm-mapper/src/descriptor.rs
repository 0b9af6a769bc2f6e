use crate::declaration::MappingKind;
use fm_core::{TypeId, TypeRef};

/// Identifies a mapping function within one mapper.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display,
)]
#[display("m{_0}")]
pub struct MappingHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingOrigin {
    /// Written by the user.
    Declared,
    /// Synthesized for a nested member or a derived-type association.
    Inferred,
}

/// Signature of one mapping function. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDescriptor {
    pub handle: MappingHandle,
    pub name: String,
    pub source: TypeRef,
    pub target: TypeRef,
    pub kind: MappingKind,
    pub origin: MappingOrigin,
    /// Position in declaration order; only used to break ties.
    pub declaration_order: usize,
}

impl MappingDescriptor {
    pub fn nullable_source(&self) -> bool {
        self.source.nullable
    }

    pub fn nullable_target(&self) -> bool {
        self.target.nullable
    }

    pub fn pair(&self) -> (TypeRef, TypeRef) {
        (self.source, self.target)
    }

    pub fn is_runtime_target(&self) -> bool {
        self.kind == MappingKind::RuntimeTarget
    }

    pub fn is_declared(&self) -> bool {
        self.origin == MappingOrigin::Declared
    }
}

/// A `(derived source, derived target)` pair attached to a polymorphic entry
/// point, together with the mapping that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedTypeAssociation {
    pub source: TypeId,
    pub target: TypeId,
    pub handle: MappingHandle,
}

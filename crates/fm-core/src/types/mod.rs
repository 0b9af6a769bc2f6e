//! Type model shared by the source and target sides of a mapper.
//!
//! Both models live in one [`TypeCatalog`]; a mapping is just a pair of
//! [`TypeRef`]s into it.

mod catalog;
mod spec;

pub use catalog::{TypeCatalog, TypeCatalogBuilder, TypeLookup};
pub use spec::{CatalogSpec, EnumValueSpec, MemberSpec, TypeKindSpec, TypeSpec};

use serde::{Deserialize, Serialize};

/// Dense index of a type inside its catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("#{_0}")]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A use of a type together with its nullability annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    pub id: TypeId,
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(id: TypeId) -> Self {
        Self {
            id,
            nullable: false,
        }
    }

    pub fn nullable(id: TypeId) -> Self {
        Self { id, nullable: true }
    }

    pub fn non_nullable(self) -> Self {
        Self {
            id: self.id,
            nullable: false,
        }
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        Self {
            id: self.id,
            nullable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[default]
    Public,
    Internal,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub accessibility: Accessibility,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            accessibility: Accessibility::Public,
        }
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn is_public(&self) -> bool {
        self.accessibility == Accessibility::Public
    }

    pub fn is_nullable(&self) -> bool {
        self.ty.nullable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// The universal root; every type is assignable to it.
    Any,
    Primitive,
    Class,
    Enum(Vec<EnumMember>),
}

#[derive(Debug, Clone)]
pub struct TypeNode {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    /// Base types, nearest first. Never contains `Any`.
    pub bases: Vec<TypeId>,
    pub members: Vec<MemberDescriptor>,
}

impl TypeNode {
    pub fn base(&self) -> Option<TypeId> {
        self.bases.first().copied()
    }

    pub fn declared_member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn enum_members(&self) -> Option<&[EnumMember]> {
        match &self.kind {
            TypeKind::Enum(members) => Some(members),
            _ => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class)
    }

    pub fn is_any(&self) -> bool {
        matches!(self.kind, TypeKind::Any)
    }

    /// Value-like types (primitives and enums) cannot head a polymorphic entry point.
    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive | TypeKind::Enum(_))
    }
}

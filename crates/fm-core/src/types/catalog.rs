use super::{Accessibility, EnumMember, MemberDescriptor, TypeId, TypeKind, TypeNode, TypeRef};
use crate::error::{Error, Result};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Name of the universal root type seeded into every catalog.
pub const ANY_TYPE: &str = "object";
const BUILTIN_PRIMITIVES: [&str; 5] = ["bool", "int", "long", "double", "string"];

fn split_nullable(text: &str) -> (&str, bool) {
    let text = text.trim();
    match text.strip_suffix('?') {
        Some(name) => (name.trim_end(), true),
        None => (text, false),
    }
}

/// Read-only view of a type model used by the resolver and the dispatcher.
pub trait TypeLookup: Send + Sync {
    fn node(&self, id: TypeId) -> &TypeNode;

    fn find(&self, name: &str) -> Option<TypeId>;

    /// `true` when a value of type `source` can be stored in a slot of type `target`.
    fn is_assignable_from(&self, target: TypeId, source: TypeId) -> bool;

    fn require(&self, name: &str) -> Result<TypeId> {
        self.find(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Parses `Name` or `Name?` into a reference.
    fn parse_type_ref(&self, text: &str) -> Result<TypeRef> {
        let (name, nullable) = split_nullable(text);
        let id = self.require(name)?;
        Ok(TypeRef::new(id).with_nullable(nullable))
    }

    fn name(&self, id: TypeId) -> &str {
        &self.node(id).name
    }

    fn base_of(&self, id: TypeId) -> Option<TypeId> {
        self.node(id).base()
    }

    fn declared_member(&self, id: TypeId, name: &str) -> Option<&MemberDescriptor> {
        self.node(id).declared_member(name)
    }

    /// Looks up a member on `id`, falling back to its base chain.
    fn member_of(&self, id: TypeId, name: &str) -> Option<&MemberDescriptor> {
        let node = self.node(id);
        node.declared_member(name).or_else(|| {
            node.bases
                .iter()
                .find_map(|base| self.node(*base).declared_member(name))
        })
    }

    /// Declared and inherited members; a derived declaration hides a base one.
    fn members_of(&self, id: TypeId) -> Vec<&MemberDescriptor> {
        let node = self.node(id);
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        let chain = std::iter::once(id).chain(node.bases.iter().copied());
        for owner in chain {
            for member in &self.node(owner).members {
                if seen.insert(member.name.as_str()) {
                    members.push(member);
                }
            }
        }
        members
    }

    /// Number of hops to the universal root. The root itself has depth 0.
    fn depth(&self, id: TypeId) -> usize {
        let node = self.node(id);
        if node.is_any() {
            0
        } else {
            node.bases.len() + 1
        }
    }

    fn display(&self, ty: TypeRef) -> String {
        if ty.nullable {
            format!("{}?", self.name(ty.id))
        } else {
            self.name(ty.id).to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeCatalog {
    nodes: Vec<TypeNode>,
    by_name: HashMap<String, TypeId>,
    ancestors: Vec<HashSet<TypeId>>,
    any: TypeId,
}

impl TypeCatalog {
    pub fn builder() -> TypeCatalogBuilder {
        TypeCatalogBuilder::new()
    }

    pub fn any(&self) -> TypeId {
        self.any
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.iter()
    }

}

impl TypeLookup for TypeCatalog {
    fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    fn find(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    fn is_assignable_from(&self, target: TypeId, source: TypeId) -> bool {
        target == source || target == self.any || self.ancestors[source.index()].contains(&target)
    }
}

struct PendingType {
    name: String,
    kind: TypeKind,
    base: Option<String>,
}

struct PendingMember {
    owner: String,
    name: String,
    ty: String,
    accessibility: Accessibility,
}

/// Collects type declarations by name and links them in [`TypeCatalogBuilder::build`].
pub struct TypeCatalogBuilder {
    types: Vec<PendingType>,
    members: Vec<PendingMember>,
}

impl Default for TypeCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalogBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            types: Vec::new(),
            members: Vec::new(),
        };
        builder.push(ANY_TYPE, TypeKind::Any, None);
        for primitive in BUILTIN_PRIMITIVES {
            builder.push(primitive, TypeKind::Primitive, None);
        }
        builder
    }

    fn push(&mut self, name: &str, kind: TypeKind, base: Option<&str>) -> &mut Self {
        self.types.push(PendingType {
            name: name.to_string(),
            kind,
            base: base.map(str::to_string),
        });
        self
    }

    pub fn add_primitive(&mut self, name: &str) -> &mut Self {
        self.push(name, TypeKind::Primitive, None)
    }

    pub fn add_class(&mut self, name: &str, base: Option<&str>) -> &mut Self {
        self.push(name, TypeKind::Class, base)
    }

    pub fn add_enum<'a>(
        &mut self,
        name: &str,
        members: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> &mut Self {
        let members = members
            .into_iter()
            .map(|(member, value)| EnumMember::new(member, value))
            .collect();
        self.push(name, TypeKind::Enum(members), None)
    }

    /// Adds a public member. `ty` is a type name with an optional `?` suffix.
    pub fn add_member(&mut self, owner: &str, name: &str, ty: &str) -> &mut Self {
        self.add_member_with(owner, name, ty, Accessibility::Public)
    }

    pub fn add_member_with(
        &mut self,
        owner: &str,
        name: &str,
        ty: &str,
        accessibility: Accessibility,
    ) -> &mut Self {
        self.members.push(PendingMember {
            owner: owner.to_string(),
            name: name.to_string(),
            ty: ty.to_string(),
            accessibility,
        });
        self
    }

    pub fn build(self) -> Result<TypeCatalog> {
        let mut by_name = HashMap::new();
        for (index, pending) in self.types.iter().enumerate() {
            let id = TypeId(index as u32);
            if by_name.insert(pending.name.clone(), id).is_some() {
                return Err(Error::DuplicateType(pending.name.clone()));
            }
        }
        let any = by_name[ANY_TYPE];

        let lookup = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| Error::UnknownType(name.to_string()))
        };

        let mut direct_base = Vec::with_capacity(self.types.len());
        for pending in &self.types {
            let base = match pending.base.as_deref() {
                // Deriving from the universal root is the same as having no base.
                Some(ANY_TYPE) | None => None,
                Some(name) => Some(lookup(name)?),
            };
            direct_base.push(base);
        }

        let mut chains = Vec::with_capacity(self.types.len());
        for (index, pending) in self.types.iter().enumerate() {
            let mut chain = Vec::new();
            let mut cursor = direct_base[index];
            while let Some(base) = cursor {
                if base.index() == index || chain.contains(&base) {
                    return Err(Error::CyclicHierarchy {
                        type_name: pending.name.clone(),
                    });
                }
                chain.push(base);
                cursor = direct_base[base.index()];
            }
            chains.push(chain);
        }

        for pending in &self.types {
            if let TypeKind::Enum(values) = &pending.kind {
                if let Some(duplicate) = values.iter().map(|value| &value.name).duplicates().next() {
                    return Err(Error::DuplicateMember {
                        type_name: pending.name.clone(),
                        member: duplicate.clone(),
                    });
                }
            }
        }

        let mut nodes: Vec<TypeNode> = self
            .types
            .into_iter()
            .zip(chains)
            .enumerate()
            .map(|(index, (pending, bases))| TypeNode {
                id: TypeId(index as u32),
                name: pending.name,
                kind: pending.kind,
                bases,
                members: Vec::new(),
            })
            .collect();

        for member in self.members {
            let owner = lookup(&member.owner)?;
            let (name, nullable) = split_nullable(&member.ty);
            let ty = TypeRef::new(lookup(name)?).with_nullable(nullable);
            let node = &mut nodes[owner.index()];
            if node.declared_member(&member.name).is_some() {
                return Err(Error::DuplicateMember {
                    type_name: node.name.clone(),
                    member: member.name,
                });
            }
            node.members.push(
                MemberDescriptor::new(member.name, ty).with_accessibility(member.accessibility),
            );
        }

        let ancestors = nodes
            .iter()
            .map(|node| node.bases.iter().copied().collect::<HashSet<_>>())
            .collect();

        tracing::debug!("built type catalog with {} types", nodes.len());

        Ok(TypeCatalog {
            nodes,
            by_name,
            ancestors,
            any,
        })
    }
}

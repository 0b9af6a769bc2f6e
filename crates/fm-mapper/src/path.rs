//! Dotted member paths such as `Manufacturer.Name`.

use fm_core::{Error, Result, TypeId, TypeLookup, TypeRef};
use itertools::Itertools;
use std::fmt;

pub const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    /// Type the member was found on (after stripping nullability of the hop).
    pub container: TypeId,
    /// Declared type of the member.
    pub ty: TypeRef,
}

/// A member path resolved against a root type. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    root: TypeId,
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Resolves `path` segment by segment, starting at `root`.
    ///
    /// Each segment is looked up by exact name, including members inherited
    /// through the base chain. Intermediate members are traversed through
    /// their declared type with nullability stripped; whether a nullable hop
    /// was crossed is kept in [`PropertyPath::traverses_nullable`].
    pub fn resolve<S: AsRef<str>>(lookup: &dyn TypeLookup, root: TypeId, path: &[S]) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::EmptyPropertyPath(lookup.name(root).to_string()));
        }

        let mut segments = Vec::with_capacity(path.len());
        let mut container = root;
        for segment in path {
            let name = segment.as_ref();
            let member = lookup.member_of(container, name).ok_or_else(|| {
                Error::UnresolvedPathSegment {
                    segment: name.to_string(),
                    type_name: lookup.name(container).to_string(),
                    path: path.iter().map(|s| s.as_ref()).join("."),
                }
            })?;
            segments.push(PathSegment {
                name: name.to_string(),
                container,
                ty: member.ty,
            });
            container = member.ty.id;
        }

        Ok(Self { root, segments })
    }

    pub fn parse(lookup: &dyn TypeLookup, root: TypeId, dotted: &str) -> Result<Self> {
        let segments = split_path(dotted);
        Self::resolve(lookup, root, &segments)
    }

    pub fn root(&self) -> TypeId {
        self.root
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> &PathSegment {
        &self.segments[0]
    }

    pub fn last(&self) -> &PathSegment {
        &self.segments[self.segments.len() - 1]
    }

    /// Type of the member the path ends at.
    pub fn member_type(&self) -> TypeRef {
        self.last().ty
    }

    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn full_name(&self) -> String {
        self.segments.iter().map(|s| s.name.as_str()).join(".")
    }

    /// `true` if any member before the last one is nullable, so reading the
    /// path may yield null even when the last member is not nullable.
    pub fn traverses_nullable(&self) -> bool {
        self.segments[..self.segments.len() - 1]
            .iter()
            .any(|segment| segment.ty.nullable)
    }

    /// Whether reading this path may produce null.
    pub fn may_be_null(&self) -> bool {
        self.traverses_nullable() || self.member_type().nullable
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

pub fn split_path(dotted: &str) -> Vec<String> {
    dotted.split(PATH_SEPARATOR).map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_core::TypeCatalog;
    use pretty_assertions::assert_eq;

    fn catalog() -> TypeCatalog {
        let mut builder = TypeCatalog::builder();
        builder
            .add_class("Vehicle", None)
            .add_member("Vehicle", "Id", "int")
            .add_class("Car", Some("Vehicle"))
            .add_member("Car", "Manufacturer", "Manufacturer?")
            .add_class("Manufacturer", None)
            .add_member("Manufacturer", "Address", "Address")
            .add_member("Manufacturer", "Name", "string")
            .add_class("Address", None)
            .add_member("Address", "City", "string");
        builder.build().unwrap()
    }

    #[test]
    fn resolves_three_segment_path() {
        let catalog = catalog();
        let car = catalog.find("Car").unwrap();
        let path = PropertyPath::parse(&catalog, car, "Manufacturer.Address.City").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.full_name(), "Manufacturer.Address.City");
        assert_eq!(path.segments()[1].container, catalog.find("Manufacturer").unwrap());
        assert!(path.traverses_nullable());
        assert!(!path.member_type().nullable);
        assert!(path.may_be_null());
    }

    #[test]
    fn missing_segment_names_segment_and_container() {
        let catalog = catalog();
        let car = catalog.find("Car").unwrap();
        let err = PropertyPath::parse(&catalog, car, "Manufacturer.Address.Zip").unwrap_err();
        assert_eq!(
            err,
            Error::UnresolvedPathSegment {
                segment: "Zip".to_string(),
                type_name: "Address".to_string(),
                path: "Manufacturer.Address.Zip".to_string(),
            }
        );
    }

    #[test]
    fn inherited_members_resolve() {
        let catalog = catalog();
        let car = catalog.find("Car").unwrap();
        let path = PropertyPath::parse(&catalog, car, "Id").unwrap();
        assert_eq!(path.first().container, car);
        assert_eq!(catalog.name(path.member_type().id), "int");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = catalog();
        let car = catalog.find("Car").unwrap();
        assert!(PropertyPath::parse(&catalog, car, "manufacturer").is_err());
    }

    #[test]
    fn empty_path_is_rejected() {
        let catalog = catalog();
        let car = catalog.find("Car").unwrap();
        let empty: [&str; 0] = [];
        assert_eq!(
            PropertyPath::resolve(&catalog, car, &empty).unwrap_err(),
            Error::EmptyPropertyPath("Car".to_string())
        );
    }
}

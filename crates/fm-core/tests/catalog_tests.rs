// Type catalog construction and hierarchy queries

use fm_core::types::{CatalogSpec, EnumValueSpec, MemberSpec, TypeKindSpec, TypeSpec};
use fm_core::{Error, Result, TypeCatalog, TypeLookup, TypeRef};
use pretty_assertions::assert_eq;

fn hierarchy() -> Result<TypeCatalog> {
    let mut builder = TypeCatalog::builder();
    builder
        .add_class("Base1", None)
        .add_class("Base2", Some("Base1"))
        .add_class("A", Some("Base2"))
        .add_class("B", Some("Base1"))
        .add_class("C", None)
        .add_member("Base1", "Id", "int")
        .add_member("Base2", "Label", "string?")
        .add_member("A", "Id", "long");
    builder.build()
}

#[test]
fn base_chain_is_nearest_first() -> Result<()> {
    let catalog = hierarchy()?;
    let a = catalog.require("A")?;
    let names: Vec<&str> = catalog
        .node(a)
        .bases
        .iter()
        .map(|base| catalog.name(*base))
        .collect();
    assert_eq!(names, vec!["Base2", "Base1"]);
    assert_eq!(catalog.base_of(a), catalog.find("Base2"));
    Ok(())
}

#[test]
fn assignability_follows_ancestors_and_universal_root() -> Result<()> {
    let catalog = hierarchy()?;
    let (base1, base2, a, b, c) = (
        catalog.require("Base1")?,
        catalog.require("Base2")?,
        catalog.require("A")?,
        catalog.require("B")?,
        catalog.require("C")?,
    );
    assert!(catalog.is_assignable_from(base1, a));
    assert!(catalog.is_assignable_from(base2, a));
    assert!(catalog.is_assignable_from(a, a));
    assert!(!catalog.is_assignable_from(a, base1));
    assert!(!catalog.is_assignable_from(base2, b));
    assert!(!catalog.is_assignable_from(base1, c));
    assert!(catalog.is_assignable_from(catalog.any(), c));
    Ok(())
}

#[test]
fn depth_counts_hops_to_the_root() -> Result<()> {
    let catalog = hierarchy()?;
    assert_eq!(catalog.depth(catalog.any()), 0);
    assert_eq!(catalog.depth(catalog.require("Base1")?), 1);
    assert_eq!(catalog.depth(catalog.require("B")?), 2);
    assert_eq!(catalog.depth(catalog.require("A")?), 3);
    Ok(())
}

#[test]
fn members_are_inherited_and_shadowed() -> Result<()> {
    let catalog = hierarchy()?;
    let a = catalog.require("A")?;
    let label = catalog.member_of(a, "Label").expect("inherited member");
    assert!(label.is_nullable());
    let id = catalog.member_of(a, "Id").expect("own member");
    assert_eq!(catalog.name(id.ty.id), "long");

    let names: Vec<&str> = catalog
        .members_of(a)
        .iter()
        .map(|member| member.name.as_str())
        .collect();
    assert_eq!(names, vec!["Id", "Label"]);
    assert!(catalog.declared_member(a, "Label").is_none());
    Ok(())
}

#[test]
fn cyclic_bases_are_rejected() {
    let mut builder = TypeCatalog::builder();
    builder
        .add_class("X", Some("Y"))
        .add_class("Y", Some("Z"))
        .add_class("Z", Some("Y"));
    match builder.build() {
        Err(Error::CyclicHierarchy { .. }) => {}
        other => panic!("expected cyclic hierarchy error, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn duplicate_members_and_types_are_rejected() {
    let mut builder = TypeCatalog::builder();
    builder
        .add_class("Car", None)
        .add_member("Car", "Id", "int")
        .add_member("Car", "Id", "string");
    assert!(matches!(
        builder.build(),
        Err(Error::DuplicateMember { .. })
    ));

    let mut builder = TypeCatalog::builder();
    builder.add_class("Car", None).add_class("Car", None);
    assert!(matches!(builder.build(), Err(Error::DuplicateType(name)) if name == "Car"));

    let mut builder = TypeCatalog::builder();
    builder.add_enum("Color", [("Red", 0), ("Blue", 1), ("Red", 2)]);
    assert!(matches!(
        builder.build(),
        Err(Error::DuplicateMember { type_name, member }) if type_name == "Color" && member == "Red"
    ));
}

#[test]
fn unknown_member_type_is_reported() {
    let mut builder = TypeCatalog::builder();
    builder.add_class("Car", None).add_member("Car", "Engine", "Engine");
    assert!(matches!(builder.build(), Err(Error::UnknownType(name)) if name == "Engine"));
}

#[test]
fn nullable_type_refs_parse_with_suffix() -> Result<()> {
    let catalog = hierarchy()?;
    let c = catalog.require("C")?;
    assert_eq!(catalog.parse_type_ref("C?")?, TypeRef::nullable(c));
    assert_eq!(catalog.parse_type_ref(" C ")?, TypeRef::new(c));
    assert_eq!(catalog.display(TypeRef::nullable(c)), "C?");
    assert!(catalog.parse_type_ref("Missing?").is_err());
    Ok(())
}

#[test]
fn catalog_spec_assigns_implicit_enum_values() -> Result<()> {
    let spec = CatalogSpec {
        types: vec![
            TypeSpec {
                name: "Fuel".to_string(),
                kind: TypeKindSpec::Enum,
                base: None,
                members: vec![],
                values: vec![
                    EnumValueSpec {
                        name: "Petrol".to_string(),
                        value: None,
                    },
                    EnumValueSpec {
                        name: "Diesel".to_string(),
                        value: Some(10),
                    },
                    EnumValueSpec {
                        name: "Electric".to_string(),
                        value: None,
                    },
                ],
            },
            TypeSpec {
                name: "Car".to_string(),
                kind: TypeKindSpec::Class,
                base: None,
                members: vec![MemberSpec {
                    name: "Fuel".to_string(),
                    ty: "Fuel".to_string(),
                    accessibility: Default::default(),
                }],
                values: vec![],
            },
        ],
    };
    let catalog = spec.build()?;
    let fuel = catalog.node(catalog.require("Fuel")?);
    let values: Vec<(String, i64)> = fuel
        .enum_members()
        .unwrap_or_default()
        .iter()
        .map(|member| (member.name.clone(), member.value))
        .collect();
    assert_eq!(
        values,
        vec![
            ("Petrol".to_string(), 0),
            ("Diesel".to_string(), 10),
            ("Electric".to_string(), 11)
        ]
    );
    Ok(())
}

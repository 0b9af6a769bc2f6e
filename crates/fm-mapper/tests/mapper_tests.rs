// Generated mappings: property plans, nested mappings, enum strategies and error isolation

use fm_core::diagnostics::DiagnosticLevel;
use fm_core::value::ObjectValue;
use fm_core::{Error, Result, TypeCatalog, TypeLookup, Value};
use fm_mapper::{
    EnumMappingStrategy, Mapper, MapperDeclaration, MapperFile, MapperOptions, MapperOutcome,
    MappingBody, MappingDeclaration, MemberConversion, UnmappedEnumPolicy,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const CAR_MAPPER: &str = r#"
[[types]]
name = "CarColor"
kind = "enum"
values = [
    { name = "Black", value = 1 },
    { name = "Blue" },
    { name = "White" },
    { name = "Silver" },
    { name = "Red" },
]

[[types]]
name = "CarColorDto"
kind = "enum"
values = [
    { name = "Yellow", value = 1 },
    { name = "Red" },
    { name = "Blue" },
    { name = "Silver" },
    { name = "Black" },
]

[[types]]
name = "Manufacturer"
members = [
    { name = "Id", type = "int" },
    { name = "Name", type = "string" },
]

[[types]]
name = "ManufacturerDto"
members = [
    { name = "Id", type = "int" },
    { name = "Name", type = "string" },
]

[[types]]
name = "Car"
members = [
    { name = "Name", type = "string" },
    { name = "NumberOfSeats", type = "int" },
    { name = "Color", type = "CarColor" },
    { name = "Manufacturer", type = "Manufacturer?" },
    { name = "VendorCode", type = "string", accessibility = "internal" },
]

[[types]]
name = "CarDto"
members = [
    { name = "Name", type = "string" },
    { name = "NumberOfSeats", type = "int" },
    { name = "Color", type = "CarColorDto" },
    { name = "Producer", type = "ManufacturerDto?" },
]

[[mapper]]
name = "CarMapper"
enum_strategy = "by_name"

[[mapper.mappings]]
name = "MapCarToDto"
source = "Car"
target = "CarDto"
renames = [{ source = "Manufacturer", target = "Producer" }]
"#;

fn car_file() -> MapperFile {
    toml::from_str(CAR_MAPPER).expect("car mapper fixture parses")
}

fn car_catalog() -> Result<Arc<TypeCatalog>> {
    Ok(Arc::new(car_file().catalog_spec().build()?))
}

fn resolve(catalog: &Arc<TypeCatalog>, mapper: &MapperDeclaration) -> MapperOutcome {
    Mapper::new(catalog.clone(), MapperOptions::default()).resolve(mapper)
}

#[test]
fn car_mapper_renames_and_infers_nested_mapping() -> Result<()> {
    let catalog = car_catalog()?;
    let file = car_file();
    let outcome = resolve(&catalog, &file.mappers[0]);
    assert!(!outcome.has_errors(), "{:?}", outcome.all_diagnostics());

    let nested = outcome
        .descriptor("MapToManufacturerDto")
        .expect("inferred nested mapping");
    assert!(!nested.is_declared());

    let Some(MappingBody::Properties(plan)) = outcome.body("MapCarToDto") else {
        panic!("MapCarToDto should be a property mapping");
    };
    assert_eq!(
        plan.target_names(),
        vec!["Producer", "Name", "NumberOfSeats", "Color"]
    );
    assert!(matches!(
        plan.assignments[0].conversion,
        MemberConversion::Nested(handle) if handle == nested.handle
    ));
    assert!(matches!(plan.assignments[3].conversion, MemberConversion::Enum(_)));
    Ok(())
}

#[test]
fn car_mapper_reports_enum_gap_as_warning() -> Result<()> {
    let catalog = car_catalog()?;
    let outcome = resolve(&catalog, &car_file().mappers[0]);
    let warnings: Vec<String> = outcome
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Warning)
        .map(|diagnostic| diagnostic.message.clone())
        .collect();
    assert_eq!(
        warnings,
        vec!["enum member `CarColor.White` (3) has no counterpart in `CarColorDto`".to_string()]
    );
    Ok(())
}

#[test]
fn car_mapper_maps_json_objects() -> Result<()> {
    let catalog = car_catalog()?;
    let runtime = resolve(&catalog, &car_file().mappers[0]).into_runtime();
    let car = Value::from_json(
        &json!({
            "$type": "Car",
            "Name": "Model S",
            "NumberOfSeats": 5,
            "Color": "Red",
            "Manufacturer": { "Id": 7, "Name": "Tesla" },
        }),
        &catalog,
        None,
    )?;

    let dto = runtime.map("MapCarToDto", &car)?;
    assert_eq!(
        dto.to_json(&catalog),
        json!({
            "$type": "CarDto",
            "Name": "Model S",
            "NumberOfSeats": 5,
            "Color": "Red",
            "Producer": { "$type": "ManufacturerDto", "Id": 7, "Name": "Tesla" },
        })
    );
    Ok(())
}

#[test]
fn null_nested_object_maps_to_null() -> Result<()> {
    let catalog = car_catalog()?;
    let runtime = resolve(&catalog, &car_file().mappers[0]).into_runtime();
    let car = Value::from_json(
        &json!({ "$type": "Car", "Name": "Kit", "Manufacturer": null }),
        &catalog,
        None,
    )?;
    let dto = runtime.map("MapCarToDto", &car)?;
    assert_eq!(
        dto.to_json(&catalog),
        json!({ "$type": "CarDto", "Name": "Kit", "Producer": null })
    );
    Ok(())
}

#[test]
fn unmapped_enum_value_fails_at_translation_time() -> Result<()> {
    let catalog = car_catalog()?;
    let runtime = resolve(&catalog, &car_file().mappers[0]).into_runtime();
    let car = Value::from_json(
        &json!({ "$type": "Car", "Name": "Ghost", "Color": "White" }),
        &catalog,
        None,
    )?;
    let err = runtime.map("MapCarToDto", &car).unwrap_err();
    assert_eq!(
        err,
        Error::UnmappedEnumMember {
            enum_type: "CarColor".to_string(),
            member: "White".to_string(),
            value: 3,
            target_enum: "CarColorDto".to_string(),
        }
    );
    Ok(())
}

#[test]
fn strict_policy_fails_enum_declarations() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("ColorMapper")
        .with_enum_strategy(EnumMappingStrategy::ByName)
        .with_unmapped_enum_policy(UnmappedEnumPolicy::Error)
        .with_mapping(MappingDeclaration::new("MapColor", "CarColor", "CarColorDto"))
        .with_mapping(
            MappingDeclaration::new("MapColorByValue", "CarColorDto", "CarColor")
                .with_enum_strategy(EnumMappingStrategy::ByValue),
        );
    let outcome = resolve(&catalog, &mapper);

    assert!(matches!(
        outcome.failure("MapColor"),
        Some(Error::UnmappedEnumMember { member, .. }) if member == "White"
    ));
    assert!(outcome.failure("MapColorByValue").is_none());

    let runtime = outcome.into_runtime();
    let red_dto = Value::Enum {
        ty: catalog.require("CarColorDto")?,
        value: 2,
    };
    assert_eq!(
        runtime.map("MapColorByValue", &red_dto)?,
        Value::Enum {
            ty: catalog.require("CarColor")?,
            value: 2,
        }
    );
    Ok(())
}

#[test]
fn nested_rename_paths_create_intermediate_objects() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper").with_mapping(
        MappingDeclaration::new("MapCarToDto", "Car", "CarDto")
            .with_rename("Manufacturer.Id", "Producer.Id")
            .with_ignored_target("Color"),
    );
    let outcome = resolve(&catalog, &mapper);
    assert!(outcome.descriptor("MapToManufacturerDto").is_none());

    let runtime = outcome.into_runtime();
    let car = Value::from(
        ObjectValue::new(catalog.require("Car")?)
            .with_field("Name", "Roadster")
            .with_field(
                "Manufacturer",
                ObjectValue::new(catalog.require("Manufacturer")?)
                    .with_field("Id", Value::Int(3))
                    .with_field("Name", "Tesla"),
            ),
    );
    let dto = runtime.map("MapCarToDto", &car)?;
    assert_eq!(
        dto.to_json(&catalog),
        json!({
            "$type": "CarDto",
            "Name": "Roadster",
            "Producer": { "$type": "ManufacturerDto", "Id": 3 },
        })
    );

    let without_maker = Value::from(ObjectValue::new(catalog.require("Car")?).with_field("Name", "Kit"));
    let dto = runtime.map("MapCarToDto", &without_maker)?;
    assert_eq!(dto.to_json(&catalog), json!({ "$type": "CarDto", "Name": "Kit" }));
    Ok(())
}

#[test]
fn bad_path_fails_only_its_declaration() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper")
        .with_mapping(
            MappingDeclaration::new("MapBroken", "Car", "CarDto")
                .with_rename("Manufacturer.Code", "Producer.Id"),
        )
        .with_mapping(MappingDeclaration::new("MapMaker", "Manufacturer", "ManufacturerDto"));
    let outcome = resolve(&catalog, &mapper);

    assert_eq!(
        outcome.failure("MapBroken"),
        Some(&Error::UnresolvedPathSegment {
            segment: "Code".to_string(),
            type_name: "Manufacturer".to_string(),
            path: "Manufacturer.Code".to_string(),
        })
    );
    assert!(outcome.descriptor("MapBroken").is_none());
    assert!(matches!(
        outcome.body("MapMaker"),
        Some(MappingBody::Properties(_))
    ));
    Ok(())
}

#[test]
fn bad_ignore_paths_fail_only_their_declaration() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper")
        .with_mapping(
            MappingDeclaration::new("MapIgnoringSource", "Car", "CarDto")
                .with_ignored_source("Manufacturer.Code"),
        )
        .with_mapping(
            MappingDeclaration::new("MapIgnoringTarget", "Car?", "CarDto?")
                .with_ignored_target("Producer.Code"),
        )
        .with_mapping(MappingDeclaration::new("MapMaker", "Manufacturer", "ManufacturerDto"));
    let outcome = resolve(&catalog, &mapper);

    assert_eq!(
        outcome.failure("MapIgnoringSource"),
        Some(&Error::UnresolvedPathSegment {
            segment: "Code".to_string(),
            type_name: "Manufacturer".to_string(),
            path: "Manufacturer.Code".to_string(),
        })
    );
    assert_eq!(
        outcome.failure("MapIgnoringTarget"),
        Some(&Error::UnresolvedPathSegment {
            segment: "Code".to_string(),
            type_name: "ManufacturerDto".to_string(),
            path: "Producer.Code".to_string(),
        })
    );
    assert!(outcome.descriptor("MapIgnoringSource").is_none());
    assert!(outcome.failure("MapMaker").is_none());
    assert!(matches!(
        outcome.body("MapMaker"),
        Some(MappingBody::Properties(_))
    ));
    Ok(())
}

#[test]
fn ignored_source_member_is_not_matched_by_name() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper").with_mapping(
        MappingDeclaration::new("MapCarToDto", "Car", "CarDto")
            .with_rename("Manufacturer", "Producer")
            .with_ignored_source("Name"),
    );
    let outcome = resolve(&catalog, &mapper);
    assert!(!outcome.has_errors(), "{:?}", outcome.all_diagnostics());

    let Some(MappingBody::Properties(plan)) = outcome.body("MapCarToDto") else {
        panic!("MapCarToDto should be a property mapping");
    };
    assert_eq!(plan.target_names(), vec!["Producer", "NumberOfSeats", "Color"]);

    let unmapped_targets: Vec<&str> = outcome
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.code.as_deref() == Some("ferromap::unmapped_target_member"))
        .map(|diagnostic| diagnostic.message.as_str())
        .collect();
    assert_eq!(
        unmapped_targets,
        vec!["target member `Name` of `CarDto` is not mapped"]
    );
    assert!(!outcome
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.code.as_deref() == Some("ferromap::unmapped_source_member")));

    let car = Value::from(
        ObjectValue::new(catalog.require("Car")?)
            .with_field("Name", "Roadster")
            .with_field("NumberOfSeats", Value::Int(2)),
    );
    let dto = outcome.into_runtime().map("MapCarToDto", &car)?;
    assert_eq!(
        dto.to_json(&catalog),
        json!({ "$type": "CarDto", "NumberOfSeats": 2 })
    );
    Ok(())
}

#[test]
fn identical_pairs_are_ambiguous() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper")
        .with_mapping(MappingDeclaration::new("MapMaker", "Manufacturer", "ManufacturerDto"))
        .with_mapping(MappingDeclaration::new("MapMakerAgain", "Manufacturer", "ManufacturerDto"))
        .with_mapping(MappingDeclaration::new("MapMakerOrNull", "Manufacturer?", "ManufacturerDto?"));
    let outcome = resolve(&catalog, &mapper);

    assert_eq!(
        outcome.failure("MapMakerAgain"),
        Some(&Error::AmbiguousMapping {
            source_type: "Manufacturer".to_string(),
            target_type: "ManufacturerDto".to_string(),
            existing: "MapMaker".to_string(),
        })
    );
    assert!(outcome.failure("MapMakerOrNull").is_none());
    Ok(())
}

#[test]
fn unknown_types_and_internal_members() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper")
        .with_mapping(MappingDeclaration::new("MapTruck", "Truck", "CarDto"))
        .with_mapping(
            MappingDeclaration::new("MapVendor", "Car", "ManufacturerDto")
                .with_rename("VendorCode", "Name")
                .with_ignored_target("Id"),
        );
    let outcome = resolve(&catalog, &mapper);

    assert_eq!(
        outcome.failure("MapTruck"),
        Some(&Error::UnknownType("Truck".to_string()))
    );
    let Some(MappingBody::Properties(plan)) = outcome.body("MapVendor") else {
        panic!("MapVendor should be a property mapping");
    };
    assert_eq!(plan.target_names(), vec!["Name"]);
    Ok(())
}

#[test]
fn value_to_class_declarations_are_unsupported() -> Result<()> {
    let catalog = car_catalog()?;
    let mapper = MapperDeclaration::new("CarMapper")
        .with_mapping(MappingDeclaration::new("MapName", "string", "CarDto"));
    let outcome = resolve(&catalog, &mapper);
    assert!(matches!(
        outcome.failure("MapName"),
        Some(Error::UnsupportedSignature { mapping, .. }) if mapping == "MapName"
    ));
    Ok(())
}

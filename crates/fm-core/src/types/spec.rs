use super::{Accessibility, TypeCatalog, TypeCatalogBuilder};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Serializable description of a type model, as written in mapper files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpec {
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKindSpec {
    #[default]
    Class,
    Enum,
    Primitive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKindSpec,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
    #[serde(default)]
    pub values: Vec<EnumValueSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub accessibility: Accessibility,
}

/// An enum member; without an explicit value it takes the previous value plus one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueSpec {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
}

impl CatalogSpec {
    pub fn to_builder(&self) -> TypeCatalogBuilder {
        let mut builder = TypeCatalogBuilder::new();
        for ty in &self.types {
            match ty.kind {
                TypeKindSpec::Class => {
                    builder.add_class(&ty.name, ty.base.as_deref());
                }
                TypeKindSpec::Primitive => {
                    builder.add_primitive(&ty.name);
                }
                TypeKindSpec::Enum => {
                    let mut next = 0i64;
                    let values: Vec<(&str, i64)> = ty
                        .values
                        .iter()
                        .map(|value| {
                            let resolved = value.value.unwrap_or(next);
                            next = resolved + 1;
                            (value.name.as_str(), resolved)
                        })
                        .collect();
                    builder.add_enum(&ty.name, values);
                }
            }
            for member in &ty.members {
                builder.add_member_with(&ty.name, &member.name, &member.ty, member.accessibility);
            }
        }
        builder
    }

    pub fn build(&self) -> Result<TypeCatalog> {
        self.to_builder().build()
    }
}

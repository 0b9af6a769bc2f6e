//! Runtime values that mapping functions consume and produce.

use crate::error::{Error, Result};
use crate::types::{TypeCatalog, TypeId, TypeLookup, TypeRef};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use std::collections::BTreeMap;

const TYPE_TAG: &str = "$type";
const ENUM_TAG: &str = "$enum";

#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum Value {
    #[from(ignore)]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    #[from(ignore)]
    Enum { ty: TypeId, value: i64 },
    Object(ObjectValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub ty: TypeId,
    pub fields: BTreeMap<String, Value>,
}

impl ObjectValue {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl Value {
    pub fn object(ty: TypeId) -> Self {
        Value::Object(ObjectValue::new(ty))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.fields.get(name))
    }

    /// Follows `segments` through nested objects. A null or missing hop yields `None`.
    pub fn get_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        let mut current = self;
        for segment in segments {
            current = current.field(segment.as_ref())?;
        }
        Some(current)
    }

    /// The catalog type of this value; `None` for null.
    pub fn runtime_type(&self, catalog: &TypeCatalog) -> Option<TypeId> {
        match self {
            Value::Null => None,
            Value::Bool(_) => catalog.find("bool"),
            Value::Int(_) => catalog.find("int"),
            Value::Float(_) => catalog.find("double"),
            Value::Str(_) => catalog.find("string"),
            Value::Enum { ty, .. } => Some(*ty),
            Value::Object(object) => Some(object.ty),
        }
    }

    /// Name of the runtime type, as used in dispatch error messages.
    pub fn type_name(&self, catalog: &TypeCatalog) -> String {
        self.runtime_type(catalog)
            .map(|id| catalog.name(id).to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Reads a JSON document. Objects name their type with `"$type"` unless
    /// `expected` already pins it; enum values are member names or
    /// `{"$enum": "Type", "value": n}`.
    pub fn from_json(
        json: &JsonValue,
        catalog: &TypeCatalog,
        expected: Option<TypeRef>,
    ) -> Result<Value> {
        let expected_node = expected.map(|ty| catalog.node(ty.id));
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(value) => Ok(Value::Bool(*value)),
            JsonValue::Number(number) => match (number.as_i64(), expected_node) {
                (Some(value), Some(node)) if node.is_enum() => Ok(Value::Enum {
                    ty: node.id,
                    value,
                }),
                (Some(value), _) => Ok(Value::Int(value)),
                (None, _) => number
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| Error::Generic(format!("unsupported number {}", number))),
            },
            JsonValue::String(text) => match expected_node
                .and_then(|node| node.enum_members().map(|members| (node, members)))
            {
                Some((node, members)) => {
                    members
                        .iter()
                        .find(|member| member.name == *text)
                        .map(|member| Value::Enum {
                            ty: node.id,
                            value: member.value,
                        })
                        .ok_or_else(|| {
                            Error::Generic(format!("`{}` is not a member of `{}`", text, node.name))
                        })
                }
                None => Ok(Value::Str(text.clone())),
            },
            JsonValue::Object(map) => {
                if let Some(enum_name) = map.get(ENUM_TAG).and_then(JsonValue::as_str) {
                    let ty = catalog.require(enum_name)?;
                    let value = map
                        .get("value")
                        .and_then(JsonValue::as_i64)
                        .ok_or_else(|| {
                            Error::Generic(format!("enum value of `{}` must be an integer", enum_name))
                        })?;
                    return Ok(Value::Enum { ty, value });
                }
                let ty = match map.get(TYPE_TAG).and_then(JsonValue::as_str) {
                    Some(name) => catalog.require(name)?,
                    None => match expected {
                        Some(ty) => ty.id,
                        None => {
                            return Err(Error::Generic(format!(
                                "object without `{}` and no expected type",
                                TYPE_TAG
                            )))
                        }
                    },
                };
                let mut object = ObjectValue::new(ty);
                for (key, field) in map {
                    if key == TYPE_TAG {
                        continue;
                    }
                    let member_ty = catalog.member_of(ty, key).map(|member| member.ty);
                    let value = Value::from_json(field, catalog, member_ty)?;
                    object.fields.insert(key.clone(), value);
                }
                Ok(Value::Object(object))
            }
            JsonValue::Array(_) => Err(Error::Generic(
                "collections are not supported by the value model".to_string(),
            )),
        }
    }

    pub fn to_json(&self, catalog: &TypeCatalog) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(value) => JsonValue::Bool(*value),
            Value::Int(value) => JsonValue::Number((*value).into()),
            Value::Float(value) => JsonNumber::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Str(value) => JsonValue::String(value.clone()),
            Value::Enum { ty, value } => catalog
                .node(*ty)
                .enum_members()
                .and_then(|members| members.iter().find(|member| member.value == *value))
                .map(|member| JsonValue::String(member.name.clone()))
                .unwrap_or_else(|| JsonValue::Number((*value).into())),
            Value::Object(object) => {
                let mut map = JsonMap::new();
                map.insert(
                    TYPE_TAG.to_string(),
                    JsonValue::String(catalog.name(object.ty).to_string()),
                );
                for (key, field) in &object.fields {
                    map.insert(key.clone(), field.to_json(catalog));
                }
                JsonValue::Object(map)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

//! The type graph consumed by the generator.
//!
//! Types form a directed graph: arrays, maps and objects own their children
//! while user types are referenced by name through `DataType::User`, which is
//! what lets a user type refer to itself or to another user type that refers
//! back to it. Names resolve against the `Design` registry.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::design::validation::Validation;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Int,
    Int32,
    Int64,
    UInt,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
    Any,
}

impl PrimitiveKind {
    /// Design name of the kind, as written in design files.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt => "uint",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::Any => "any",
        }
    }

    /// Rust type used for the kind in generated code.
    pub fn rust_type(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "bool",
            PrimitiveKind::Int | PrimitiveKind::Int64 => "i64",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::UInt | PrimitiveKind::UInt64 => "u64",
            PrimitiveKind::UInt32 => "u32",
            PrimitiveKind::Float32 => "f32",
            PrimitiveKind::Float64 => "f64",
            PrimitiveKind::String => "String",
            PrimitiveKind::Bytes => "Vec<u8>",
            PrimitiveKind::Any => "serde_json::Value",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Kinds whose in-memory representation can be empty without being
    /// wrapped (byte buffers and arbitrary values).
    pub fn is_nilable(self) -> bool {
        matches!(self, PrimitiveKind::Bytes | PrimitiveKind::Any)
    }
}

/// A node of the type graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Primitive(PrimitiveKind),
    Array(Box<Attribute>),
    Map {
        key: Box<Attribute>,
        elem: Box<Attribute>,
    },
    Object(Object),
    /// Reference to a user type of the design, by name.
    User(String),
}

impl DataType {
    /// Short kind label used in diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            DataType::Primitive(kind) => kind.name().to_string(),
            DataType::Array(_) => "array".to_string(),
            DataType::Map { .. } => "map".to_string(),
            DataType::Object(_) => "object".to_string(),
            DataType::User(name) => format!("user type {name}"),
        }
    }
}

/// An attribute: a type plus the validations, default value and docs
/// attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            validation: None,
            default_value: None,
            description: None,
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(DataType::Primitive(kind))
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn int() -> Self {
        Self::primitive(PrimitiveKind::Int)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn array(elem: Attribute) -> Self {
        Self::new(DataType::Array(Box::new(elem)))
    }

    pub fn map(key: Attribute, elem: Attribute) -> Self {
        Self::new(DataType::Map {
            key: Box::new(key),
            elem: Box::new(elem),
        })
    }

    pub fn object(object: Object) -> Self {
        Self::new(DataType::Object(object))
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(DataType::User(name.into()))
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_default(mut self, value: JsonValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the given child attributes as required.
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let validation = self.validation.get_or_insert_with(Validation::default);
        validation.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether the child attribute `name` is listed as required.
    pub fn is_required(&self, name: &str) -> bool {
        self.validation
            .as_ref()
            .is_some_and(|v| v.required.iter().any(|r| r == name))
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}

/// An attribute together with its name inside an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedAttribute {
    pub name: String,
    #[serde(flatten)]
    pub attribute: Attribute,
}

/// Ordered set of named attributes.
///
/// Declaration order is kept: every walk over an object (validation, name
/// mapping, parameter extraction) visits attributes in this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Object {
    attributes: Vec<NamedAttribute>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the attribute `name`, keeping its original position
    /// when replacing.
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.attribute = attribute,
            None => self.attributes.push(NamedAttribute { name, attribute }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes
            .iter()
            .map(|a| (a.name.as_str(), &a.attribute))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Attribute)> for Object {
    fn from_iter<T: IntoIterator<Item = (S, Attribute)>>(iter: T) -> Self {
        let mut object = Object::new();
        for (name, attribute) in iter {
            object.insert(name, attribute);
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keeps_declaration_order() {
        let object = Object::new()
            .with("name", Attribute::string())
            .with("id", Attribute::int())
            .with("name", Attribute::boolean());

        let names: Vec<_> = object.names().collect();
        assert_eq!(names, vec!["name", "id"]);
        assert_eq!(object.get("name"), Some(&Attribute::boolean()));
    }

    #[test]
    fn test_required_names() {
        let attribute = Attribute::object(Object::new().with("id", Attribute::int()))
            .required(["id"]);

        assert!(attribute.is_required("id"));
        assert!(!attribute.is_required("name"));
    }

    #[test]
    fn test_attribute_from_json() {
        let attribute: Attribute = serde_json::from_value(serde_json::json!({
            "type": {"object": [
                {"name": "id", "type": {"primitive": "int"}},
                {"name": "tags", "type": {"array": {"type": {"primitive": "string"}}}},
                {"name": "owner", "type": {"user": "Account"}}
            ]},
            "validation": {"required": ["id"]}
        }))
        .unwrap();

        let DataType::Object(object) = &attribute.data_type else {
            panic!("expected an object");
        };
        assert_eq!(object.len(), 3);
        assert_eq!(
            object.get("owner").map(|a| &a.data_type),
            Some(&DataType::User("Account".to_string()))
        );
        assert!(attribute.is_required("id"));
    }

    #[test]
    fn test_primitive_kind_properties() {
        assert_eq!(PrimitiveKind::UInt32.name(), "uint32");
        assert_eq!(PrimitiveKind::Int.rust_type(), "i64");
        assert!(PrimitiveKind::Float32.is_numeric());
        assert!(!PrimitiveKind::String.is_numeric());
        assert!(PrimitiveKind::Bytes.is_nilable());
    }
}

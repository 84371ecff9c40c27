//! Mapped attributes: logical attribute names paired with the wire names
//! they are read from or written to.
//!
//! Object keys use the `name:wire` notation when the two differ, so
//! `full_name:name` declares the logical attribute `full_name` carried in the
//! wire field `name`.

use crate::design::Design;
use crate::design::types::{Attribute, DataType};

/// One attribute of a mapped object.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedField {
    /// Logical (service-side) name
    pub name: String,
    /// Wire name: path wildcard, query key, header or body field
    pub element: String,
    pub required: bool,
    pub attribute: Attribute,
}

/// Ordered walk over the fields of an object attribute with their wire
/// names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedAttribute {
    fields: Vec<MappedField>,
}

impl MappedAttribute {
    /// Maps the fields of `attribute`. Non-object attributes map to nothing.
    pub fn new(attribute: &Attribute, design: &Design) -> Self {
        let Some(object) = design.as_object(&attribute.data_type) else {
            return Self::default();
        };
        let required = design
            .effective_validation(attribute)
            .map(|v| v.required.as_slice())
            .unwrap_or_default();

        let fields = object
            .iter()
            .map(|(key, attribute)| {
                let (name, element) = split_key(key);
                MappedField {
                    name: name.to_string(),
                    element: element.to_string(),
                    required: required.iter().any(|r| r == key || r == name),
                    attribute: attribute.clone(),
                }
            })
            .collect();

        Self { fields }
    }

    pub fn from_type(data_type: &DataType, design: &Design) -> Self {
        Self::new(&Attribute::new(data_type.clone()), design)
    }

    /// Fields in declaration order.
    pub fn walk(&self) -> impl Iterator<Item = &MappedField> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&MappedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.required)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn require_all(&mut self) {
        for field in &mut self.fields {
            field.required = true;
        }
    }

    /// Keeps the fields matching `keep`, order preserved.
    pub fn restrict(&self, keep: impl Fn(&MappedField) -> bool) -> Self {
        Self {
            fields: self.fields.iter().filter(|f| keep(f)).cloned().collect(),
        }
    }

    /// Appends the fields of `other` not already present.
    pub fn extend(&mut self, other: MappedAttribute) {
        for field in other.fields {
            if self.get(&field.name).is_none() {
                self.fields.push(field);
            }
        }
    }
}

/// Splits a `name:wire` key. Keys without a wire part map to themselves.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once(':') {
        Some((name, element)) if !name.trim().is_empty() && !element.trim().is_empty() => {
            (name.trim(), element.trim())
        }
        _ => (key.trim(), key.trim()),
    }
}

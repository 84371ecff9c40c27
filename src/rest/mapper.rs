//! Logical to wire attribute name mapping.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::design::mapped::split_key;
use crate::design::types::DataType;
use crate::design::{Design, MappedAttribute};

/// Logical attribute names mapped to the wire fields carrying them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameMapping {
    /// Logical name to wire name
    pub fields: BTreeMap<String, String>,
    /// At least one wire name differs from its logical name
    pub renamed: bool,
}

impl NameMapping {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn wire_name(&self, logical: &str) -> Option<&str> {
        self.fields.get(logical).map(String::as_str)
    }
}

/// Maps the attributes of the wire object `wire` to the attributes of the
/// logical object `logical`, in wire declaration order.
///
/// Wire attributes without a logical counterpart are left out: code filling
/// them has to be written by hand. Non-object types map to nothing.
pub fn map_attributes(design: &Design, logical: &DataType, wire: &DataType) -> NameMapping {
    let Some(object) = design.as_object(logical) else {
        return NameMapping::default();
    };

    let mut mapping = NameMapping::default();
    for field in MappedAttribute::from_type(wire, design).walk() {
        if !object.names().any(|key| split_key(key).0 == field.name) {
            continue;
        }
        mapping.renamed |= field.name != field.element;
        mapping
            .fields
            .insert(field.name.clone(), field.element.clone());
    }
    mapping
}

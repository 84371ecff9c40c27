//! The API design consumed by the generator.
//!
//! A `Design` holds the user types of an API, keyed by name, and the services
//! exposing them over HTTP. Designs are usually built by an upstream DSL
//! evaluator; they can also be written by hand in YAML or JSON.

pub mod check;
pub mod http;
pub mod mapped;
pub mod types;
pub mod validation;
pub mod walk;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

pub use http::{Action, HttpError, HttpResponse, Route, Service, Tag};
pub use mapped::{MappedAttribute, MappedField};
pub use types::{Attribute, DataType, NamedAttribute, Object, PrimitiveKind};
pub use validation::{Format, Validation};

/// User types and services of an API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// User type definitions, keyed by type name
    #[serde(default)]
    pub types: BTreeMap<String, Attribute>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, name: impl Into<String>, definition: Attribute) -> Self {
        self.add_type(name, definition);
        self
    }

    pub fn add_type(&mut self, name: impl Into<String>, definition: Attribute) {
        self.types.insert(name.into(), definition);
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a design file, JSON when the extension says so, YAML otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Definition of the user type `name`.
    pub fn user_type(&self, name: &str) -> Result<&Attribute> {
        self.types
            .get(name)
            .ok_or_else(|| Error::UnknownUserType(name.to_string()))
    }

    /// Follows user type references down to a structural type.
    pub fn resolve<'a>(&'a self, data_type: &'a DataType) -> Result<&'a DataType> {
        let mut current = data_type;
        let mut seen = HashSet::new();
        while let DataType::User(name) = current {
            if !seen.insert(name.as_str()) {
                return Err(Error::design(format!(
                    "user type \"{name}\" is an alias of itself"
                )));
            }
            current = &self.user_type(name)?.data_type;
        }
        Ok(current)
    }

    pub fn as_object<'a>(&'a self, data_type: &'a DataType) -> Option<&'a Object> {
        match self.resolve(data_type) {
            Ok(DataType::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn as_array<'a>(&'a self, data_type: &'a DataType) -> Option<&'a Attribute> {
        match self.resolve(data_type) {
            Ok(DataType::Array(elem)) => Some(elem),
            _ => None,
        }
    }

    pub fn as_map<'a>(&'a self, data_type: &'a DataType) -> Option<(&'a Attribute, &'a Attribute)> {
        match self.resolve(data_type) {
            Ok(DataType::Map { key, elem }) => Some((key, elem)),
            _ => None,
        }
    }

    pub fn is_object(&self, data_type: &DataType) -> bool {
        self.as_object(data_type).is_some()
    }

    pub fn primitive_kind(&self, data_type: &DataType) -> Option<PrimitiveKind> {
        match self.resolve(data_type) {
            Ok(DataType::Primitive(kind)) => Some(*kind),
            _ => None,
        }
    }

    /// Validation applying to `attribute`: its own, or the one of the user
    /// type it references.
    pub fn effective_validation<'a>(&'a self, attribute: &'a Attribute) -> Option<&'a Validation> {
        if attribute.validation.is_some() {
            return attribute.validation.as_ref();
        }
        match &attribute.data_type {
            DataType::User(name) => self
                .types
                .get(name)
                .and_then(|definition| definition.validation.as_ref()),
            _ => None,
        }
    }

    pub fn service(&self, name: &str) -> Result<&Service> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::design(format!("unknown service \"{name}\"")))
    }

    /// Route path prefixed with the base paths of `service` and its
    /// ancestors.
    pub fn full_path(&self, service: &Service, route: &Route) -> Result<String> {
        let mut prefixes = vec![service.base_path.as_str()];
        let mut seen = HashSet::from([service.name.as_str()]);
        let mut parent = service.parent.as_deref();
        while let Some(name) = parent {
            if !seen.insert(name) {
                return Err(Error::design(format!(
                    "service \"{}\" has a cyclic parent chain",
                    service.name
                )));
            }
            let ancestor = self.service(name)?;
            prefixes.push(ancestor.base_path.as_str());
            parent = ancestor.parent.as_deref();
        }

        let prefix = prefixes
            .iter()
            .rev()
            .fold(String::new(), |acc, base| http::join_paths(&acc, base));
        Ok(http::join_paths(&prefix, &route.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_design() -> Design {
        Design::new()
            .with_type(
                "Account",
                Attribute::object(
                    Object::new()
                        .with("id", Attribute::int())
                        .with("parent", Attribute::user("Account")),
                ),
            )
            .with_type("AccountRef", Attribute::user("Account"))
    }

    #[test]
    fn test_resolve_follows_aliases() {
        let design = account_design();
        let account_ref = DataType::User("AccountRef".to_string());
        let resolved = design
            .resolve(&account_ref)
            .unwrap();
        assert!(matches!(resolved, DataType::Object(_)));
        assert!(design.is_object(&DataType::User("Account".to_string())));
    }

    #[test]
    fn test_resolve_unknown_user_type() {
        let design = Design::new();
        let err = design
            .resolve(&DataType::User("Missing".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownUserType(name) if name == "Missing"));
    }

    #[test]
    fn test_resolve_rejects_alias_cycle() {
        let design = Design::new()
            .with_type("A", Attribute::user("B"))
            .with_type("B", Attribute::user("A"));
        assert!(design.resolve(&DataType::User("A".to_string())).is_err());
    }

    #[test]
    fn test_effective_validation_falls_back_to_definition() {
        let design = Design::new().with_type(
            "Name",
            Attribute::string().with_validation(Validation::new().with_min_length(1)),
        );
        let name = Attribute::user("Name");
        let validation = design.effective_validation(&name).unwrap();
        assert_eq!(validation.min_length, Some(1));
    }

    #[test]
    fn test_full_path_includes_parent_base_paths() {
        let design = Design::new()
            .with_service(Service::new("orgs").with_base_path("/orgs/{org}"))
            .with_service(
                Service::new("repos")
                    .with_base_path("/repos/")
                    .with_parent("orgs"),
            );
        let service = design.service("repos").unwrap();
        let path = design
            .full_path(service, &Route::new("GET", "/{repo}"))
            .unwrap();
        assert_eq!(path, "/orgs/{org}/repos/{repo}");
    }

    #[test]
    fn test_design_from_yaml() {
        let design = Design::from_yaml_str(
            r#"
types:
  Account:
    type:
      object:
        - name: id
          type: {primitive: int}
    validation:
      required: [id]
services:
  - name: accounts
    base_path: /accounts
    actions:
      - name: show
        routes:
          - {method: get, path: "/{id}"}
        responses:
          - status: 200
"#,
        )
        .unwrap();

        assert!(design.user_type("Account").unwrap().is_required("id"));
        let service = design.service("accounts").unwrap();
        assert_eq!(service.actions[0].responses[0].status, 200);
    }
}

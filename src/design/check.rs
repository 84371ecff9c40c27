//! Pre-generation checks over a design.
//!
//! The binding builder and the validation synthesizer assume a well-formed
//! design. `validate_design` rejects the shapes they cannot handle before any
//! artifact is built:
//!
//! - **Unknown user types**: every `DataType::User` edge names a defined type
//! - **Validation compatibility**: patterns and formats on strings, ranges on
//!   numbers, lengths on strings, bytes, arrays and maps, required names on
//!   objects that declare them
//! - **Responses**: every action declares at least one response and no two
//!   responses share a status code
//! - **Params and headers**: primitives or arrays of primitives only
//! - **Tags**: the tag attribute exists on the action result
//! - **Path parameters**: payload attributes bound to route wildcards are
//!   required
//!
//! ## Examples
//!
//! ```
//! use httpgen::design::{Action, Design, HttpResponse, Service};
//! use httpgen::design::check::validate_design;
//!
//! let design = Design::new().with_service(
//!     Service::new("health").with_action(
//!         Action::new("ping")
//!             .with_route("GET", "/ping")
//!             .with_response(HttpResponse::new(204)),
//!     ),
//! );
//!
//! assert!(validate_design(&design).is_ok());
//! ```

use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::core::error::{Error, Result};
use crate::design::mapped::split_key;
use crate::design::types::{Attribute, DataType, PrimitiveKind};
use crate::design::walk::walk_attribute;
use crate::design::{Action, Design, MappedAttribute, Service};

/// Checks `design`, returning the first defect found.
pub fn validate_design(design: &Design) -> Result<()> {
    for (name, definition) in &design.types {
        check_attribute(design, definition, name)?;
    }

    for service in &design.services {
        if let Some(parent) = &service.parent {
            design.service(parent)?;
        }
        for action in &service.actions {
            check_action(design, service, action)?;
        }
    }

    Ok(())
}

fn check_action(design: &Design, service: &Service, action: &Action) -> Result<()> {
    let context = format!("{}.{}", service.name, action.name);

    if action.responses.is_empty() {
        return Err(Error::design(format!(
            "action \"{context}\" declares no response"
        )));
    }

    let mut statuses = HashSet::new();
    for response in &action.responses {
        if !statuses.insert(response.status) {
            return Err(Error::design(format!(
                "action \"{context}\" declares more than one response with status {}",
                response.status
            )));
        }
        if response.is_tagged() {
            let has_tag = action
                .result
                .as_ref()
                .and_then(|result| design.as_object(&result.data_type))
                .is_some_and(|object| {
                    object
                        .names()
                        .any(|key| split_key(key).0 == response.tag_name())
                });
            if !has_tag {
                return Err(Error::design(format!(
                    "action \"{context}\" tags a response with \"{}\" which is not a result attribute",
                    response.tag_name()
                )));
            }
        }
    }

    let mut attributes = Vec::new();
    attributes.extend(action.payload.iter().map(|a| ("payload", a)));
    attributes.extend(action.result.iter().map(|a| ("result", a)));
    attributes.extend(action.params.iter().map(|a| ("params", a)));
    attributes.extend(action.headers.iter().map(|a| ("headers", a)));
    attributes.extend(action.body.iter().map(|a| ("body", a)));
    for response in &action.responses {
        attributes.extend(response.headers.iter().map(|a| ("response headers", a)));
        attributes.extend(response.body.iter().map(|a| ("response body", a)));
    }
    for error in &action.errors {
        attributes.push(("error", &error.attribute));
        attributes.extend(error.response.headers.iter().map(|a| ("error headers", a)));
        attributes.extend(error.response.body.iter().map(|a| ("error body", a)));
    }
    for (label, attribute) in attributes {
        check_attribute(design, attribute, &format!("{context} {label}"))?;
    }

    check_scalars(design, &action.mapped_params(design), &context, "parameter")?;
    check_scalars(design, &action.mapped_headers(design), &context, "header")?;
    for response in &action.responses {
        check_scalars(design, &response.mapped_headers(design), &context, "header")?;
    }
    for error in &action.errors {
        check_scalars(design, &error.response.mapped_headers(design), &context, "header")?;
    }

    // wildcards are always present, so the payload cannot treat them as optional
    let payload = action
        .payload
        .as_ref()
        .map(|payload| MappedAttribute::new(payload, design))
        .unwrap_or_default();
    for param in action.path_params(design, service)?.walk() {
        if payload.get(&param.name).is_some_and(|field| !field.required) {
            return Err(Error::design(format!(
                "action \"{context}\" binds path parameter \"{}\" to the optional payload attribute \"{}\"",
                param.element, param.name
            )));
        }
    }

    Ok(())
}

fn check_scalars(
    design: &Design,
    mapped: &MappedAttribute,
    context: &str,
    what: &str,
) -> Result<()> {
    for field in mapped.walk() {
        let data_type = design.resolve(&field.attribute.data_type)?;
        let scalar = match data_type {
            DataType::Array(elem) => design.resolve(&elem.data_type)?,
            other => other,
        };
        if !matches!(scalar, DataType::Primitive(kind) if *kind != PrimitiveKind::Any) {
            return Err(Error::unsupported(
                format!("{what} \"{}\" of {context}", field.name),
                data_type.kind_name(),
            ));
        }
    }
    Ok(())
}

fn check_attribute(design: &Design, root: &Attribute, context: &str) -> Result<()> {
    let outcome = walk_attribute(design, root, context, &mut |path, attribute| {
        match check_validation(design, attribute, path) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => ControlFlow::Break(err),
        }
    });
    match outcome {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(err) => Err(err),
    }
}

fn check_validation(design: &Design, attribute: &Attribute, path: &str) -> Result<()> {
    let data_type = design.resolve(&attribute.data_type)?;
    let Some(validation) = &attribute.validation else {
        return Ok(());
    };
    let kind = match data_type {
        DataType::Primitive(kind) => Some(*kind),
        _ => None,
    };
    let reject = |constraint: &str| -> Result<()> {
        Err(Error::design(format!(
            "{constraint} validation on {path} which is of type {}",
            data_type.kind_name()
        )))
    };

    if validation.values.is_some() && kind.is_none() {
        return reject("enum");
    }
    if validation.format.is_some() && kind != Some(PrimitiveKind::String) {
        return reject("format");
    }
    if validation.pattern.is_some() && kind != Some(PrimitiveKind::String) {
        return reject("pattern");
    }
    if (validation.minimum.is_some() || validation.maximum.is_some())
        && !kind.is_some_and(PrimitiveKind::is_numeric)
    {
        return reject("range");
    }
    if validation.min_length.is_some() || validation.max_length.is_some() {
        let has_length = matches!(
            data_type,
            DataType::Array(_)
                | DataType::Map { .. }
                | DataType::Primitive(PrimitiveKind::String | PrimitiveKind::Bytes)
        );
        if !has_length {
            return reject("length");
        }
    }
    if !validation.required.is_empty() {
        let DataType::Object(object) = data_type else {
            return reject("required");
        };
        for required in &validation.required {
            let declared = object
                .names()
                .any(|key| key == required || split_key(key).0 == required);
            if !declared {
                return Err(Error::design(format!(
                    "{path} requires \"{required}\" which it does not declare"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::types::Object;
    use crate::design::{HttpResponse, Validation};

    fn service_with(action: Action) -> Design {
        Design::new().with_service(Service::new("accounts").with_action(action))
    }

    #[test]
    fn test_action_without_response_is_rejected() {
        let design = service_with(Action::new("show").with_route("GET", "/"));
        let err = validate_design(&design).unwrap_err();
        assert!(err.to_string().contains("declares no response"));
    }

    #[test]
    fn test_duplicate_status_is_rejected() {
        let design = service_with(
            Action::new("show")
                .with_response(HttpResponse::new(200))
                .with_response(HttpResponse::new(200)),
        );
        let err = validate_design(&design).unwrap_err();
        assert!(err.to_string().contains("status 200"));
    }

    #[test]
    fn test_unknown_user_type_is_rejected() {
        let design = Design::new().with_type(
            "Account",
            Attribute::object(Object::new().with("owner", Attribute::user("Owner"))),
        );
        let err = validate_design(&design).unwrap_err();
        assert!(matches!(err, Error::UnknownUserType(name) if name == "Owner"));
    }

    #[test]
    fn test_pattern_on_integer_is_rejected() {
        let design = Design::new().with_type(
            "Age",
            Attribute::int().with_validation(Validation::new().with_pattern("^[0-9]+$")),
        );
        let err = validate_design(&design).unwrap_err();
        assert!(err.to_string().contains("pattern validation on Age"));
    }

    #[test]
    fn test_required_name_must_exist() {
        let design = Design::new().with_type(
            "Account",
            Attribute::object(Object::new().with("id", Attribute::int())).required(["name"]),
        );
        assert!(validate_design(&design).is_err());
    }

    #[test]
    fn test_object_param_is_rejected() {
        let design = service_with(
            Action::new("list")
                .with_params(Attribute::object(Object::new().with(
                    "filter",
                    Attribute::object(Object::new().with("q", Attribute::string())),
                )))
                .with_response(HttpResponse::new(200)),
        );
        let err = validate_design(&design).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let design = service_with(
            Action::new("create")
                .with_result(Attribute::object(Object::new().with("id", Attribute::int())))
                .with_response(HttpResponse::new(201).with_tag("outcome", "created"))
                .with_response(HttpResponse::new(200)),
        );
        assert!(validate_design(&design).is_err());
    }

    #[test]
    fn test_tag_matches_logical_name() {
        let design = service_with(
            Action::new("create")
                .with_result(Attribute::object(
                    Object::new().with("state:State", Attribute::string()),
                ))
                .with_response(HttpResponse::new(202).with_tag("state", "pending"))
                .with_response(HttpResponse::new(200)),
        );
        assert!(validate_design(&design).is_ok());
    }

    #[test]
    fn test_optional_payload_path_param_is_rejected() {
        let design = service_with(
            Action::new("show")
                .with_route("GET", "/{id}")
                .with_payload(Attribute::object(Object::new().with("id", Attribute::int())))
                .with_params(
                    Attribute::object(Object::new().with("id", Attribute::int())).required(["id"]),
                )
                .with_response(HttpResponse::new(200)),
        );
        let err = validate_design(&design).unwrap_err();
        assert!(err.to_string().contains("optional payload attribute \"id\""));
    }

    #[test]
    fn test_valid_design_passes() {
        let design = Design::new()
            .with_type(
                "Account",
                Attribute::object(
                    Object::new()
                        .with(
                            "name",
                            Attribute::string()
                                .with_validation(Validation::new().with_min_length(1)),
                        )
                        .with("children", Attribute::array(Attribute::user("Account"))),
                )
                .required(["name"]),
            )
            .with_service(
                Service::new("accounts").with_action(
                    Action::new("show")
                        .with_route("GET", "/{id}")
                        .with_params(Attribute::object(Object::new().with("id", Attribute::int())))
                        .with_result(Attribute::user("Account"))
                        .with_response(HttpResponse::new(200)),
                ),
            );
        assert!(validate_design(&design).is_ok());
    }
}

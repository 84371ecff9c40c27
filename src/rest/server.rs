//! Binding data of the server side of an HTTP service.
//!
//! [`ServerBuilder`] derives, for every action of a service, the routes, the
//! request decoding plan, the response encoding plan and the error encoding
//! plan consumed by the server section templates.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::codegen::ValidationSynthesizer;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::templates::TemplateRegistry;
use crate::core::utils::{sanitize_rust_field_name, string_literal, to_proper_case, to_snake_case};
use crate::design::{
    Action, Attribute, Design, HttpError, HttpResponse, MappedAttribute, MappedField, Service,
};
use crate::rest::mapper::map_attributes;
use crate::rest::wire::{
    BodyType, Conversion, request_body_type, response_body_type, status_code_const,
    status_type_name, type_ref,
};

/// Server data of one service.
#[derive(Debug, Clone, Serialize)]
pub struct ServerData {
    pub service_name: String,
    /// Service name in type name form
    pub var_service_name: String,
    /// Name of the struct holding one handler per action
    pub handlers_struct: String,
    /// Name of the function building the handlers struct
    pub constructor: String,
    /// Name of the function mounting every handler on a muxer
    pub mount_handlers: String,
    pub action_data: Vec<ActionData>,
}

/// Server data of one action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionData {
    pub endpoint_name: String,
    /// Endpoint name in type name form
    pub var_endpoint_name: String,
    pub service_name: String,
    pub var_service_name: String,
    pub routes: Vec<RouteData>,
    pub mount_handler: String,
    /// Name of the function building the action handler
    pub constructor: String,
    pub decoder: String,
    pub encoder: String,
    pub error_encoder: String,
    /// Function encoding the errors of the action: its own error encoder or
    /// the runtime default
    pub encode_error: String,
    /// Request decoding plan, absent when the action takes no payload
    pub payload: Option<PayloadData>,
    /// Rust type of the result, absent when the action returns nothing
    pub result_type_name: Option<String>,
    /// Responses, the untagged one last
    pub responses: Vec<ResponseData>,
    pub http_errors: Vec<ErrorData>,
}

impl ActionData {
    pub fn has_responses(&self) -> bool {
        !self.responses.is_empty()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn has_errors(&self) -> bool {
        !self.http_errors.is_empty()
    }
}

/// A route: uppercased method and full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteData {
    pub method: String,
    pub path: String,
}

/// Request decoding plan.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadData {
    /// Name of the payload type in the service module
    pub name: String,
    /// Name of the payload constructor in the service module
    pub constructor: String,
    /// Rust type of the request body, absent when requests carry no body
    pub body_type_name: Option<String>,
    pub path_params: Vec<ParamData>,
    pub query_params: Vec<ParamData>,
    /// Path parameters then query parameters, in payload constructor
    /// argument order
    pub all_params: Vec<ParamData>,
    /// Request headers, passed to the constructor after the parameters
    pub headers: Vec<ParamData>,
    /// Validation code of the request body
    pub validate_body: String,
    /// Whether any decoded value gets validated
    pub validates: bool,
    /// Payload constructor arguments: the body, then the parameters, then
    /// the headers
    pub arguments: Vec<String>,
}

impl PayloadData {
    pub fn has_params(&self) -> bool {
        !self.all_params.is_empty()
    }
}

/// A value read from the path, the query string or a request header.
#[derive(Debug, Clone, Serialize)]
pub struct ParamData {
    /// Wire name
    pub name: String,
    /// Rust variable holding the decoded value
    pub var_name: String,
    /// Request accessor reading the raw value
    pub accessor: &'static str,
    /// Where the value comes from, as reported in errors
    pub location: &'static str,
    pub required: bool,
    /// Decoded into an `Option`
    pub optional: bool,
    pub rust_type: String,
    pub scalar_type: &'static str,
    pub is_array: bool,
    pub type_label: &'static str,
    /// Rust expression of the default value
    pub default_value: Option<String>,
    pub validate: String,
    #[serde(skip)]
    pub conversion: Conversion,
}

/// A response header written from a result attribute.
#[derive(Debug, Clone, Serialize)]
pub struct HeaderData {
    /// Wire name
    pub name: String,
    /// Result field holding the value
    pub field_name: String,
    /// The result field is an `Option`
    pub optional: bool,
    pub scalar_type: &'static str,
    pub is_array: bool,
    #[serde(skip)]
    pub conversion: Conversion,
}

/// Response encoding plan.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseData {
    #[serde(skip)]
    pub body: Option<BodyType>,
    /// Rust type of the body, absent when the response has none
    pub body_type_name: Option<String>,
    /// `StatusCode` associated constant
    pub status_code: &'static str,
    pub headers: Vec<HeaderData>,
    /// Name of the result attribute selecting this response
    pub tag_name: String,
    pub tag_value: String,
    /// Rust condition testing the tag on the result `t`
    pub tag_condition: Option<String>,
    /// Result field to body field names, when the body is built field by
    /// field
    pub result_to_body: Option<BTreeMap<String, String>>,
}

/// Error encoding plan.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub name: String,
    /// Rust type of the error
    pub type_ref: String,
    pub response: ResponseData,
}

/// Where a request value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Path,
    Query,
    Header,
}

impl Source {
    fn accessor(self) -> &'static str {
        match self {
            Source::Path => "path_param",
            Source::Query => "query_param",
            Source::Header => "header",
        }
    }

    fn location(self) -> &'static str {
        match self {
            Source::Path => "path parameter",
            Source::Query => "query string",
            Source::Header => "header",
        }
    }
}

/// Builds [`ServerData`] for the services of one design.
pub struct ServerBuilder<'a> {
    design: &'a Design,
    config: &'a Config,
    synthesizer: ValidationSynthesizer<'a>,
}

impl<'a> ServerBuilder<'a> {
    pub fn new(design: &'a Design, templates: &'a TemplateRegistry, config: &'a Config) -> Self {
        Self {
            design,
            config,
            synthesizer: ValidationSynthesizer::new(design, templates, config),
        }
    }

    /// Server data of `service`.
    pub fn build_server_data(&self, service: &Service) -> Result<ServerData> {
        let var_service_name = to_proper_case(&service.name);
        let snake = to_snake_case(&service.name);

        let action_data = service
            .actions
            .iter()
            .map(|action| self.build_action_data(service, action))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            service = %service.name,
            actions = action_data.len(),
            "Built server data"
        );
        Ok(ServerData {
            service_name: service.name.clone(),
            handlers_struct: format!("{var_service_name}Handlers"),
            constructor: format!("new_{snake}_handlers"),
            mount_handlers: format!("mount_{snake}_handlers"),
            var_service_name,
            action_data,
        })
    }

    fn build_action_data(&self, service: &Service, action: &Action) -> Result<ActionData> {
        let service_snake = to_snake_case(&service.name);
        let action_snake = to_snake_case(&action.name);
        let suffix = format!("{action_snake}_{service_snake}");

        let routes = action
            .routes
            .iter()
            .map(|route| {
                Ok(RouteData {
                    method: route.method.to_uppercase(),
                    path: self.design.full_path(service, route)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut responses = Vec::new();
        for response in order_responses(&action.responses) {
            responses.push(self.build_response_data(service, action, response)?);
        }
        if responses.len() < action.responses.len() {
            debug!(
                service = %service.name,
                action = %action.name,
                dropped = action.responses.len() - responses.len(),
                "Dropped duplicate untagged responses"
            );
        }

        let http_errors = action
            .errors
            .iter()
            .map(|error| self.build_error_data(service, action, error))
            .collect::<Result<Vec<_>>>()?;

        let payload = match &action.payload {
            Some(_) => Some(self.build_payload_data(service, action)?),
            None => None,
        };

        let result_type_name = action
            .result
            .as_ref()
            .map(|result| type_ref(&result.data_type, Some(&self.config.service_module)));

        debug!(
            service = %service.name,
            action = %action.name,
            routes = routes.len(),
            responses = responses.len(),
            errors = http_errors.len(),
            "Built action data"
        );
        Ok(ActionData {
            endpoint_name: action.name.clone(),
            var_endpoint_name: to_proper_case(&action.name),
            service_name: service.name.clone(),
            var_service_name: to_proper_case(&service.name),
            routes,
            mount_handler: format!("mount_{suffix}_handler"),
            constructor: format!("new_{suffix}_handler"),
            decoder: format!("decode_{suffix}_request"),
            encoder: format!("encode_{suffix}_response"),
            error_encoder: format!("encode_{suffix}_error"),
            encode_error: if action.errors.is_empty() {
                format!("{}::encode_error", self.config.runtime_module)
            } else {
                format!("encode_{suffix}_error")
            },
            payload,
            result_type_name,
            responses,
            http_errors,
        })
    }

    fn build_payload_data(&self, service: &Service, action: &Action) -> Result<PayloadData> {
        let var_action = to_proper_case(&action.name);
        let var_service = to_proper_case(&service.name);
        let body_name = format!("{var_service}{var_action}RequestBody");

        let body = request_body_type(self.design, action, &body_name);
        let validate_body = match &body {
            Some(body) => self.synthesizer.recursive_validation_code(
                &body.attribute(self.design),
                true,
                true,
                "body",
            )?,
            None => String::new(),
        };

        let path = action.path_params(self.design, service)?;
        let path_params = self.extract_params(&path, Source::Path)?;
        let query_params =
            self.extract_params(&action.query_params(self.design, service)?, Source::Query)?;
        let all_params = action
            .all_params(self.design, service)?
            .walk()
            .map(|field| {
                let source = if path.get(&field.name).is_some() {
                    Source::Path
                } else {
                    Source::Query
                };
                self.param_data(field, source)
            })
            .collect::<Result<Vec<_>>>()?;
        let headers = self.extract_params(&action.mapped_headers(self.design), Source::Header)?;

        let validates = !validate_body.is_empty()
            || all_params
                .iter()
                .chain(&headers)
                .any(|p| !p.validate.is_empty());
        let arguments = body
            .iter()
            .map(|_| "body".to_string())
            .chain(all_params.iter().chain(&headers).map(|p| p.var_name.clone()))
            .collect();

        Ok(PayloadData {
            name: format!("{var_action}{var_service}Payload"),
            constructor: format!(
                "new_{}_{}_payload",
                to_snake_case(&action.name),
                to_snake_case(&service.name)
            ),
            body_type_name: body
                .as_ref()
                .map(|body| body.type_name(&self.config.service_module)),
            path_params,
            query_params,
            all_params,
            headers,
            validate_body,
            validates,
            arguments,
        })
    }

    fn build_response_data(
        &self,
        service: &Service,
        action: &Action,
        response: &HttpResponse,
    ) -> Result<ResponseData> {
        let mut name = format!(
            "{}{}",
            to_proper_case(&service.name),
            to_proper_case(&action.name)
        );
        if action.responses.len() > 1 {
            name.push_str(&status_type_name(response.status)?);
        }
        name.push_str("ResponseBody");

        self.response_data(action.result.as_ref(), response, &name)
    }

    fn build_error_data(
        &self,
        service: &Service,
        action: &Action,
        error: &HttpError,
    ) -> Result<ErrorData> {
        let name = format!(
            "{}{}{}Response",
            to_proper_case(&service.name),
            to_proper_case(&action.name),
            status_type_name(error.response.status)?
        );

        Ok(ErrorData {
            name: error.name.clone(),
            type_ref: type_ref(
                &error.attribute.data_type,
                Some(&self.config.service_module),
            ),
            response: self.response_data(Some(&error.attribute), &error.response, &name)?,
        })
    }

    /// Encoding plan of `response` for values of type `source`.
    fn response_data(
        &self,
        source: Option<&Attribute>,
        response: &HttpResponse,
        body_name: &str,
    ) -> Result<ResponseData> {
        let body = response_body_type(self.design, source, response, body_name);

        let result_to_body = match (source, &body) {
            (Some(source), Some(body)) if body.as_object(self.design).is_some() => {
                let mapping = map_attributes(self.design, &source.data_type, body.data_type());
                match body {
                    // serde carries the wire names of design types
                    BodyType::Design(data_type) if *data_type == source.data_type => None,
                    // fields of design types are named after logical names
                    BodyType::Design(_) if mapping.renamed => Some(
                        mapping
                            .fields
                            .into_keys()
                            .map(|name| (name.clone(), name))
                            .collect(),
                    ),
                    _ => Some(mapping.fields),
                }
            }
            _ => None,
        };

        let tag_condition = match (&response.tag, source) {
            (Some(tag), Some(source)) if !tag.name.is_empty() => {
                let field = sanitize_rust_field_name(&tag.name);
                let value = string_literal(&tag.value);
                let held_by_value =
                    MappedAttribute::new(source, self.design).is_required(&tag.name);
                Some(if held_by_value {
                    format!("t.{field} == {value}")
                } else {
                    format!("t.{field}.as_deref() == Some({value})")
                })
            }
            _ => None,
        };

        Ok(ResponseData {
            body_type_name: body
                .as_ref()
                .map(|body| body.type_name(&self.config.service_module)),
            body,
            status_code: status_code_const(response.status)?,
            headers: self.extract_headers(&response.mapped_headers(self.design))?,
            tag_name: response.tag_name().to_string(),
            tag_value: response.tag_value().to_string(),
            tag_condition,
            result_to_body,
        })
    }

    fn extract_params(&self, mapped: &MappedAttribute, source: Source) -> Result<Vec<ParamData>> {
        mapped
            .walk()
            .map(|field| self.param_data(field, source))
            .collect()
    }

    fn param_data(&self, field: &MappedField, source: Source) -> Result<ParamData> {
        let context = format!("{} \"{}\"", source.location(), field.element);
        let conversion = Conversion::for_type(self.design, &field.attribute.data_type, &context)?;
        let var_name = sanitize_rust_field_name(&field.name);

        let default_value = match &field.attribute.default_value {
            Some(value) => Some(conversion.default_literal(value).ok_or_else(|| {
                Error::design(format!("default value of {context} does not match its type"))
            })?),
            None => None,
        };
        // required values are unwrapped by the decoder before validation
        let validate = self.synthesizer.validation_code(
            &field.attribute,
            field.required,
            true,
            &var_name,
            &field.element,
        )?;

        Ok(ParamData {
            name: field.element.clone(),
            var_name,
            accessor: source.accessor(),
            location: source.location(),
            required: field.required,
            optional: !field.required && default_value.is_none(),
            rust_type: conversion.rust_type(),
            scalar_type: conversion.scalar_type(),
            is_array: conversion.is_array(),
            type_label: conversion.label(),
            default_value,
            validate,
            conversion,
        })
    }

    fn extract_headers(&self, mapped: &MappedAttribute) -> Result<Vec<HeaderData>> {
        mapped
            .walk()
            .map(|field| {
                let context = format!("response header \"{}\"", field.element);
                let conversion =
                    Conversion::for_type(self.design, &field.attribute.data_type, &context)?;
                Ok(HeaderData {
                    name: field.element.clone(),
                    field_name: sanitize_rust_field_name(&field.name),
                    optional: !field.required && !field.attribute.has_default(),
                    scalar_type: conversion.scalar_type(),
                    is_array: conversion.is_array(),
                    conversion,
                })
            })
            .collect()
    }
}

/// Responses in encoding order.
///
/// Only the first untagged response is kept; it is moved last so that a
/// chain of tag tests falls through to it.
pub fn order_responses(responses: &[HttpResponse]) -> Vec<&HttpResponse> {
    let mut ordered = Vec::with_capacity(responses.len());
    let mut untagged = None;
    for response in responses {
        if !response.is_tagged() {
            if untagged.is_some() {
                continue;
            }
            untagged = Some(ordered.len());
        }
        ordered.push(response);
    }
    if let Some(index) = untagged {
        let last = ordered.len() - 1;
        ordered.swap(index, last);
    }
    ordered
}

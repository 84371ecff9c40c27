//! Wire-level helpers for the HTTP transport: body types, status codes,
//! parameter conversions and Rust type references.

use serde::Serialize;

use crate::core::error::{Error, Result};
use crate::core::utils::{float_literal, string_literal, to_proper_case};
use crate::design::mapped::split_key;
use crate::design::types::{Attribute, DataType, Object, PrimitiveKind};
use crate::design::{Action, Design, HttpResponse, MappedAttribute};

/// Type of an HTTP request or response body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyType {
    /// A design type used as is
    Design(DataType),
    /// A type made of the attributes left once the ones bound to params or
    /// headers are removed
    Synthesized { name: String, attribute: Attribute },
}

impl BodyType {
    pub fn data_type(&self) -> &DataType {
        match self {
            BodyType::Design(data_type) => data_type,
            BodyType::Synthesized { attribute, .. } => &attribute.data_type,
        }
    }

    /// The body as an attribute, validations included.
    pub fn attribute(&self, design: &Design) -> Attribute {
        match self {
            BodyType::Design(DataType::User(name)) => design
                .types
                .get(name)
                .cloned()
                .unwrap_or_else(|| Attribute::user(name.clone())),
            BodyType::Design(data_type) => Attribute::new(data_type.clone()),
            BodyType::Synthesized { attribute, .. } => attribute.clone(),
        }
    }

    /// Rust type of the body as seen from transport code.
    pub fn type_name(&self, service_module: &str) -> String {
        match self {
            BodyType::Design(data_type) => type_ref(data_type, Some(service_module)),
            BodyType::Synthesized { name, .. } => name.clone(),
        }
    }

    pub fn as_object<'a>(&'a self, design: &'a Design) -> Option<&'a Object> {
        design.as_object(self.data_type())
    }
}

/// Body of the requests sent to `action`.
///
/// An explicit body wins. Otherwise the body carries the payload attributes
/// not bound to path or query parameters or headers: the payload type itself
/// when nothing is bound, a type named `name` otherwise.
pub fn request_body_type(design: &Design, action: &Action, name: &str) -> Option<BodyType> {
    if let Some(body) = &action.body {
        return Some(explicit_body(body, name));
    }
    let payload = action.payload.as_ref()?;
    let mut bound = action.mapped_params(design);
    bound.extend(action.mapped_headers(design));
    remaining_body(design, payload, &bound, name)
}

/// Body of the response `response` of an action returning `result`.
pub fn response_body_type(
    design: &Design,
    result: Option<&Attribute>,
    response: &HttpResponse,
    name: &str,
) -> Option<BodyType> {
    if let Some(body) = &response.body {
        return Some(explicit_body(body, name));
    }
    let result = result?;
    remaining_body(design, result, &response.mapped_headers(design), name)
}

fn explicit_body(body: &Attribute, name: &str) -> BodyType {
    match &body.data_type {
        DataType::Object(_) => BodyType::Synthesized {
            name: name.to_string(),
            attribute: body.clone(),
        },
        data_type => BodyType::Design(data_type.clone()),
    }
}

fn remaining_body(
    design: &Design,
    attribute: &Attribute,
    bound: &MappedAttribute,
    name: &str,
) -> Option<BodyType> {
    let Some(object) = design.as_object(&attribute.data_type) else {
        return Some(BodyType::Design(attribute.data_type.clone()));
    };

    let remaining: Object = object
        .iter()
        .filter(|(key, _)| bound.get(split_key(key).0).is_none())
        .map(|(key, child)| (key.to_string(), child.clone()))
        .collect();
    if remaining.is_empty() {
        return None;
    }
    if remaining.len() == object.len() && matches!(attribute.data_type, DataType::User(_)) {
        return Some(BodyType::Design(attribute.data_type.clone()));
    }

    let required: Vec<String> = design
        .effective_validation(attribute)
        .map(|v| {
            v.required
                .iter()
                .filter(|r| {
                    remaining
                        .names()
                        .any(|key| key == r.as_str() || split_key(key).0 == r.as_str())
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let mut body = Attribute::object(remaining);
    if !required.is_empty() {
        body = body.required(required);
    }
    Some(BodyType::Synthesized {
        name: name.to_string(),
        attribute: body,
    })
}

/// Code, associated constant name and reason phrase of the standard HTTP
/// status codes.
const STATUS_CODES: &[(u16, &str, &str)] = &[
    (100, "CONTINUE", "Continue"),
    (101, "SWITCHING_PROTOCOLS", "Switching Protocols"),
    (102, "PROCESSING", "Processing"),
    (200, "OK", "OK"),
    (201, "CREATED", "Created"),
    (202, "ACCEPTED", "Accepted"),
    (203, "NON_AUTHORITATIVE_INFORMATION", "Non-Authoritative Information"),
    (204, "NO_CONTENT", "No Content"),
    (205, "RESET_CONTENT", "Reset Content"),
    (206, "PARTIAL_CONTENT", "Partial Content"),
    (207, "MULTI_STATUS", "Multi-Status"),
    (208, "ALREADY_REPORTED", "Already Reported"),
    (226, "IM_USED", "IM Used"),
    (300, "MULTIPLE_CHOICES", "Multiple Choices"),
    (301, "MOVED_PERMANENTLY", "Moved Permanently"),
    (302, "FOUND", "Found"),
    (303, "SEE_OTHER", "See Other"),
    (304, "NOT_MODIFIED", "Not Modified"),
    (305, "USE_PROXY", "Use Proxy"),
    (307, "TEMPORARY_REDIRECT", "Temporary Redirect"),
    (308, "PERMANENT_REDIRECT", "Permanent Redirect"),
    (400, "BAD_REQUEST", "Bad Request"),
    (401, "UNAUTHORIZED", "Unauthorized"),
    (402, "PAYMENT_REQUIRED", "Payment Required"),
    (403, "FORBIDDEN", "Forbidden"),
    (404, "NOT_FOUND", "Not Found"),
    (405, "METHOD_NOT_ALLOWED", "Method Not Allowed"),
    (406, "NOT_ACCEPTABLE", "Not Acceptable"),
    (407, "PROXY_AUTHENTICATION_REQUIRED", "Proxy Authentication Required"),
    (408, "REQUEST_TIMEOUT", "Request Timeout"),
    (409, "CONFLICT", "Conflict"),
    (410, "GONE", "Gone"),
    (411, "LENGTH_REQUIRED", "Length Required"),
    (412, "PRECONDITION_FAILED", "Precondition Failed"),
    (413, "PAYLOAD_TOO_LARGE", "Request Entity Too Large"),
    (414, "URI_TOO_LONG", "Request URI Too Long"),
    (415, "UNSUPPORTED_MEDIA_TYPE", "Unsupported Media Type"),
    (416, "RANGE_NOT_SATISFIABLE", "Requested Range Not Satisfiable"),
    (417, "EXPECTATION_FAILED", "Expectation Failed"),
    (418, "IM_A_TEAPOT", "I'm a teapot"),
    (421, "MISDIRECTED_REQUEST", "Misdirected Request"),
    (422, "UNPROCESSABLE_ENTITY", "Unprocessable Entity"),
    (423, "LOCKED", "Locked"),
    (424, "FAILED_DEPENDENCY", "Failed Dependency"),
    (426, "UPGRADE_REQUIRED", "Upgrade Required"),
    (428, "PRECONDITION_REQUIRED", "Precondition Required"),
    (429, "TOO_MANY_REQUESTS", "Too Many Requests"),
    (431, "REQUEST_HEADER_FIELDS_TOO_LARGE", "Request Header Fields Too Large"),
    (451, "UNAVAILABLE_FOR_LEGAL_REASONS", "Unavailable For Legal Reasons"),
    (500, "INTERNAL_SERVER_ERROR", "Internal Server Error"),
    (501, "NOT_IMPLEMENTED", "Not Implemented"),
    (502, "BAD_GATEWAY", "Bad Gateway"),
    (503, "SERVICE_UNAVAILABLE", "Service Unavailable"),
    (504, "GATEWAY_TIMEOUT", "Gateway Timeout"),
    (505, "HTTP_VERSION_NOT_SUPPORTED", "HTTP Version Not Supported"),
    (506, "VARIANT_ALSO_NEGOTIATES", "Variant Also Negotiates"),
    (507, "INSUFFICIENT_STORAGE", "Insufficient Storage"),
    (508, "LOOP_DETECTED", "Loop Detected"),
    (510, "NOT_EXTENDED", "Not Extended"),
    (511, "NETWORK_AUTHENTICATION_REQUIRED", "Network Authentication Required"),
];

fn status_entry(code: u16) -> Result<&'static (u16, &'static str, &'static str)> {
    STATUS_CODES
        .iter()
        .find(|(c, _, _)| *c == code)
        .ok_or(Error::UnknownStatusCode(code))
}

/// Name of the `StatusCode` associated constant for `code`, e.g. `NOT_FOUND`.
pub fn status_code_const(code: u16) -> Result<&'static str> {
    status_entry(code).map(|(_, name, _)| *name)
}

/// Reason phrase of `code`, e.g. `Not Found`.
pub fn status_text(code: u16) -> Result<&'static str> {
    status_entry(code).map(|(_, _, text)| *text)
}

/// Status text in type name form, e.g. `NotFound`.
pub fn status_type_name(code: u16) -> Result<String> {
    Ok(to_proper_case(status_text(code)?))
}

/// How a path or query parameter or a header is converted from and to its
/// textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    Scalar(PrimitiveKind),
    /// Comma separated list of scalars
    Array(PrimitiveKind),
}

impl Conversion {
    /// Conversion for a value of type `data_type`. Only primitives and
    /// arrays of primitives travel in paths, query strings and headers.
    pub fn for_type(design: &Design, data_type: &DataType, context: &str) -> Result<Self> {
        let resolved = design.resolve(data_type)?;
        match resolved {
            DataType::Primitive(PrimitiveKind::Any) => {
                Err(Error::unsupported(context, resolved.kind_name()))
            }
            DataType::Primitive(kind) => Ok(Conversion::Scalar(*kind)),
            DataType::Array(elem) => match design.resolve(&elem.data_type)? {
                DataType::Primitive(kind) if *kind != PrimitiveKind::Any => {
                    Ok(Conversion::Array(*kind))
                }
                other => Err(Error::unsupported(
                    context,
                    format!("array of {}", other.kind_name()),
                )),
            },
            DataType::Map { .. } | DataType::Object(_) | DataType::User(_) => {
                Err(Error::unsupported(context, resolved.kind_name()))
            }
        }
    }

    pub fn scalar_kind(self) -> PrimitiveKind {
        match self {
            Conversion::Scalar(kind) | Conversion::Array(kind) => kind,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Conversion::Array(_))
    }

    /// Rust type of a single value.
    pub fn scalar_type(self) -> &'static str {
        self.scalar_kind().rust_type()
    }

    /// Rust type of the converted value.
    pub fn rust_type(self) -> String {
        match self {
            Conversion::Scalar(kind) => kind.rust_type().to_string(),
            Conversion::Array(kind) => format!("Vec<{}>", kind.rust_type()),
        }
    }

    /// Description used in conversion error messages.
    pub fn label(self) -> &'static str {
        match self {
            Conversion::Scalar(kind) => match kind {
                PrimitiveKind::Boolean => "boolean",
                PrimitiveKind::String => "string",
                PrimitiveKind::Bytes => "bytes",
                PrimitiveKind::Float32 | PrimitiveKind::Float64 => "float",
                PrimitiveKind::UInt | PrimitiveKind::UInt32 | PrimitiveKind::UInt64 => {
                    "unsigned integer"
                }
                PrimitiveKind::Int | PrimitiveKind::Int32 | PrimitiveKind::Int64 => "integer",
                PrimitiveKind::Any => "value",
            },
            Conversion::Array(kind) => match kind {
                PrimitiveKind::Boolean => "array of booleans",
                PrimitiveKind::String => "array of strings",
                PrimitiveKind::Bytes => "array of bytes",
                PrimitiveKind::Float32 | PrimitiveKind::Float64 => "array of floats",
                PrimitiveKind::UInt | PrimitiveKind::UInt32 | PrimitiveKind::UInt64 => {
                    "array of unsigned integers"
                }
                PrimitiveKind::Int | PrimitiveKind::Int32 | PrimitiveKind::Int64 => {
                    "array of integers"
                }
                PrimitiveKind::Any => "array",
            },
        }
    }

    /// Rust expression building the default value `value`, if it fits the
    /// conversion.
    pub fn default_literal(self, value: &serde_json::Value) -> Option<String> {
        match (self, value) {
            (Conversion::Array(kind), serde_json::Value::Array(items)) => {
                let items = items
                    .iter()
                    .map(|item| scalar_literal(kind, item))
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("vec![{}]", items.join(", ")))
            }
            (Conversion::Scalar(kind), value) => scalar_literal(kind, value),
            _ => None,
        }
    }
}

fn scalar_literal(kind: PrimitiveKind, value: &serde_json::Value) -> Option<String> {
    match (kind, value) {
        (PrimitiveKind::String, serde_json::Value::String(s)) => {
            Some(format!("String::from({})", string_literal(s)))
        }
        (PrimitiveKind::Bytes, serde_json::Value::String(s)) => {
            Some(format!("{}.to_vec()", string_literal(s).replacen('"', "b\"", 1)))
        }
        (PrimitiveKind::Boolean, serde_json::Value::Bool(b)) => Some(b.to_string()),
        (kind, serde_json::Value::Number(n)) if kind.is_integer() => {
            n.as_i64().map(|i| i.to_string()).or_else(|| n.as_u64().map(|u| u.to_string()))
        }
        (kind, serde_json::Value::Number(n)) if kind.is_float() => n.as_f64().map(float_literal),
        _ => None,
    }
}

/// Rust type reference for `data_type`. User types are qualified with
/// `module` when given.
///
/// User type values inside arrays and maps are optional.
pub fn type_ref(data_type: &DataType, module: Option<&str>) -> String {
    match data_type {
        DataType::Primitive(kind) => kind.rust_type().to_string(),
        DataType::Array(elem) => format!("Vec<{}>", element_ref(&elem.data_type, module)),
        DataType::Map { key, elem } => format!(
            "std::collections::HashMap<{}, {}>",
            type_ref(&key.data_type, module),
            element_ref(&elem.data_type, module)
        ),
        DataType::Object(_) => "serde_json::Map<String, serde_json::Value>".to_string(),
        DataType::User(name) => match module {
            Some(module) => format!("{module}::{}", to_proper_case(name)),
            None => to_proper_case(name),
        },
    }
}

fn element_ref(data_type: &DataType, module: Option<&str>) -> String {
    match data_type {
        DataType::User(_) => format!("Option<{}>", type_ref(data_type, module)),
        other => type_ref(other, module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::types::Object;
    use serde_json::json;

    fn account_design() -> Design {
        Design::new().with_type(
            "Account",
            Attribute::object(
                Object::new()
                    .with("id", Attribute::int())
                    .with("name", Attribute::string())
                    .with("org", Attribute::string()),
            )
            .required(["id", "name"]),
        )
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_code_const(200).unwrap(), "OK");
        assert_eq!(status_code_const(404).unwrap(), "NOT_FOUND");
        assert_eq!(status_text(204).unwrap(), "No Content");
        assert_eq!(status_type_name(404).unwrap(), "NotFound");
        assert!(matches!(
            status_code_const(799),
            Err(Error::UnknownStatusCode(799))
        ));
    }

    #[test]
    fn test_request_body_without_bindings_is_payload() {
        let design = account_design();
        let action = Action::new("create").with_payload(Attribute::user("Account"));

        let body = request_body_type(&design, &action, "AccountsCreateRequestBody").unwrap();
        assert_eq!(body, BodyType::Design(DataType::User("Account".to_string())));
        assert!(body.is_public());
        assert_eq!(body.type_name("service"), "service::Account");
    }

    #[test]
    fn test_request_body_drops_bound_attributes() {
        let design = account_design();
        let action = Action::new("update")
            .with_payload(Attribute::user("Account"))
            .with_params(Attribute::object(Object::new().with("id", Attribute::int())))
            .with_headers(Attribute::object(
                Object::new().with("org:X-Org", Attribute::string()),
            ));

        let body = request_body_type(&design, &action, "AccountsUpdateRequestBody").unwrap();
        let BodyType::Synthesized { name, attribute } = &body else {
            panic!("expected a synthesized body");
        };
        assert_eq!(name, "AccountsUpdateRequestBody");
        let DataType::Object(object) = &attribute.data_type else {
            panic!("expected an object body");
        };
        assert_eq!(object.names().collect::<Vec<_>>(), vec!["name"]);
        assert!(attribute.is_required("name"));
        assert!(!body.is_public());
    }

    #[test]
    fn test_request_body_absent_when_everything_is_bound() {
        let design = Design::new();
        let action = Action::new("show")
            .with_payload(Attribute::object(Object::new().with("id", Attribute::int())))
            .with_params(Attribute::object(Object::new().with("id", Attribute::int())));

        assert!(request_body_type(&design, &action, "Body").is_none());
        assert!(request_body_type(&design, &Action::new("ping"), "Body").is_none());
    }

    #[test]
    fn test_response_body_drops_header_attributes() {
        let design = account_design();
        let response = HttpResponse::new(200).with_headers(Attribute::object(
            Object::new().with("org:X-Org", Attribute::string()),
        ));

        let body = response_body_type(
            &design,
            Some(&Attribute::user("Account")),
            &response,
            "AccountsShowResponseBody",
        )
        .unwrap();
        let object = body.as_object(&design).unwrap();
        assert_eq!(object.names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_conversions() {
        let design = Design::new();
        let conversion =
            Conversion::for_type(&design, &DataType::Primitive(PrimitiveKind::UInt32), "limit")
                .unwrap();
        assert_eq!(conversion.rust_type(), "u32");
        assert_eq!(conversion.label(), "unsigned integer");

        let ids = Attribute::array(Attribute::int());
        let list = Conversion::for_type(&design, &ids.data_type, "ids").unwrap();
        assert!(list.is_array());
        assert_eq!(list.rust_type(), "Vec<i64>");
        assert_eq!(list.label(), "array of integers");

        let filter = Attribute::object(Object::new());
        let err = Conversion::for_type(&design, &filter.data_type, "filter").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported type object for filter");
    }

    #[test]
    fn test_default_literals() {
        let string = Conversion::Scalar(PrimitiveKind::String);
        assert_eq!(string.default_literal(&json!("asc")).unwrap(), "String::from(\"asc\")");
        let ints = Conversion::Array(PrimitiveKind::Int);
        assert_eq!(ints.default_literal(&json!([1, 2])).unwrap(), "vec![1, 2]");
        assert!(ints.default_literal(&json!("x")).is_none());
    }

    #[test]
    fn test_type_ref() {
        let accounts = Attribute::array(Attribute::user("account"));
        assert_eq!(
            type_ref(&accounts.data_type, Some("service")),
            "Vec<Option<service::Account>>"
        );
        let scores = Attribute::map(
            Attribute::string(),
            Attribute::primitive(PrimitiveKind::Float64),
        );
        assert_eq!(
            type_ref(&scores.data_type, None),
            "std::collections::HashMap<String, f64>"
        );
    }
}

//! HTTP binding declarations: services, actions, routes, responses and
//! errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::design::{Design, MappedAttribute, types::Attribute};

/// Matches path wildcards: `{id}`, `{*path}`, `:id` and `*path`.
static WILDCARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?:\{\*?([A-Za-z0-9_]+)\}|[:*]([A-Za-z0-9_]+))")
        .expect("wildcard pattern is valid")
});

/// A service exposed over HTTP, with its actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Path prefix shared by every route of the service
    #[serde(default)]
    pub base_path: String,
    /// Name of the parent service whose base path prefixes this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_path: String::new(),
            parent: None,
            actions: Vec::new(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// HTTP method and path of one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub path: String,
}

impl Route {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// An endpoint of a service and its HTTP bindings.
///
/// `params` and `headers` are objects whose keys use the `name:wire`
/// notation when the wire name differs from the payload attribute name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Attribute>,
    /// Path and query parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Attribute>,
    /// Request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Attribute>,
    /// Explicit request body, overriding the one derived from the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Attribute>,
    #[serde(default)]
    pub responses: Vec<HttpResponse>,
    #[serde(default)]
    pub errors: Vec<HttpError>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
            payload: None,
            result: None,
            params: None,
            headers: None,
            body: None,
            responses: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_route(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.push(Route::new(method, path));
        self
    }

    pub fn with_payload(mut self, payload: Attribute) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_result(mut self, result: Attribute) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_params(mut self, params: Attribute) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_headers(mut self, headers: Attribute) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_body(mut self, body: Attribute) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_response(mut self, response: HttpResponse) -> Self {
        self.responses.push(response);
        self
    }

    pub fn with_error(mut self, error: HttpError) -> Self {
        self.errors.push(error);
        self
    }

    /// All declared parameters, path and query alike.
    pub fn mapped_params(&self, design: &Design) -> MappedAttribute {
        self.params
            .as_ref()
            .map(|params| MappedAttribute::new(params, design))
            .unwrap_or_default()
    }

    pub fn mapped_headers(&self, design: &Design) -> MappedAttribute {
        self.headers
            .as_ref()
            .map(|headers| MappedAttribute::new(headers, design))
            .unwrap_or_default()
    }

    /// Wildcard names appearing in any of the action's full route paths.
    pub fn wildcards(&self, design: &Design, service: &Service) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for route in &self.routes {
            for name in extract_wildcards(&design.full_path(service, route)?) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Parameters bound to route wildcards, wire name matched.
    ///
    /// A matched route always carries its wildcards, so path parameters are
    /// required whatever the params object declares.
    pub fn path_params(&self, design: &Design, service: &Service) -> Result<MappedAttribute> {
        let wildcards = self.wildcards(design, service)?;
        let mut path = self
            .mapped_params(design)
            .restrict(|field| wildcards.contains(&field.element));
        path.require_all();
        Ok(path)
    }

    /// Parameters read from the query string.
    pub fn query_params(&self, design: &Design, service: &Service) -> Result<MappedAttribute> {
        let wildcards = self.wildcards(design, service)?;
        Ok(self
            .mapped_params(design)
            .restrict(|field| !wildcards.contains(&field.element)))
    }

    /// Path parameters followed by query parameters.
    pub fn all_params(&self, design: &Design, service: &Service) -> Result<MappedAttribute> {
        let mut all = self.path_params(design, service)?;
        all.extend(self.query_params(design, service)?);
        Ok(all)
    }
}

/// Discriminator: the result attribute `name` must equal `value` for the
/// response to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// One declared HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Attribute>,
    /// Explicit response body, overriding the one derived from the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Attribute>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            tag: None,
            headers: None,
            body: None,
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag = Some(Tag {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_headers(mut self, headers: Attribute) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_body(mut self, body: Attribute) -> Self {
        self.body = Some(body);
        self
    }

    /// Discriminator attribute name, empty when the response is untagged.
    pub fn tag_name(&self) -> &str {
        self.tag.as_ref().map(|t| t.name.as_str()).unwrap_or_default()
    }

    pub fn tag_value(&self) -> &str {
        self.tag.as_ref().map(|t| t.value.as_str()).unwrap_or_default()
    }

    pub fn is_tagged(&self) -> bool {
        !self.tag_name().is_empty()
    }

    pub fn mapped_headers(&self, design: &Design) -> MappedAttribute {
        self.headers
            .as_ref()
            .map(|headers| MappedAttribute::new(headers, design))
            .unwrap_or_default()
    }
}

/// An error the action may return and the response used to encode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpError {
    pub name: String,
    /// The error type, usually a user type
    pub attribute: Attribute,
    pub response: HttpResponse,
}

impl HttpError {
    pub fn new(name: impl Into<String>, attribute: Attribute, response: HttpResponse) -> Self {
        Self {
            name: name.into(),
            attribute,
            response,
        }
    }
}

/// Wildcard names of `path`, in order of appearance.
pub fn extract_wildcards(path: &str) -> Vec<String> {
    WILDCARD_RE
        .captures_iter(path)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Joins path segments with single slashes.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => {
            if prefix.starts_with('/') {
                prefix.to_string()
            } else {
                format!("/{prefix}")
            }
        }
        (false, false) => {
            let joined = format!("{prefix}/{path}");
            if joined.starts_with('/') {
                joined
            } else {
                format!("/{joined}")
            }
        }
    }
}

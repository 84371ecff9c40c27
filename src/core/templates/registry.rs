//! Named template registry backed by Tera.
//!
//! A registry is built once per generator run and handed by reference to the
//! validation synthesizer and the server file renderer. It starts with the
//! built-in validation snippets and server sections; callers may replace any
//! of them by registering a template under the same name.

use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera, Value};
use tracing::debug;

use crate::core::error::Result;
use crate::core::utils::{indent, sanitize_rust_field_name};

/// Built-in templates, keyed by registry name.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "validation/enum",
        include_str!("../../../templates/validation/enum.tera"),
    ),
    (
        "validation/format",
        include_str!("../../../templates/validation/format.tera"),
    ),
    (
        "validation/pattern",
        include_str!("../../../templates/validation/pattern.tera"),
    ),
    (
        "validation/min_max",
        include_str!("../../../templates/validation/min_max.tera"),
    ),
    (
        "validation/length",
        include_str!("../../../templates/validation/length.tera"),
    ),
    (
        "validation/required",
        include_str!("../../../templates/validation/required.tera"),
    ),
    (
        "validation/presence",
        include_str!("../../../templates/validation/presence.tera"),
    ),
    (
        "validation/array",
        include_str!("../../../templates/validation/array.tera"),
    ),
    (
        "validation/map",
        include_str!("../../../templates/validation/map.tera"),
    ),
    (
        "validation/user",
        include_str!("../../../templates/validation/user.tera"),
    ),
    (
        "server/macros",
        include_str!("../../../templates/server/macros.tera"),
    ),
    (
        "server/header",
        include_str!("../../../templates/server/header.tera"),
    ),
    (
        "server/struct",
        include_str!("../../../templates/server/struct.tera"),
    ),
    (
        "server/constructor",
        include_str!("../../../templates/server/constructor.tera"),
    ),
    (
        "server/mount",
        include_str!("../../../templates/server/mount.tera"),
    ),
    (
        "server/handler",
        include_str!("../../../templates/server/handler.tera"),
    ),
    (
        "server/handler_constructor",
        include_str!("../../../templates/server/handler_constructor.tera"),
    ),
    (
        "server/decoder",
        include_str!("../../../templates/server/decoder.tera"),
    ),
    (
        "server/encoder",
        include_str!("../../../templates/server/encoder.tera"),
    ),
    (
        "server/error_encoder",
        include_str!("../../../templates/server/error_encoder.tera"),
    ),
];

/// Registry of the templates used to emit code.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    tera: Tera,
}

impl TemplateRegistry {
    /// Create a registry holding the built-in templates.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        // generated code is Rust, never HTML
        tera.autoescape_on(vec![]);
        tera.register_filter("indent", indent_filter);
        tera.register_filter("field", field_filter);
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())?;

        debug!(count = BUILTIN_TEMPLATES.len(), "Loaded built-in templates");
        Ok(Self { tera })
    }

    /// Add a template, replacing any template registered under `name`.
    pub fn register(&mut self, name: &str, content: &str) -> Result<()> {
        self.tera.add_raw_template(name, content)?;
        debug!(template = name, "Registered template");
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Render the template `name` with `data` as context. Leading and
    /// trailing whitespace is trimmed from the output.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        let context = Context::from_serialize(data)?;
        let rendered = self.tera.render(name, &context)?;
        Ok(rendered.trim().to_string())
    }
}

/// `indent(width=N)`: indents every non-empty line by `width` spaces
/// (default 4).
fn indent_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = tera::try_get_value!("indent", "value", String, value);
    let width = match args.get("width") {
        Some(width) => tera::try_get_value!("indent", "width", usize, width),
        None => 4,
    };

    let mut indented = text;
    for _ in 0..width / 4 {
        indented = indent(&indented);
    }
    let pad = " ".repeat(width % 4);
    if !pad.is_empty() {
        indented = indented
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{pad}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
    }
    Ok(Value::String(indented))
}

/// `field`: Rust field name of a design attribute name.
fn field_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = tera::try_get_value!("field", "value", String, value);
    Ok(Value::String(sanitize_rust_field_name(&name)))
}

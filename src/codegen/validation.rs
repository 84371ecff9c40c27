//! Validation code synthesis.
//!
//! Walks an attribute and emits the Rust statements checking a value of that
//! attribute against its validations. Emitted code pushes failures into an
//! error accumulator (`Config::errors_var`) through helpers of the runtime
//! module and delegates nested user types to their own validation routine
//! (`Config::validate_method`), which is what keeps the output finite on
//! cyclic designs.
//!
//! # Representation
//!
//! A value is held as `Option<T>` when the structure is private or when it is
//! optional without a default value; otherwise it is held by value. Elements
//! of arrays and maps are held by value, except user type elements which are
//! `Option<T>`. Checks on an `Option<T>` run inside `if let Some(val) = &x`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::rc::Rc;

use serde::Serialize;
use tracing::trace;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::templates::TemplateRegistry;
use crate::core::utils::{float_literal, json_literal, sanitize_rust_field_name, string_literal};
use crate::design::mapped::split_key;
use crate::design::types::{Attribute, DataType, PrimitiveKind};
use crate::design::walk::walk_attribute;
use crate::design::{Design, Validation};

/// Per-call memo of the code generated for each user type, by type name.
type Memo = HashMap<String, Rc<RefCell<String>>>;

/// Expression the emitted checks apply to.
#[derive(Debug, Clone)]
struct Target {
    expr: String,
    /// Held as `Option<T>`
    optional: bool,
    /// Bound to a reference (`val`, `e`, `k`, `v`, `<field>_val`)
    by_ref: bool,
}

impl Target {
    fn value(expr: impl Into<String>, optional: bool) -> Self {
        Self {
            expr: expr.into(),
            optional,
            by_ref: false,
        }
    }

    fn reference(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            optional: false,
            by_ref: true,
        }
    }

    /// Expression usable in comparisons.
    fn value_expr(&self, primitive: bool) -> String {
        if self.by_ref && primitive {
            format!("*{}", self.expr)
        } else {
            self.expr.clone()
        }
    }

    /// Expression usable as a reference argument.
    fn arg_expr(&self) -> String {
        if self.by_ref {
            self.expr.clone()
        } else {
            format!("&{}", self.expr)
        }
    }
}

#[derive(Serialize)]
struct CheckData<'a> {
    rt: &'a str,
    errors: &'a str,
    context: String,
    #[serde(flatten)]
    fields: serde_json::Value,
}

/// Emits validation code for attributes of one design.
///
/// Every public entry point allocates its own memo; synthesizers hold no
/// mutable state and can be shared across files.
#[derive(Debug, Clone, Copy)]
pub struct ValidationSynthesizer<'a> {
    design: &'a Design,
    templates: &'a TemplateRegistry,
    config: &'a Config,
}

impl<'a> ValidationSynthesizer<'a> {
    pub fn new(design: &'a Design, templates: &'a TemplateRegistry, config: &'a Config) -> Self {
        Self {
            design,
            templates,
            config,
        }
    }

    /// Whether `attribute` or anything reachable from it carries a
    /// validation. Required-only validations are ignored when
    /// `ignore_required` is set.
    pub fn has_validations(&self, attribute: &Attribute, ignore_required: bool) -> bool {
        walk_attribute(self.design, attribute, "", &mut |_, a| {
            match &a.validation {
                Some(v) if !ignore_required || !v.has_required_only() => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        })
        .is_break()
    }

    /// Checks for the validations of `attribute` itself, without recursing
    /// into its children. Empty when nothing applies.
    ///
    /// `req` tells whether the attribute is required and `is_pub` whether
    /// the value lives in a public structure; together with the default
    /// value they decide whether `target` is an `Option`. `context` names the
    /// value in error messages.
    pub fn validation_code(
        &self,
        attribute: &Attribute,
        req: bool,
        is_pub: bool,
        target: &str,
        context: &str,
    ) -> Result<String> {
        let target = self.root_target(attribute, req, is_pub, target);
        self.checks(attribute, is_pub, &target, context)
    }

    /// Checks for `attribute` and, recursively, for its children. Nested
    /// user types are delegated to their validation routine instead of
    /// being inlined.
    pub fn recursive_validation_code(
        &self,
        attribute: &Attribute,
        req: bool,
        is_pub: bool,
        target: &str,
    ) -> Result<String> {
        let mut memo = Memo::new();
        let root = self.root_target(attribute, req, is_pub, target);
        let code = self.recurse(attribute, is_pub, &root, target, &mut memo)?;
        Ok(snapshot(&code))
    }

    fn root_target(&self, attribute: &Attribute, req: bool, is_pub: bool, target: &str) -> Target {
        // struct values are validated in place; their fields carry the options
        let optional = !self.design.is_object(&attribute.data_type)
            && holds_option(attribute, req, is_pub);
        Target::value(target, optional)
    }

    fn recurse(
        &self,
        attribute: &Attribute,
        is_pub: bool,
        target: &Target,
        context: &str,
        memo: &mut Memo,
    ) -> Result<Rc<RefCell<String>>> {
        let buf = Rc::new(RefCell::new(String::new()));
        if let DataType::User(name) = &attribute.data_type {
            if let Some(existing) = memo.get(name) {
                trace!(user_type = %name, "Validation already in progress or done");
                return Ok(Rc::clone(existing));
            }
            memo.insert(name.clone(), Rc::clone(&buf));
        }

        append(&buf, &self.checks(attribute, is_pub, target, context)?);

        match self.design.resolve(&attribute.data_type)? {
            DataType::Object(object) => {
                for (key, child) in object.iter() {
                    let code = self
                        .recurse_attribute(attribute, key, child, is_pub, target, context, memo)?;
                    append(&buf, &code);
                }
            }
            DataType::Array(elem) => {
                let code =
                    self.collection_element(elem, "e", true, &format!("{context}[*]"), memo)?;
                if !code.is_empty() {
                    let code = self.render(
                        "validation/array",
                        context,
                        serde_json::json!({"iter": iter_expr(target), "body": code}),
                    )?;
                    append(&buf, &code);
                }
            }
            DataType::Map { key, elem } => {
                let key_code =
                    self.collection_element(key, "k", false, &format!("{context}.key"), memo)?;
                let value_code =
                    self.collection_element(elem, "v", true, &format!("{context}[key]"), memo)?;
                if !key_code.is_empty() || !value_code.is_empty() {
                    let body = [key_code.as_str(), value_code.as_str()]
                        .into_iter()
                        .filter(|code| !code.is_empty())
                        .collect::<Vec<_>>()
                        .join("\n");
                    let code = self.render(
                        "validation/map",
                        context,
                        serde_json::json!({
                            "key": if key_code.is_empty() { "_" } else { "k" },
                            "value": if value_code.is_empty() { "_" } else { "v" },
                            "iter": iter_expr(target),
                            "body": body,
                        }),
                    )?;
                    append(&buf, &code);
                }
            }
            DataType::Primitive(_) | DataType::User(_) => {}
        }

        Ok(buf)
    }

    /// Code validating one field of an object.
    #[allow(clippy::too_many_arguments)]
    fn recurse_attribute(
        &self,
        parent: &Attribute,
        key: &str,
        child: &Attribute,
        is_pub: bool,
        target: &Target,
        context: &str,
        memo: &mut Memo,
    ) -> Result<String> {
        let (name, _) = split_key(key);
        let field = sanitize_rust_field_name(name);
        let field_expr = format!("{}.{}", target.expr, field);
        let child_context = format!("{context}.{name}");
        let optional = holds_option(child, self.is_required(parent, key), is_pub);

        let is_user = matches!(child.data_type, DataType::User(_));
        if !is_user && !self.design.is_object(&child.data_type) {
            let child_target = Target::value(field_expr, optional);
            let code = self.recurse(child, is_pub, &child_target, &child_context, memo)?;
            return Ok(snapshot(&code));
        }

        // user types and inline structs: bind once, then validate in place
        let binding = format!("{field}_val");
        let inner = if optional {
            Target::reference(binding.clone())
        } else {
            Target::value(field_expr.clone(), false)
        };
        let code = if is_user {
            if self.has_meaningful_validations(child, is_pub) {
                self.delegate(&inner.expr)?
            } else {
                String::new()
            }
        } else {
            snapshot(&self.recurse(child, is_pub, &inner, &child_context, memo)?)
        };

        if code.is_empty() || !optional {
            return Ok(code);
        }
        self.templates.render(
            "validation/presence",
            &serde_json::json!({
                "binding": binding,
                "target": field_expr,
                "body": code,
            }),
        )
    }

    /// Code validating one element of an array or one key or value of a
    /// map, bound to `var`.
    ///
    /// User type elements and values are held as `Option<T>` and need the
    /// presence guard set by `guarded`; map keys are held by value.
    fn collection_element(
        &self,
        elem: &Attribute,
        var: &str,
        guarded: bool,
        context: &str,
        memo: &mut Memo,
    ) -> Result<String> {
        if !matches!(elem.data_type, DataType::User(_)) {
            let code = self.recurse(elem, true, &Target::reference(var), context, memo)?;
            return Ok(snapshot(&code));
        }

        // the memo may hand back a buffer still being filled, so the
        // structural pass decides too
        let inline = self.recurse(elem, true, &Target::reference(var), context, memo)?;
        if snapshot(&inline).is_empty() && !self.has_meaningful_validations(elem, true) {
            return Ok(String::new());
        }
        let call = self.delegate(var)?;
        if !guarded {
            return Ok(call);
        }
        self.templates.render(
            "validation/presence",
            &serde_json::json!({
                "binding": var,
                "target": var,
                "body": call,
            }),
        )
    }

    fn delegate(&self, target: &str) -> Result<String> {
        self.templates.render(
            "validation/user",
            &serde_json::json!({
                "target": target,
                "method": self.config.validate_method,
                "errors": self.config.errors_var,
            }),
        )
    }

    /// Whether validating a value of the user type `attribute` can fail.
    ///
    /// In a public structure a required-only validation naming primitive
    /// fields other than strings and bytes cannot fail: those fields are held
    /// by value and always present.
    fn has_meaningful_validations(&self, attribute: &Attribute, is_pub: bool) -> bool {
        walk_attribute(self.design, attribute, "", &mut |_, a| {
            let Some(validation) = &a.validation else {
                return ControlFlow::Continue(());
            };
            if !is_pub || !validation.has_required_only() {
                return ControlFlow::Break(());
            }
            // `checks` emits no required check for public structures, so a
            // type whose only failure is an absent string still gets a
            // delegated call that cannot fail

            let Some(object) = self.design.as_object(&a.data_type) else {
                return ControlFlow::Continue(());
            };
            for required in &validation.required {
                let child = object
                    .iter()
                    .find(|(key, _)| *key == required || split_key(key).0 == required)
                    .map(|(_, child)| child);
                let Some(child) = child else {
                    continue;
                };
                let can_be_absent = match self.design.primitive_kind(&child.data_type) {
                    None => true,
                    Some(kind) => matches!(
                        kind,
                        PrimitiveKind::String | PrimitiveKind::Bytes | PrimitiveKind::Any
                    ),
                };
                if can_be_absent {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        })
        .is_break()
    }

    fn is_required(&self, parent: &Attribute, key: &str) -> bool {
        let (name, _) = split_key(key);
        self.design
            .effective_validation(parent)
            .is_some_and(|v| v.required.iter().any(|r| r == key || r == name))
    }

    /// Checks on the value itself in the fixed order: enum, format, pattern,
    /// minimum, maximum, minimum length, maximum length, required fields.
    fn checks(
        &self,
        attribute: &Attribute,
        is_pub: bool,
        target: &Target,
        context: &str,
    ) -> Result<String> {
        let Some(validation) = self.design.effective_validation(attribute) else {
            return Ok(String::new());
        };
        let data_type = self.design.resolve(&attribute.data_type)?;
        let kind = match data_type {
            DataType::Primitive(kind) => Some(*kind),
            _ => None,
        };

        // checks run against the unwrapped value when the target is optional
        let inner = if target.optional {
            Target::reference("val")
        } else {
            target.clone()
        };
        let mut checks = Vec::new();
        for check in self.value_checks(validation, kind, &inner, context)? {
            checks.push(self.guard(target, check)?);
        }

        if !is_pub {
            if let DataType::Object(object) = data_type {
                for required in &validation.required {
                    let declared = object
                        .names()
                        .find(|key| *key == required || split_key(key).0 == required);
                    let Some(key) = declared else {
                        continue;
                    };
                    let check = self.render(
                        "validation/required",
                        context,
                        serde_json::json!({
                            "target": inner.expr,
                            "field": sanitize_rust_field_name(split_key(key).0),
                            "name": string_literal(required),
                        }),
                    )?;
                    checks.push(self.guard(target, check)?);
                }
            }
        }

        Ok(checks.join("\n"))
    }

    fn value_checks(
        &self,
        validation: &Validation,
        kind: Option<PrimitiveKind>,
        target: &Target,
        context: &str,
    ) -> Result<Vec<String>> {
        let primitive = kind.is_some();
        let value = target.value_expr(primitive);
        let arg = target.arg_expr();
        let mut checks = Vec::new();

        if let Some(values) = &validation.values {
            let literals: Vec<_> = values.iter().map(|v| value_literal(v, kind)).collect();
            let condition = literals
                .iter()
                .map(|literal| format!("{value} == {literal}"))
                .collect::<Vec<_>>()
                .join(" || ");
            checks.push(self.render(
                "validation/enum",
                context,
                serde_json::json!({
                    "condition": condition,
                    "arg": arg,
                    "values": literals.join(", "),
                }),
            )?);
        }
        if let Some(format) = validation.format {
            checks.push(self.render(
                "validation/format",
                context,
                serde_json::json!({"arg": arg, "format": format.constant()}),
            )?);
        }
        if let Some(pattern) = &validation.pattern {
            checks.push(self.render(
                "validation/pattern",
                context,
                serde_json::json!({"arg": arg, "pattern": string_literal(pattern)}),
            )?);
        }
        for (bound, is_min) in [(validation.minimum, true), (validation.maximum, false)] {
            let Some(bound) = bound else {
                continue;
            };
            checks.push(self.render(
                "validation/min_max",
                context,
                serde_json::json!({
                    "value": value,
                    "bound": numeric_literal(bound, kind),
                    "is_min": is_min,
                }),
            )?);
        }
        for (bound, is_min) in [(validation.min_length, true), (validation.max_length, false)] {
            let Some(bound) = bound else {
                continue;
            };
            let length = if kind == Some(PrimitiveKind::String) {
                format!("{}.chars().count()", target.expr)
            } else {
                format!("{}.len()", target.expr)
            };
            checks.push(self.render(
                "validation/length",
                context,
                serde_json::json!({"length": length, "bound": bound, "is_min": is_min}),
            )?);
        }

        Ok(checks)
    }

    /// Wraps `check` in a presence guard when `target` is optional.
    fn guard(&self, target: &Target, check: String) -> Result<String> {
        if !target.optional {
            return Ok(check);
        }
        self.templates.render(
            "validation/presence",
            &serde_json::json!({
                "binding": "val",
                "target": target.expr,
                "body": check,
            }),
        )
    }

    fn render(&self, template: &str, context: &str, fields: serde_json::Value) -> Result<String> {
        self.templates.render(
            template,
            &CheckData {
                rt: &self.config.runtime_module,
                errors: &self.config.errors_var,
                context: string_literal(context),
                fields,
            },
        )
    }
}

/// Whether a value of `attribute` is held as an `Option`.
fn holds_option(attribute: &Attribute, req: bool, is_pub: bool) -> bool {
    !is_pub || (!req && !attribute.has_default())
}

fn iter_expr(target: &Target) -> String {
    if target.optional {
        format!("{}.iter().flatten()", target.expr)
    } else {
        format!("{}.iter()", target.expr)
    }
}

/// Text of a possibly still growing buffer.
fn snapshot(buf: &Rc<RefCell<String>>) -> String {
    buf.borrow().clone()
}

fn append(buf: &Rc<RefCell<String>>, code: &str) {
    if code.is_empty() {
        return;
    }
    let mut buf = buf.borrow_mut();
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(code);
}

/// Enum value literal matching the type of the compared value.
fn value_literal(value: &serde_json::Value, kind: Option<PrimitiveKind>) -> String {
    match (value.as_f64(), kind) {
        (Some(n), Some(kind)) if kind.is_numeric() => numeric_literal(n, Some(kind)),
        _ => json_literal(value),
    }
}

/// Bound literal matching the type of the compared value.
fn numeric_literal(bound: f64, kind: Option<PrimitiveKind>) -> String {
    match kind {
        Some(kind) if kind.is_integer() && bound.fract() == 0.0 => format!("{}", bound as i64),
        _ => float_literal(bound),
    }
}

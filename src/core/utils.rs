//! Identifier and literal helpers for emitted Rust code.

/// Converts a string to snake_case format for Rust identifiers.
///
/// This function handles various input formats including camelCase, PascalCase,
/// kebab-case, and space-separated strings, converting them all to snake_case.
///
/// # Examples
/// ```
/// use httpgen::core::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("FindPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
/// assert_eq!(to_snake_case("get HTTP Response"), "get_http_response");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for ch in s.chars() {
        if ch.is_uppercase() {
            if prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_numeric();
        } else if !result.is_empty() && !result.ends_with('_') {
            // any separator collapses into a single underscore
            result.push('_');
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to UpperCamelCase (PascalCase) format for Rust type names.
///
/// # Examples
/// ```
/// use httpgen::core::utils::to_proper_case;
///
/// assert_eq!(to_proper_case("find_pets_by_status"), "FindPetsByStatus");
/// assert_eq!(to_proper_case("No Content"), "NoContent");
/// ```
pub fn to_proper_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Sanitizes a string to be a valid Rust field or variable name.
///
/// Reserved keywords get a trailing underscore.
///
/// ```
/// use httpgen::core::utils::sanitize_rust_field_name;
///
/// assert_eq!(sanitize_rust_field_name("type"), "type_");
/// assert_eq!(sanitize_rust_field_name("firstName"), "first_name");
/// ```
pub fn sanitize_rust_field_name(s: &str) -> String {
    let snake_case = to_snake_case(s);

    match snake_case.as_str() {
        "as" | "break" | "const" | "continue" | "crate" | "else" | "enum" | "extern" | "false"
        | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod" | "move"
        | "mut" | "pub" | "ref" | "return" | "self" | "static" | "struct" | "super" | "trait"
        | "true" | "type" | "unsafe" | "use" | "where" | "while" | "async" | "await" | "dyn"
        | "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" | "priv"
        | "typeof" | "unsized" | "virtual" | "yield" | "try" | "gen" => format!("{snake_case}_"),
        "" => "field".to_string(),
        _ if snake_case.starts_with(|c: char| c.is_numeric()) => format!("f_{snake_case}"),
        _ => snake_case,
    }
}

/// Renders `s` as a Rust string literal, quotes and escapes included.
pub fn string_literal(s: &str) -> String {
    format!("{s:?}")
}

/// Renders a JSON scalar as a Rust literal.
///
/// Strings become string literals, integers stay integers and floats always
/// carry a decimal point so they type-check against `f32`/`f64` fields.
pub fn json_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => string_literal(s),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => float_literal(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Renders a float so that it always reads as a float literal in Rust.
pub fn float_literal(value: f64) -> String {
    format!("{value:?}")
}

/// Indents every non-empty line of `text` by four spaces.
pub fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Depth-first walk over the attributes reachable from a root attribute.

use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::design::Design;
use crate::design::types::{Attribute, DataType};

/// Visits `root` and every attribute reachable from it, passing the
/// context path of each (`root.field`, `root[*]`, `root.key`, `root[key]`).
///
/// User type definitions are entered once per walk; a reference to a type
/// already entered is visited but not expanded again, so walks over cyclic
/// designs terminate. References to unknown types are visited and skipped.
pub fn walk_attribute<B, F>(
    design: &Design,
    root: &Attribute,
    path: &str,
    visit: &mut F,
) -> ControlFlow<B>
where
    F: FnMut(&str, &Attribute) -> ControlFlow<B>,
{
    let mut seen = HashSet::new();
    walk(design, root, path, visit, &mut seen)
}

fn walk<'a, B, F>(
    design: &'a Design,
    attribute: &'a Attribute,
    path: &str,
    visit: &mut F,
    seen: &mut HashSet<&'a str>,
) -> ControlFlow<B>
where
    F: FnMut(&str, &Attribute) -> ControlFlow<B>,
{
    visit(path, attribute)?;

    match &attribute.data_type {
        DataType::Primitive(_) => ControlFlow::Continue(()),
        DataType::Array(elem) => walk(design, elem, &format!("{path}[*]"), visit, seen),
        DataType::Map { key, elem } => {
            walk(design, key, &format!("{path}.key"), visit, seen)?;
            walk(design, elem, &format!("{path}[key]"), visit, seen)
        }
        DataType::Object(object) => {
            for (name, child) in object.iter() {
                walk(design, child, &format!("{path}.{name}"), visit, seen)?;
            }
            ControlFlow::Continue(())
        }
        DataType::User(name) => {
            let Some(definition) = design.types.get(name) else {
                return ControlFlow::Continue(());
            };
            if !seen.insert(name.as_str()) {
                return ControlFlow::Continue(());
            }
            walk(design, definition, path, visit, seen)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::types::Object;

    #[test]
    fn test_walk_visits_paths_in_order() {
        let root = Attribute::object(
            Object::new()
                .with("tags", Attribute::array(Attribute::string()))
                .with("labels", Attribute::map(Attribute::string(), Attribute::int())),
        );
        let mut paths = Vec::new();
        let _ = walk_attribute::<(), _>(&Design::new(), &root, "body", &mut |path, _| {
            paths.push(path.to_string());
            ControlFlow::Continue(())
        });

        assert_eq!(
            paths,
            vec![
                "body",
                "body.tags",
                "body.tags[*]",
                "body.labels",
                "body.labels.key",
                "body.labels[key]",
            ]
        );
    }

    #[test]
    fn test_walk_terminates_on_cycles() {
        let design = Design::new().with_type(
            "Node",
            Attribute::object(Object::new().with("next", Attribute::user("Node"))),
        );
        let mut visits = 0;
        let _ = walk_attribute::<(), _>(&design, &Attribute::user("Node"), "node", &mut |_, _| {
            visits += 1;
            ControlFlow::Continue(())
        });

        // reference, definition, then the nested reference
        assert_eq!(visits, 3);
    }

    #[test]
    fn test_walk_stops_on_break() {
        let root = Attribute::object(
            Object::new()
                .with("a", Attribute::string())
                .with("b", Attribute::string()),
        );
        let found = walk_attribute(&Design::new(), &root, "x", &mut |path, _| {
            if path.ends_with(".a") {
                ControlFlow::Break(path.to_string())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(found, ControlFlow::Break("x.a".to_string()));
    }
}

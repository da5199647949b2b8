//! Dot-path accessors over nested form data.

use serde_json::{Map, Value};

/// Look up a dot-separated path in a nested value tree.
///
/// Returns `None` the moment a segment is missing or the current node is not
/// an object. Absence is an expected outcome; this never errors.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Look up a path and borrow it as a string.
///
/// Absent paths and non-string leaves both yield `None`.
pub fn get_str<'a>(tree: &'a Value, path: &str) -> Option<&'a str> {
    get(tree, path).and_then(Value::as_str)
}

/// Assign `value` at a dot-separated path, creating intermediate objects as
/// needed. An intermediate node that is not an object is replaced with one.
pub fn set(tree: &mut Value, path: &str, value: Value) {
    if !tree.is_object() {
        *tree = Value::Object(Map::new());
    }
    let mut node = tree;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let map = node.as_object_mut().expect("node coerced to object above");
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        let child = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_nested_objects() {
        let tree = json!({"a": {"b": 5}});
        assert_eq!(get(&tree, "a.b"), Some(&json!(5)));
        assert_eq!(get(&tree, "a"), Some(&json!({"b": 5})));
    }

    #[test]
    fn get_absent_path_is_none_not_error() {
        let tree = json!({"a": {}});
        assert_eq!(get(&tree, "a.b.c"), None);
        assert_eq!(get(&tree, "missing"), None);
    }

    #[test]
    fn get_through_non_object_is_none() {
        let tree = json!({"a": 5});
        assert_eq!(get(&tree, "a.b"), None);
        assert_eq!(get(&json!("scalar"), "a"), None);
    }

    #[test]
    fn get_str_filters_non_strings() {
        let tree = json!({"name": "Lee", "count": 3});
        assert_eq!(get_str(&tree, "name"), Some("Lee"));
        assert_eq!(get_str(&tree, "count"), None);
        assert_eq!(get_str(&tree, "nope"), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut tree = json!({});
        set(&mut tree, "contact.address.city", json!("Halifax"));
        assert_eq!(tree, json!({"contact": {"address": {"city": "Halifax"}}}));
    }

    #[test]
    fn set_overwrites_existing_leaf() {
        let mut tree = json!({"a": {"b": 1}});
        set(&mut tree, "a.b", json!(2));
        assert_eq!(get(&tree, "a.b"), Some(&json!(2)));
    }

    #[test]
    fn set_replaces_scalar_intermediate() {
        let mut tree = json!({"a": 7});
        set(&mut tree, "a.b", json!("x"));
        assert_eq!(tree, json!({"a": {"b": "x"}}));
    }
}

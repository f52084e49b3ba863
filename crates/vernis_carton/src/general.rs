//! General helpers for option objects.

use serde_json::{Map, Value};

/// Assign `value` at a nested property path, creating intermediate objects.
///
/// Any intermediate entry that is not an object is replaced by an empty one,
/// so the assignment always succeeds.
pub fn set_prop(obj: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = obj;
    for key in parents {
        let entry = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }

    current.insert((*last).to_string(), value);
}

/// Shallow-merge every key of `source` into `target`, later keys winning.
///
/// Non-object sources are ignored.
pub fn assign(target: &mut Map<String, Value>, source: &Value) {
    if let Value::Object(source) = source {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Read a boolean flag from an options object, treating absence as `false`.
#[inline]
pub fn flag(options: Option<&Value>, key: &str) -> bool {
    options
        .and_then(|o| o.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_set_prop_top_level() {
        let mut opts = Map::new();
        set_prop(&mut opts, &["sourceMap"], json!(true));
        assert_eq!(Value::Object(opts), json!({ "sourceMap": true }));
    }

    #[test]
    fn test_set_prop_creates_parents() {
        let mut opts = obj(json!({ "compilerOptions": { "target": "es2020" } }));
        set_prop(&mut opts, &["compilerOptions", "sourceMap"], json!(true));
        assert_eq!(
            Value::Object(opts),
            json!({ "compilerOptions": { "target": "es2020", "sourceMap": true } })
        );
    }

    #[test]
    fn test_set_prop_replaces_scalar_parent() {
        let mut opts = obj(json!({ "a": 1 }));
        set_prop(&mut opts, &["a", "b"], json!("x"));
        assert_eq!(Value::Object(opts), json!({ "a": { "b": "x" } }));
    }

    #[test]
    fn test_set_prop_empty_path_is_noop() {
        let mut opts = obj(json!({ "a": 1 }));
        set_prop(&mut opts, &[], json!(2));
        assert_eq!(Value::Object(opts), json!({ "a": 1 }));
    }

    #[test]
    fn test_assign_overwrites() {
        let mut opts = obj(json!({ "a": 1, "b": 1 }));
        assign(&mut opts, &json!({ "a": 2 }));
        assign(&mut opts, &json!(false));
        assert_eq!(Value::Object(opts), json!({ "a": 2, "b": 1 }));
    }

    #[test]
    fn test_flag() {
        let opts = json!({ "stripIndent": true, "js": "yes" });
        assert!(flag(Some(&opts), "stripIndent"));
        assert!(!flag(Some(&opts), "js"));
        assert!(!flag(Some(&opts), "missing"));
        assert!(!flag(None, "stripIndent"));
    }
}

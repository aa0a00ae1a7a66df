//! Deep-merge over parsed YAML values
//!
//! Implements the layer merge with:
//! - Mappings: deep-merge by key
//! - Sequences: REPLACE (overlay wins entirely)
//! - Scalars: override (overlay wins)

use serde_yaml::Value;

/// Deep merge two YAML values.
///
/// Merge semantics:
/// - Mappings: deep-merge by key (recursive)
/// - Sequences: REPLACE (overlay wins entirely, no concatenation)
/// - Scalars and anything else: override (overlay wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both mappings: deep merge
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }

        // Sequences: REPLACE (no concatenation, no index merge)
        (Value::Sequence(_), overlay @ Value::Sequence(_)) => overlay,

        // Scalars and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_scalar_override() {
        let base = yaml("hostname: alpha");
        let overlay = yaml("hostname: beta");
        let result = deep_merge(base, overlay);
        assert_eq!(result["hostname"], yaml("beta"));
    }

    #[test]
    fn test_mapping_deep_merge() {
        let base = yaml(
            "nameservers:\n  addresses: [1.1.1.1]\n  search: [example.org]",
        );
        let overlay = yaml("nameservers:\n  addresses: [8.8.8.8]");
        let result = deep_merge(base, overlay);

        // addresses should be overridden
        assert_eq!(result["nameservers"]["addresses"], yaml("[8.8.8.8]"));
        // search should be preserved
        assert_eq!(result["nameservers"]["search"], yaml("[example.org]"));
    }

    #[test]
    fn test_sequence_replace() {
        let base = yaml("keys: [a, b, c]");
        let overlay = yaml("keys: [x, y]");
        let result = deep_merge(base, overlay);

        // Sequence should be completely replaced
        let keys = result["keys"].as_sequence().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], yaml("x"));
        assert_eq!(keys[1], yaml("y"));
    }

    #[test]
    fn test_add_new_key() {
        let base = yaml("a: 1\nb: 2");
        let overlay = yaml("b: 3\nc: 4");
        let result = deep_merge(base, overlay);

        assert_eq!(result["a"], yaml("1"));
        assert_eq!(result["b"], yaml("3"));
        assert_eq!(result["c"], yaml("4"));
    }

    #[test]
    fn test_null_override() {
        let base = yaml("value: 100");
        let overlay = yaml("value: null");
        let result = deep_merge(base, overlay);

        assert!(result["value"].is_null());
    }

    #[test]
    fn test_merge_idempotent() {
        let doc = yaml("a: 1\nnested:\n  b: [1, 2]\n  c: text");
        let result = deep_merge(doc.clone(), doc.clone());
        assert_eq!(result, doc);
    }

    #[test]
    fn test_merge_layers() {
        let profile = yaml("hostname: base\nusers: [root]");
        let overrides = yaml("hostname: web-1");
        let flags = yaml("users: [admin]");

        let result = merge_layers(vec![profile, overrides, flags]);

        assert_eq!(result["hostname"], yaml("web-1"));
        assert_eq!(result["users"], yaml("[admin]"));
    }

    #[test]
    fn test_nested_deep_merge() {
        let base = yaml("level1:\n  level2:\n    a: 1\n    b: 2");
        let overlay = yaml("level1:\n  level2:\n    b: 3\n    c: 4");
        let result = deep_merge(base, overlay);

        assert_eq!(result["level1"]["level2"]["a"], yaml("1"));
        assert_eq!(result["level1"]["level2"]["b"], yaml("3"));
        assert_eq!(result["level1"]["level2"]["c"], yaml("4"));
    }
}

//! Terraform state and configuration values
//!
//! Resource configuration and state travel through the provider as a
//! dynamically typed attribute tree. Nested configuration blocks are
//! represented as single-element lists of maps, which keeps the shape
//! identical between blocks and repeated blocks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Dynamic value that can be encoded/decoded from Terraform state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<DynamicValue>),
    Map(HashMap<String, DynamicValue>),
}

impl DynamicValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, DynamicValue>> {
        match self {
            DynamicValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_map()?.get(key)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    /// Insert or replace an attribute. No-op unless `self` is a map.
    pub fn set(&mut self, key: &str, value: DynamicValue) {
        if let DynamicValue::Map(m) = self {
            m.insert(key.to_string(), value);
        }
    }
}

impl Default for DynamicValue {
    fn default() -> Self {
        DynamicValue::Null
    }
}

/// Helper to extract a string attribute from a DynamicValue
pub fn get_string_attr(value: &DynamicValue, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_string())
        .unwrap_or("")
        .to_string()
}

/// Helper to extract an optional string attribute from a DynamicValue
pub fn get_optional_string_attr(value: &DynamicValue, key: &str) -> Option<String> {
    value.get(key).and_then(|v| match v {
        DynamicValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Helper to extract an integer attribute from a DynamicValue
pub fn get_int_attr(value: &DynamicValue, key: &str, default: i64) -> i64 {
    value.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

/// Helper to extract an optional integer attribute from a DynamicValue
pub fn get_optional_int_attr(value: &DynamicValue, key: &str) -> Option<i64> {
    value.get(key).and_then(|v| v.as_i64())
}

/// Helper to extract a float attribute from a DynamicValue
pub fn get_float_attr(value: &DynamicValue, key: &str, default: f64) -> f64 {
    value.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

/// Helper to extract a bool attribute from a DynamicValue
pub fn get_bool_attr(value: &DynamicValue, key: &str, default: bool) -> bool {
    value.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// Helper to extract an optional bool attribute from a DynamicValue
pub fn get_optional_bool_attr(value: &DynamicValue, key: &str) -> Option<bool> {
    value.get(key).and_then(|v| v.as_bool())
}

/// Helper to extract a list of strings; absent or null yields an empty vec.
pub fn get_string_list(value: &DynamicValue, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_list())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_string().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Helper to extract a string-to-string map attribute (labels, metadata).
pub fn get_map_attr(value: &DynamicValue, key: &str) -> HashMap<String, String> {
    value
        .get(key)
        .and_then(|v| v.as_map())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_string().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// First element of a nested block attribute, if the block is set.
///
/// Blocks are stored as single-element lists of maps. An absent key, a
/// null value, or an empty list all mean "block not configured".
pub fn get_block<'a>(value: &'a DynamicValue, key: &str) -> Option<&'a DynamicValue> {
    match value.get(key)? {
        DynamicValue::List(items) => items.first(),
        DynamicValue::Null => None,
        other => Some(other),
    }
}

/// Create a DynamicValue map with the given attributes
pub fn make_state(attrs: Vec<(&str, DynamicValue)>) -> DynamicValue {
    let mut map = HashMap::new();
    for (key, value) in attrs {
        map.insert(key.to_string(), value);
    }
    DynamicValue::Map(map)
}

/// Wrap a set of attributes into the single-element-list block shape.
pub fn block_value(attrs: Vec<(&str, DynamicValue)>) -> DynamicValue {
    DynamicValue::List(vec![make_state(attrs)])
}

/// Create a string DynamicValue
pub fn string_value(s: impl Into<String>) -> DynamicValue {
    DynamicValue::String(s.into())
}

/// Create a number DynamicValue from i64
pub fn int_value(n: i64) -> DynamicValue {
    DynamicValue::Number(serde_json::Number::from(n))
}

/// Create a number DynamicValue from f64
pub fn float_value(n: f64) -> DynamicValue {
    serde_json::Number::from_f64(n)
        .map(DynamicValue::Number)
        .unwrap_or(DynamicValue::Null)
}

/// Create a bool DynamicValue
pub fn bool_value(b: bool) -> DynamicValue {
    DynamicValue::Bool(b)
}

/// Create a null DynamicValue
pub fn null_value() -> DynamicValue {
    DynamicValue::Null
}

/// Create a list DynamicValue of strings
pub fn string_list_value<I, S>(items: I) -> DynamicValue
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    DynamicValue::List(items.into_iter().map(string_value).collect())
}

/// Create a string-to-string map DynamicValue
pub fn string_map_value(m: &HashMap<String, String>) -> DynamicValue {
    DynamicValue::Map(
        m.iter()
            .map(|(k, v)| (k.clone(), string_value(v)))
            .collect(),
    )
}

/// Order-independent equality for set-typed list attributes.
pub fn set_eq(a: &DynamicValue, b: &DynamicValue) -> bool {
    match (a.as_list(), b.as_list()) {
        (Some(xs), Some(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut unmatched: Vec<&DynamicValue> = ys.iter().collect();
            for x in xs {
                match unmatched.iter().position(|y| *y == x) {
                    Some(i) => {
                        unmatched.swap_remove(i);
                    }
                    None => return false,
                }
            }
            true
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_absent_null_and_empty_are_equivalent() {
        let state = make_state(vec![
            ("null_block", null_value()),
            ("empty_block", DynamicValue::List(vec![])),
            ("set_block", block_value(vec![("x", int_value(1))])),
        ]);
        assert!(get_block(&state, "missing").is_none());
        assert!(get_block(&state, "null_block").is_none());
        assert!(get_block(&state, "empty_block").is_none());
        let block = get_block(&state, "set_block").unwrap();
        assert_eq!(get_int_attr(block, "x", 0), 1);
    }

    #[test]
    fn empty_block_map_is_present() {
        // A present block with no attributes set is distinct from an
        // absent block.
        let state = make_state(vec![("b", block_value(vec![]))]);
        assert!(get_block(&state, "b").is_some());
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = string_list_value(["alpha", "beta", "gamma"]);
        let b = string_list_value(["gamma", "alpha", "beta"]);
        let c = string_list_value(["alpha", "beta"]);
        assert!(set_eq(&a, &b));
        assert!(!set_eq(&a, &c));
    }

    #[test]
    fn set_equality_counts_duplicates() {
        let a = string_list_value(["x", "x", "y"]);
        let b = string_list_value(["x", "y", "y"]);
        assert!(!set_eq(&a, &b));
    }

    #[test]
    fn optional_string_treats_empty_as_unset() {
        let state = make_state(vec![("s", string_value(""))]);
        assert_eq!(get_optional_string_attr(&state, "s"), None);
        assert_eq!(get_string_attr(&state, "s"), "");
    }

    #[test]
    fn empty_list_differs_from_null() {
        let state = make_state(vec![
            ("cleared", DynamicValue::List(vec![])),
            ("unset", null_value()),
        ]);
        assert_eq!(state.get("cleared"), Some(&DynamicValue::List(vec![])));
        assert!(state.get("unset").unwrap().is_null());
        assert_ne!(state.get("cleared"), state.get("unset"));
    }
}

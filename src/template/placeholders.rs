//! Placeholder storage and lookup results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered name -> value mapping owned by a single template node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholders {
    values: IndexMap<String, Value>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Local value, no inheritance
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Local existence check, no inheritance
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a value; absent keys are ignored
    pub fn unset(&mut self, key: &str) -> &mut Self {
        self.values.shift_remove(key);
        self
    }

    /// Merge `other` into this store, `other` wins on key collisions
    pub fn merge(&mut self, other: &Placeholders) -> &mut Self {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        self
    }

    /// New store holding the union of both, `other` wins on key collisions
    pub fn merged(&self, other: &Placeholders) -> Placeholders {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Placeholders
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<IndexMap<String, Value>> for Placeholders {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

/// Outcome of resolving a placeholder through a node's inheritance chain
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Set on the node or one of its ancestors
    Found(Value),
    /// Not set anywhere in the chain, the caller's default was used
    UsedDefault(Value),
    /// Not set anywhere and no default given
    Undefined(String),
}

impl Lookup {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Lookup::Undefined(_))
    }

    /// The resolved value, `None` when undefined
    pub fn value(&self) -> Option<&Value> {
        match self {
            Lookup::Found(v) | Lookup::UsedDefault(v) => Some(v),
            Lookup::Undefined(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Found(v) | Lookup::UsedDefault(v) => Some(v),
            Lookup::Undefined(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_has_unset() {
        let mut store = Placeholders::new();
        store.set("title", "Home").set("count", 3);
        assert!(store.has("title"));
        assert_eq!(store.get("count"), Some(&json!(3)));

        store.unset("title").unset("missing");
        assert!(!store.has("title"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_null_value_counts_as_present() {
        let mut store = Placeholders::new();
        store.set("empty", Value::Null);
        assert!(store.has("empty"));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base: Placeholders = [("title", "layout"), ("lang", "en")].into_iter().collect();
        let overrides: Placeholders = [("title", "header")].into_iter().collect();
        base.merge(&overrides);
        assert_eq!(base.get("title"), Some(&json!("header")));
        assert_eq!(base.get("lang"), Some(&json!("en")));
    }

    #[test]
    fn test_merged_leaves_original_untouched() {
        let base: Placeholders = [("title", "layout")].into_iter().collect();
        let overrides: Placeholders = [("title", "header")].into_iter().collect();
        let merged = base.merged(&overrides);
        assert_eq!(base.get("title"), Some(&json!("layout")));
        assert_eq!(merged.get("title"), Some(&json!("header")));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let store: Placeholders = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_lookup_values() {
        assert_eq!(Lookup::Found(json!("x")).value(), Some(&json!("x")));
        assert!(Lookup::Undefined("x".into()).is_undefined());
        assert_eq!(Lookup::UsedDefault(json!(1)).into_value(), Some(json!(1)));
    }
}

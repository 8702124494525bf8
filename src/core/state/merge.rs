//! Deep merge and path addressing over JSON trees.

use serde_json::{Map, Value};
use std::fmt;

/// Merges `patch` into `base` in place.
///
/// Objects merge key by key, recursively. Arrays, scalars and `null` replace
/// whatever was there.
pub fn deep_merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => merge_maps(base_map, patch_map),
        (slot, replacement) => *slot = replacement,
    }
}

fn merge_maps(base: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if let Some(existing) = base.get_mut(&key) {
            if existing.is_object() && value.is_object() {
                deep_merge(existing, value);
                continue;
            }
        }
        base.insert(key, value);
    }
}

/// Returns `base` with `patch` merged on top, leaving both inputs untouched.
pub fn merged(base: &Value, patch: &Value) -> Value {
    let mut out = base.clone();
    deep_merge(&mut out, patch.clone());
    out
}

/// A dot-separated address into the state tree, e.g. `settings.theme`.
///
/// The empty path addresses the whole tree. When reading, numeric segments
/// index arrays; see [`partial_from_path`] for writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatePath {
    segments: Vec<String>,
}

impl StatePath {
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The sub-tree at this path, if it exists.
    pub fn lookup<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(tree, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            })
    }

    /// True when the sub-tree at this path differs between the two trees.
    pub fn changed(&self, before: &Value, after: &Value) -> bool {
        self.lookup(before) != self.lookup(after)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for StatePath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for StatePath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// Wraps `value` in nested objects so it lands at `path` when merged.
///
/// Every segment becomes an object key, numeric ones included, so array
/// elements cannot be written through a path; replace the whole array.
///
/// `partial_from_path("settings.theme", json!("dark"))` yields
/// `{"settings": {"theme": "dark"}}`.
pub fn partial_from_path(path: &StatePath, value: Value) -> Value {
    path.segments().iter().rev().fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.clone(), inner);
        Value::Object(map)
    })
}

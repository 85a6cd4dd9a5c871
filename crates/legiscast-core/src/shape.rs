//! Shape resolution for upstream collection fields.
//!
//! The bill-data API returns every collection-valued field (sponsors,
//! committees, cosponsors, subjects, text formats) in one of several shapes:
//! absent, a bare scalar, a single object, a list of objects, or any of those
//! wrapped in an `{"item": ...}` envelope left over from XML conversion.
//!
//! [`Collection::resolve`] collapses all of them into one tagged union, once,
//! so no code downstream ever branches on JSON types. The `field_*` helpers do
//! the same for scalar fields, trying each alias in order and degrading to an
//! empty value instead of failing.

use serde_json::{Map, Value};

/// A single upstream object.
pub type RawMap = Map<String, Value>;

/// Envelope key used by XML-converted payloads.
const ITEM_KEY: &str = "item";

/// Key a bare scalar is lifted under when it stands in for an object.
const SCALAR_KEY: &str = "name";

/// A collection-valued upstream field after shape resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Collection {
    #[default]
    Empty,
    Single(RawMap),
    Many(Vec<RawMap>),
}

impl Collection {
    /// Resolve a raw field value into a collection.
    ///
    /// - absent / `null` / numbers / booleans / blank strings → `Empty`
    /// - a non-blank string → `Single({"name": s})`
    /// - an object with an `item` key → the resolution of the inner value
    /// - any other object → `Single`
    /// - a list → `Many`, keeping objects and non-blank strings, dropping the rest
    pub fn resolve(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => match map.get(ITEM_KEY) {
                Some(inner) => Self::resolve(Some(inner)),
                None => Self::Single(map.clone()),
            },
            Some(Value::Array(items)) => {
                Self::Many(items.iter().filter_map(lift_element).collect())
            }
            Some(Value::String(s)) => match lift_scalar(s) {
                Some(map) => Self::Single(map),
                None => Self::Empty,
            },
            _ => Self::Empty,
        }
    }

    /// Resolve the first present key among `keys` on `parent`.
    pub fn field(parent: &RawMap, keys: &[&str]) -> Self {
        Self::resolve(keys.iter().find_map(|k| parent.get(*k)))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the resolved objects in upstream order.
    pub fn iter(&self) -> std::slice::Iter<'_, RawMap> {
        match self {
            Self::Empty => <&[RawMap]>::default().iter(),
            Self::Single(map) => std::slice::from_ref(map).iter(),
            Self::Many(items) => items.iter(),
        }
    }

    /// Flatten into an ordered sequence of objects.
    pub fn into_vec(self) -> Vec<RawMap> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(map) => vec![map],
            Self::Many(items) => items,
        }
    }
}

fn lift_element(value: &Value) -> Option<RawMap> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => lift_scalar(s),
        _ => None,
    }
}

fn lift_scalar(s: &str) -> Option<RawMap> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut map = RawMap::new();
    map.insert(SCALAR_KEY.to_string(), Value::String(trimmed.to_string()));
    Some(map)
}

// ── Scalar field helpers ──

/// Follow a path of object keys, returning the value at the end.
pub fn nested<'a>(map: &'a RawMap, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = map.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// First non-blank string (or number rendered as a string) among `keys`.
pub fn field_opt(map: &RawMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| scalar_string(map.get(*k)?))
}

/// Like [`field_opt`] but degrades to an empty string.
pub fn field_str(map: &RawMap, keys: &[&str]) -> String {
    field_opt(map, keys).unwrap_or_default()
}

/// String at the end of a nested path, or empty.
pub fn nested_str(map: &RawMap, path: &[&str]) -> String {
    nested(map, path)
        .and_then(scalar_string)
        .unwrap_or_default()
}

/// First value among `keys` interpretable as a non-negative integer.
pub fn field_u64(map: &RawMap, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| match map.get(*k)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// First value among `keys` interpretable as a boolean.
pub fn field_bool(map: &RawMap, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| match map.get(*k)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Names of every entry in a collection field, skipping blanks.
pub fn names(parent: &RawMap, keys: &[&str]) -> Vec<String> {
    Collection::field(parent, keys)
        .iter()
        .filter_map(|m| field_opt(m, &["name", "fullName", "systemCode"]))
        .collect()
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

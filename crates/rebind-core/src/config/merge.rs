//! Structured key merge.
//!
//! Fragments arrive in store insertion order. A map merge is last write wins
//! per sub-key; a list merge appends.

use serde_json::{Map, Value};
use tracing::debug;

use super::key::KeyShape;

/// One resolved fragment of a structured key.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Stored under the key's own name.
    Whole(Value),
    /// Stored under `name.<sub>`.
    Element(String, Value),
}

pub fn merge(shape: &KeyShape, fragments: Vec<Fragment>) -> Value {
    match shape {
        KeyShape::List => merge_list(fragments),
        _ => merge_map(fragments),
    }
}

pub fn merge_map(fragments: Vec<Fragment>) -> Value {
    let mut merged = Map::new();
    for fragment in fragments {
        match fragment {
            Fragment::Whole(Value::Object(entries)) => merged.extend(entries),
            Fragment::Whole(Value::Null) => {}
            Fragment::Whole(other) => {
                debug!(value = %other, "Ignoring non-map fragment of a map key");
            }
            Fragment::Element(sub, value) => {
                merged.insert(sub, value);
            }
        }
    }
    Value::Object(merged)
}

pub fn merge_list(fragments: Vec<Fragment>) -> Value {
    let mut merged = Vec::new();
    for fragment in fragments {
        match fragment {
            Fragment::Whole(Value::Array(items)) => merged.extend(items),
            Fragment::Whole(Value::Null) => {}
            Fragment::Whole(other) | Fragment::Element(_, other) => merged.push(other),
        }
    }
    Value::Array(merged)
}

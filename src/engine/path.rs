//! Field-path navigation over JSON documents

use serde_json::Value;

/// Walk `segments` from `root`, returning `None` as soon as a segment is absent
///
/// Mapping nodes are indexed by key. Sequence nodes accept a non-negative
/// integer segment. Any other node ends the walk.
pub fn get_path<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Like [`get_path`], cloning the result and mapping absence to `null`
pub fn resolve_or_null<S: AsRef<str>>(root: &Value, segments: &[S]) -> Value {
    get_path(root, segments).cloned().unwrap_or(Value::Null)
}

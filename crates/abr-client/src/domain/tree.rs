//! Read-only traversal of a state document.
//!
//! Lookups treat numeric segments as array indices. The walk visits every
//! node depth-first, objects in key insertion order and arrays by index;
//! an empty object is neither visited nor descended into.

use serde_json::Value;

use crate::domain::path::StatePath;

/// Resolve a path; `None` when any segment is absent.
pub fn get<'a>(root: &'a Value, path: &StatePath) -> Option<&'a Value> {
    get_segments(root, path.segments())
}

/// Resolve a list of raw segments.
pub fn get_segments<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| step(node, segment.as_ref()))
}

fn step<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Whether every segment resolves.
pub fn key_exists<S: AsRef<str>>(root: &Value, segments: &[S]) -> bool {
    get_segments(root, segments).is_some()
}

/// Element count of an array or key count of an object at `segments`.
pub fn length<S: AsRef<str>>(root: &Value, segments: &[S]) -> Option<usize> {
    match get_segments(root, segments)? {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

/// Lazy depth-first iterator of `(path, node)` pairs.
///
/// Single pass: once exhausted it stays exhausted.
pub struct Walk<'a> {
    stack: Vec<(StatePath, &'a Value)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (StatePath, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        // Children go on in reverse so the first one is popped first.
        match node {
            Value::Object(map) => {
                for (key, child) in map.iter().rev() {
                    if is_walkable(child) {
                        self.stack.push((path.child(key.as_str()), child));
                    }
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    if is_walkable(child) {
                        self.stack.push((path.child(index.to_string()), child));
                    }
                }
            }
            _ => {}
        }
        Some((path, node))
    }
}

fn is_walkable(node: &Value) -> bool {
    !matches!(node, Value::Object(map) if map.is_empty())
}

/// Walk the subtree rooted at `start`. Yields nothing if `start` does not
/// resolve or is an empty object.
pub fn walk<'a>(root: &'a Value, start: &StatePath) -> Walk<'a> {
    let stack = match get(root, start) {
        Some(node) if is_walkable(node) => vec![(start.clone(), node)],
        _ => Vec::new(),
    };
    Walk { stack }
}

/// Every visited node for which `predicate` holds.
pub fn find_all<'a, P>(root: &'a Value, start: &StatePath, predicate: P) -> Vec<&'a Value>
where
    P: Fn(&Value) -> bool,
{
    walk(root, start)
        .filter(|(_, node)| predicate(*node))
        .map(|(_, node)| node)
        .collect()
}

/// Paths of every visited node for which `predicate` holds.
pub fn find_paths<P>(root: &Value, start: &StatePath, predicate: P) -> Vec<StatePath>
where
    P: Fn(&Value) -> bool,
{
    walk(root, start)
        .filter(|(_, node)| predicate(*node))
        .map(|(path, _)| path)
        .collect()
}

/// Top-level keys added, removed or changed between two documents.
pub fn changed_keys(previous: &Value, current: &Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let prev = previous.as_object().unwrap_or(&empty);
    let cur = current.as_object().unwrap_or(&empty);

    let mut keys: Vec<String> = cur
        .iter()
        .filter(|(k, v)| prev.get(k.as_str()) != Some(*v))
        .map(|(k, _)| k.clone())
        .chain(prev.keys().filter(|k| !cur.contains_key(k.as_str())).cloned())
        .collect();
    keys.sort();
    keys
}

//! Paths to the places a placeholder occurs inside a JSON tree.

use serde_json::Value;

/// One step from a container to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Segment {
    /// Object property name.
    Key(String),
    /// Array index.
    Index(usize),
}

/// Where a placeholder was seen: a string value, or an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Location {
    pub(crate) path: Vec<Segment>,
    pub(crate) in_key: bool,
}

impl Location {
    pub(crate) const fn value(path: Vec<Segment>) -> Self {
        Self {
            path,
            in_key: false,
        }
    }

    pub(crate) const fn key(path: Vec<Segment>) -> Self {
        Self { path, in_key: true }
    }

    /// Rewrites this location after `old` was renamed to `new` under `parent`.
    pub(crate) fn rename_key(&mut self, parent: &[Segment], old: &str, new: &str) {
        let Some(rest) = self.path.strip_prefix(parent) else {
            return;
        };
        if !matches!(rest.first(), Some(Segment::Key(key)) if key == old) {
            return;
        }
        if let Some(segment) = self.path.get_mut(parent.len()) {
            *segment = Segment::Key(new.to_owned());
        }
    }
}

pub(crate) fn value_at_mut<'a>(root: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |current, segment| match segment {
        Segment::Key(key) => current.as_object_mut()?.get_mut(key),
        Segment::Index(index) => current.as_array_mut()?.get_mut(*index),
    })
}

/// Collects every string value and every object key that may hold a placeholder.
pub(crate) fn collect_texts(
    value: &Value,
    path: &mut Vec<Segment>,
    out: &mut Vec<(Location, String)>,
) {
    match value {
        Value::String(text) => out.push((Location::value(path.clone()), text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                collect_texts(item, path, out);
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                path.push(Segment::Key(key.clone()));
                if key.contains("${") {
                    out.push((Location::key(path.clone()), key.clone()));
                }
                collect_texts(item, path, out);
                path.pop();
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

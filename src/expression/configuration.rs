//! Placeholder-tracking wrapper around a JSON configuration tree.

use super::location::{Location, Segment, collect_texts, value_at_mut};
use super::scan::placeholders;
use super::{Replacement, Resolution, Unresolved};
use crate::platform::Platform;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;

const STRING_ROOT_KEY: &str = "value";

#[derive(Debug)]
struct Entry {
    replacement: Replacement,
    locations: Vec<Location>,
    resolution: Option<Resolution>,
}

/// A parsed configuration value with every `${...}` placeholder tracked.
///
/// Resolving a placeholder rewrites the tree in place. Values that themselves
/// contain placeholders are scanned again, so nested variables surface through
/// [`ConfigurationExpression::unresolved`] without a second parse.
#[derive(Debug)]
pub struct ConfigurationExpression {
    root: Value,
    string_root: bool,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    subscribers: Vec<mpsc::UnboundedSender<Replacement>>,
}

impl ConfigurationExpression {
    /// Parses `value` using the host platform's overlay key.
    #[must_use]
    pub fn parse(value: Value) -> Self {
        Self::parse_for_platform(value, Platform::current())
    }

    /// Parses `value`, merging the overlay object for `platform` into the root.
    ///
    /// A bare string is wrapped so that the same machinery applies, and
    /// [`ConfigurationExpression::to_object`] unwraps it again.
    #[must_use]
    pub fn parse_for_platform(value: Value, platform: Platform) -> Self {
        let (mut root, string_root) = match value {
            Value::String(text) => {
                let mut wrapper = Map::new();
                wrapper.insert(STRING_ROOT_KEY.to_owned(), Value::String(text));
                (Value::Object(wrapper), true)
            }
            other => (other, false),
        };
        if let Value::Object(map) = &mut root {
            apply_platform_overlay(map, platform);
        }

        let mut texts = Vec::new();
        collect_texts(&root, &mut Vec::new(), &mut texts);

        let mut expression = Self {
            root,
            string_root,
            entries: Vec::new(),
            index: HashMap::new(),
            subscribers: Vec::new(),
        };
        for (location, text) in texts {
            expression.record(&location, &text, &[]);
        }
        expression
    }

    /// Returns a cursor over placeholders that still lack a resolution.
    ///
    /// The cursor is seeded with the current unresolved set and keeps
    /// receiving placeholders uncovered by later calls to
    /// [`ConfigurationExpression::resolve`].
    pub fn unresolved(&mut self) -> Unresolved {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.push(sender);
        let pending = self
            .entries
            .iter()
            .filter(|entry| entry.resolution.is_none())
            .map(|entry| entry.replacement.clone())
            .collect::<VecDeque<_>>();
        Unresolved::new(pending, receiver)
    }

    /// Returns `true` when at least one placeholder lacks a resolution.
    #[must_use]
    pub fn has_unresolved(&self) -> bool {
        self.entries.iter().any(|entry| entry.resolution.is_none())
    }

    /// Returns `true` when `replacement` has been resolved.
    #[must_use]
    pub fn is_resolved(&self, replacement: &Replacement) -> bool {
        self.index
            .get(replacement.id())
            .and_then(|position| self.entries.get(*position))
            .is_some_and(|entry| entry.resolution.is_some())
    }

    /// Looks up a tracked placeholder by its literal id.
    #[must_use]
    pub fn replacement(&self, id: &str) -> Option<&Replacement> {
        self.index
            .get(id)
            .and_then(|position| self.entries.get(*position))
            .map(|entry| &entry.replacement)
    }

    /// Records a resolution for `replacement` and substitutes it everywhere.
    pub fn resolve(&mut self, replacement: &Replacement, data: impl Into<Resolution>) {
        let resolution = data.into();
        let position = self.entry_position(replacement);
        let Some(entry) = self.entries.get_mut(position) else {
            return;
        };
        entry.resolution = Some(resolution.clone());
        let Some(value) = resolution.value else {
            return;
        };

        let visited = [replacement.id().to_owned()];
        let mut cursor = 0;
        while let Some(location) = self
            .entries
            .get(position)
            .and_then(|current| current.locations.get(cursor))
            .cloned()
        {
            self.substitute(&location, replacement.id(), &value, &visited);
            cursor += 1;
        }
    }

    /// Every resolved placeholder with its resolution, in discovery order.
    pub fn resolved(&self) -> impl Iterator<Item = (&Replacement, &Resolution)> {
        self.entries.iter().filter_map(|entry| {
            entry
                .resolution
                .as_ref()
                .map(|resolution| (&entry.replacement, resolution))
        })
    }

    /// Returns a copy of the current tree, unwrapping a bare-string input.
    #[must_use]
    pub fn to_object(&self) -> Value {
        self.clone_root()
    }

    /// Consumes the expression and returns its tree.
    #[must_use]
    pub fn into_value(mut self) -> Value {
        if self.string_root {
            return take_string_root(&mut self.root);
        }
        self.root
    }

    fn clone_root(&self) -> Value {
        if self.string_root {
            return self
                .root
                .get(STRING_ROOT_KEY)
                .cloned()
                .unwrap_or_default();
        }
        self.root.clone()
    }

    fn entry_position(&mut self, replacement: &Replacement) -> usize {
        if let Some(position) = self.index.get(replacement.id()) {
            return *position;
        }
        let position = self.entries.len();
        self.entries.push(Entry {
            replacement: replacement.clone(),
            locations: Vec::new(),
            resolution: None,
        });
        self.index.insert(replacement.id().to_owned(), position);
        position
    }

    /// Scans `text` and tracks each placeholder at `location`.
    fn record(&mut self, location: &Location, text: &str, visited: &[String]) {
        let mut seen = Vec::new();
        for found in placeholders(text) {
            if visited.iter().any(|id| id == found.id()) || seen.contains(&found) {
                continue;
            }
            self.add_location(&found, location, visited);
            seen.push(found);
        }
    }

    fn add_location(&mut self, found: &Replacement, location: &Location, visited: &[String]) {
        let is_new = !self.index.contains_key(found.id());
        let position = self.entry_position(found);
        let Some(entry) = self.entries.get_mut(position) else {
            return;
        };
        if !entry.locations.contains(location) {
            entry.locations.push(location.clone());
        }

        let resolved_value = entry
            .resolution
            .as_ref()
            .and_then(|resolution| resolution.value.clone());
        match resolved_value {
            Some(value) => {
                let mut path = visited.to_vec();
                path.push(found.id().to_owned());
                self.substitute(location, found.id(), &value, &path);
            }
            None if is_new => self.publish(found),
            None => {}
        }
    }

    fn publish(&mut self, found: &Replacement) {
        self.subscribers
            .retain(|subscriber| subscriber.send(found.clone()).is_ok());
    }

    fn substitute(&mut self, location: &Location, id: &str, value: &str, visited: &[String]) {
        if location.in_key {
            self.substitute_key(location, id, value, visited);
            return;
        }
        let Some(Value::String(text)) = value_at_mut(&mut self.root, &location.path) else {
            return;
        };
        if !text.contains(id) {
            return;
        }
        *text = text.replace(id, value);
        self.record(location, value, visited);
    }

    fn substitute_key(&mut self, location: &Location, id: &str, value: &str, visited: &[String]) {
        let Some((Segment::Key(old_key), parent)) = location.path.split_last() else {
            return;
        };
        if !old_key.contains(id) {
            return;
        }
        let new_key = old_key.replace(id, value);
        let Some(Value::Object(map)) = value_at_mut(&mut self.root, parent) else {
            return;
        };
        let Some(moved) = map.remove(old_key) else {
            return;
        };
        map.insert(new_key.clone(), moved);

        for entry in &mut self.entries {
            for tracked in &mut entry.locations {
                tracked.rename_key(parent, old_key, &new_key);
            }
        }

        let mut renamed_path = parent.to_vec();
        renamed_path.push(Segment::Key(new_key));
        self.record(&Location::key(renamed_path), value, visited);
    }
}

fn apply_platform_overlay(map: &mut Map<String, Value>, platform: Platform) {
    if let Some(Value::Object(overlay)) = map.get(platform.overlay_key()).cloned() {
        for (key, value) in overlay {
            map.insert(key, value);
        }
    }
    for key in Platform::all_overlay_keys() {
        map.remove(key);
    }
}

fn take_string_root(root: &mut Value) -> Value {
    root.as_object_mut()
        .and_then(|map| map.remove(STRING_ROOT_KEY))
        .unwrap_or_default()
}

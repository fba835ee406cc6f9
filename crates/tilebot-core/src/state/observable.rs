// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::StateError;
use crate::subscription::Subscription;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A state observer. It receives the value currently stored at its path.
pub type Observer = Rc<dyn Fn(&Value)>;

struct ObserverEntry {
    id: u64,
    path: String,
    callback: Observer,
}

struct StateInner {
    tree: RefCell<Value>,
    observers: RefCell<Vec<ObserverEntry>>,
    next_id: Cell<u64>,
}

/// The single mutable application state tree.
///
/// Values are addressed by dot-separated paths (`"hero.x"`,
/// `"mapData.map.0.2"`); the empty path is the root. Numeric segments index
/// into arrays. Every [`set`](Self::set) notifies the observers of the written
/// path and of each of its ancestors, nearest first, so a widget observing
/// `"hero"` hears about a write to `"hero.x"`.
///
/// The handle is cheap to clone; every clone shares the same tree.
#[derive(Clone)]
pub struct ObservableState {
    inner: Rc<StateInner>,
}

fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

fn lookup<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments.iter().try_fold(node, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn parse_index(segment: &str, path: &str) -> Result<usize, StateError> {
    segment.parse().map_err(|_| StateError::NotAnIndex {
        path: path.to_string(),
        segment: segment.to_string(),
    })
}

/// Descends one segment, creating an empty mapping when the segment is
/// missing and replacing scalar intermediates with a mapping.
fn child_mut<'a>(node: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value, StateError> {
    match node {
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            let len = items.len();
            items.get_mut(index).ok_or_else(|| StateError::IndexOutOfBounds {
                path: path.to_string(),
                index,
                len,
            })
        }
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        other => {
            *other = Value::Object(Map::new());
            child_mut(other, segment, path)
        }
    }
}

fn write_at(root: &mut Value, segments: &[&str], path: &str, value: Value) -> Result<(), StateError> {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };
    let mut cursor = root;
    for segment in parents {
        cursor = child_mut(cursor, segment, path)?;
    }
    match cursor {
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            let len = items.len();
            match items.get_mut(index) {
                Some(slot) => *slot = value,
                None => {
                    return Err(StateError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len,
                    })
                }
            }
        }
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
        }
        other => {
            let mut map = Map::new();
            map.insert((*last).to_string(), value);
            *other = Value::Object(map);
        }
    }
    Ok(())
}

impl ObservableState {
    /// Creates a state tree holding `root`.
    pub fn new(root: Value) -> Self {
        Self {
            inner: Rc::new(StateInner {
                tree: RefCell::new(root),
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Creates a state tree from a typed value.
    pub fn from_typed<T: Serialize>(root: &T) -> Result<Self, StateError> {
        let value = serde_json::to_value(root).map_err(|source| StateError::Encode {
            path: String::new(),
            source,
        })?;
        Ok(Self::new(value))
    }

    /// Returns a copy of the value at `path`, or `None` when any segment is
    /// absent.
    pub fn get(&self, path: &str) -> Option<Value> {
        lookup(&self.inner.tree.borrow(), &segments(path)).cloned()
    }

    /// Runs `f` on the value at `path` without copying it.
    pub fn with<R>(&self, path: &str, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let tree = self.inner.tree.borrow();
        f(lookup(&tree, &segments(path)))
    }

    /// Returns `true` when a value is stored at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.with(path, |v| v.is_some())
    }

    /// Deserializes the value at `path`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, StateError> {
        let value = self.get(path).ok_or_else(|| StateError::Missing {
            path: path.to_string(),
        })?;
        serde_json::from_value(value).map_err(|source| StateError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// A full copy of the tree.
    pub fn snapshot(&self) -> Value {
        self.inner.tree.borrow().clone()
    }

    /// Replaces the value at `path`, creating intermediate mappings, then
    /// notifies the observers of `path` and of every ancestor.
    ///
    /// ## Arguments
    /// * `path` - Dot-separated path; `""` is the root. Numeric segments index
    ///   into existing arrays.
    /// * `value` - The new value.
    ///
    /// ## Errors
    /// [`StateError`] when a segment under an array is not a valid index
    /// into it.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), StateError> {
        let segs = segments(path);
        {
            let mut tree = self.inner.tree.borrow_mut();
            write_at(&mut tree, &segs, path, value.into())?;
        }
        log::trace!("State set at '{path}'.");
        self.notify(&segs);
        Ok(())
    }

    /// Serializes `value` and stores it at `path`.
    pub fn set_as<T: Serialize>(&self, path: &str, value: &T) -> Result<(), StateError> {
        let value = serde_json::to_value(value).map_err(|source| StateError::Encode {
            path: path.to_string(),
            source,
        })?;
        self.set(path, value)
    }

    /// Shallow-merges `partial` into the mapping at `path`, then sets it.
    /// A missing or non-mapping value is treated as an empty mapping.
    pub fn update(&self, path: &str, partial: Map<String, Value>) -> Result<(), StateError> {
        let mut merged = match self.get(path) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        merged.extend(partial);
        self.set(path, Value::Object(merged))
    }

    /// Registers `callback` for writes to `path` or to any path below it.
    pub fn observe<F>(&self, path: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.observers.borrow_mut().push(ObserverEntry {
            id,
            path: path.to_string(),
            callback: Rc::new(callback),
        });

        let weak: Weak<StateInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.borrow_mut().retain(|entry| entry.id != id);
            }
        })
    }

    /// Number of observers registered exactly on `path`.
    pub fn observer_count(&self, path: &str) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter(|entry| entry.path == path)
            .count()
    }

    fn notify(&self, segs: &[&str]) {
        for depth in (0..=segs.len()).rev() {
            let prefix = &segs[..depth];
            let path = prefix.join(".");
            let callbacks: Vec<Observer> = self
                .inner
                .observers
                .borrow()
                .iter()
                .filter(|entry| entry.path == path)
                .map(|entry| entry.callback.clone())
                .collect();
            if callbacks.is_empty() {
                continue;
            }
            let current = self.get(&path).unwrap_or(Value::Null);
            for callback in callbacks {
                callback(&current);
            }
        }
    }
}

impl Default for ObservableState {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl fmt::Debug for ObservableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableState")
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter(state: &ObservableState, path: &str) -> (Rc<RefCell<Vec<Value>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let sub = state.observe(path, move |v| s.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn get_missing_segment_is_none() {
        let state = ObservableState::new(json!({"hero": {"x": 1}}));
        assert_eq!(state.get("hero.x"), Some(json!(1)));
        assert_eq!(state.get("hero.y"), None);
        assert_eq!(state.get("hero.x.deeper"), None);
        assert_eq!(state.get("nothing.at.all"), None);
    }

    #[test]
    fn set_creates_intermediate_mappings() {
        let state = ObservableState::default();
        state.set("a.b.c", 3).unwrap();
        assert_eq!(state.get("a"), Some(json!({"b": {"c": 3}})));
    }

    #[test]
    fn set_replaces_scalar_intermediates() {
        let state = ObservableState::new(json!({"a": 5}));
        state.set("a.b", true).unwrap();
        assert_eq!(state.get("a"), Some(json!({"b": true})));
    }

    #[test]
    fn numeric_segments_index_arrays() {
        let state = ObservableState::new(json!({"map": [[0, 0], [0, "A"]]}));
        assert_eq!(state.get("map.1.1"), Some(json!("A")));
        state.set("map.0.1", "B").unwrap();
        assert_eq!(state.get("map.0"), Some(json!([0, "B"])));
        assert!(matches!(
            state.set("map.5.0", "C"),
            Err(StateError::IndexOutOfBounds { index: 5, len: 2, .. })
        ));
    }

    #[test]
    fn set_notifies_path_and_ancestors_once_with_current_value() {
        let state = ObservableState::new(json!({"hero": {"x": 0, "y": 0}, "mode": "play"}));
        let (leaf, _s1) = counter(&state, "hero.x");
        let (parent, _s2) = counter(&state, "hero");
        let (root, _s3) = counter(&state, "");
        let (sibling, _s4) = counter(&state, "hero.y");
        let (unrelated, _s5) = counter(&state, "mode");

        state.set("hero.x", 4).unwrap();

        assert_eq!(*leaf.borrow(), vec![json!(4)]);
        assert_eq!(*parent.borrow(), vec![json!({"x": 4, "y": 0})]);
        assert_eq!(root.borrow().len(), 1);
        assert!(sibling.borrow().is_empty());
        assert!(unrelated.borrow().is_empty());
    }

    #[test]
    fn observers_of_descendants_are_not_notified() {
        let state = ObservableState::new(json!({"hero": {"x": 0}}));
        let (leaf, _sub) = counter(&state, "hero.x");
        state.set("hero", json!({"x": 9})).unwrap();
        assert!(leaf.borrow().is_empty());
    }

    #[test]
    fn observers_run_in_registration_order() {
        let state = ObservableState::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = order.clone();
        let _a = state.observe("k", move |_| o1.borrow_mut().push(1));
        let o2 = order.clone();
        let _b = state.observe("k", move |_| o2.borrow_mut().push(2));

        state.set("k", 0).unwrap();
        state.set("k", 1).unwrap();
        assert_eq!(*order.borrow(), vec![1, 2, 1, 2]);
    }

    #[test]
    fn observer_sees_new_value_already_stored() {
        let state = ObservableState::default();
        let reader = state.clone();
        let seen = Rc::new(Cell::new(0));
        let s = seen.clone();
        let _sub = state.observe("count", move |_| {
            s.set(reader.get("count").and_then(|v| v.as_i64()).unwrap_or(-1));
        });
        state.set("count", 7).unwrap();
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn observer_may_write_state() {
        let state = ObservableState::default();
        let writer = state.clone();
        let _sub = state.observe("a", move |v| {
            let doubled = v.as_i64().unwrap_or(0) * 2;
            writer.set("b", doubled).unwrap();
        });
        state.set("a", 21).unwrap();
        assert_eq!(state.get("b"), Some(json!(42)));
    }

    #[test]
    fn update_merges_shallowly() {
        let state = ObservableState::new(json!({"program": {"speed": 2, "code": "up"}}));
        let mut partial = Map::new();
        partial.insert("running".into(), json!(true));
        partial.insert("speed".into(), json!(5));
        state.update("program", partial).unwrap();
        assert_eq!(
            state.get("program"),
            Some(json!({"speed": 5, "code": "up", "running": true}))
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let state = ObservableState::default();
        let (seen, sub) = counter(&state, "x");
        state.set("x", 1).unwrap();
        sub.unsubscribe();
        state.set("x", 2).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(state.observer_count("x"), 0);
    }

    #[test]
    fn typed_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Point {
            x: i32,
            y: i32,
        }
        let state = ObservableState::default();
        state.set_as("p", &Point { x: 1, y: 2 }).unwrap();
        assert_eq!(state.get_as::<Point>("p").unwrap(), Point { x: 1, y: 2 });
        assert!(matches!(
            state.get_as::<Point>("q"),
            Err(StateError::Missing { .. })
        ));
    }
}

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

//! A retained, headless render target.
//!
//! Extensions create nodes, tag them with a role and update string
//! attributes; a host (or a test) reads the tree back. Removing a node
//! removes its whole subtree.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Identifier of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One render node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The node id.
    pub id: NodeId,
    /// What the node represents (`"grid-cell"`, `"hero"`, ...).
    pub role: String,
    /// Parent node, `None` for a root.
    pub parent: Option<NodeId>,
    /// String attributes.
    pub attrs: BTreeMap<String, String>,
}

#[derive(Default)]
struct SurfaceInner {
    nodes: RefCell<BTreeMap<NodeId, Node>>,
    next_id: Cell<u64>,
}

/// Shared handle to the node tree. Clones see the same tree.
#[derive(Clone, Default)]
pub struct Surface {
    inner: Rc<SurfaceInner>,
}

impl Surface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node and returns its id.
    pub fn create(&self, role: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.nodes.borrow_mut().insert(
            id,
            Node {
                id,
                role: role.to_string(),
                parent,
                attrs: BTreeMap::new(),
            },
        );
        id
    }

    /// Sets an attribute. Returns `false` when the node does not exist.
    pub fn set_attr(&self, id: NodeId, key: &str, value: impl Into<String>) -> bool {
        match self.inner.nodes.borrow_mut().get_mut(&id) {
            Some(node) => {
                node.attrs.insert(key.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// Reads an attribute.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<String> {
        self.inner
            .nodes
            .borrow()
            .get(&id)
            .and_then(|node| node.attrs.get(key).cloned())
    }

    /// Removes a node and all of its descendants. Returns the number of
    /// nodes removed.
    pub fn remove(&self, id: NodeId) -> usize {
        let mut nodes = self.inner.nodes.borrow_mut();
        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(current) = pending.pop() {
            if nodes.remove(&current).is_some() {
                removed += 1;
            }
            pending.extend(
                nodes
                    .values()
                    .filter(|node| node.parent == Some(current))
                    .map(|node| node.id),
            );
        }
        removed
    }

    /// A copy of the node.
    pub fn get(&self, id: NodeId) -> Option<Node> {
        self.inner.nodes.borrow().get(&id).cloned()
    }

    /// Returns `true` when the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.nodes.borrow().contains_key(&id)
    }

    /// Direct children of a node, in creation order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .nodes
            .borrow()
            .values()
            .filter(|node| node.parent == Some(id))
            .map(|node| node.id)
            .collect()
    }

    /// Copies of every node with the given role, in creation order.
    pub fn nodes_with_role(&self, role: &str) -> Vec<Node> {
        self.inner
            .nodes
            .borrow()
            .values()
            .filter(|node| node.role == role)
            .cloned()
            .collect()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.inner.nodes.borrow().len()
    }

    /// Returns `true` when the surface holds no node.
    pub fn is_empty(&self) -> bool {
        self.inner.nodes.borrow().is_empty()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface").field("nodes", &self.len()).finish()
    }
}

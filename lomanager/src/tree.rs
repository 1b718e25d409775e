//! Arena-backed tree of virtual packages.
//!
//! Nodes live in a single vector and refer to each other by [`NodeId`].
//! Each node owns an ordered list of children; the parent index is a plain
//! back-reference used for upward lookups ("is my parent installed?") and
//! has no say in lifetimes. Node 0 is a synthetic root without payload.
//!
//! The shape of a tree is produced once by the inventory builder and never
//! changes afterwards: there is no API to reparent or remove nodes. Only the
//! flags of the packages are mutated between rebuilds.
//!
//! ```text
//! root
//! ├── Java
//! │   ├── OpenOffice core
//! │   └── LibreOffice core
//! │       └── language packs (same version)
//! └── Clipart core
//! ```

use std::fmt;

use crate::package::VirtualPackage;

/// Index of a node in a [`PackageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Node {
    package: Option<VirtualPackage>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree of virtual packages.
#[derive(Debug, Clone)]
pub struct PackageTree {
    nodes: Vec<Node>,
}

impl Default for PackageTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                package: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The synthetic root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of package nodes (root excluded).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the tree holds no packages.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a package as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, package: VirtualPackage) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "unknown parent node {}", parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            package: Some(package),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Whether `id` names a package node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 > 0 && id.0 < self.nodes.len()
    }

    /// Package stored at `id`; `None` for the root or unknown ids.
    pub fn get(&self, id: NodeId) -> Option<&VirtualPackage> {
        self.nodes.get(id.0).and_then(|n| n.package.as_ref())
    }

    /// Mutable package stored at `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut VirtualPackage> {
        self.nodes.get_mut(id.0).and_then(|n| n.package.as_mut())
    }

    /// Parent of `id`. The root's children report `Some(root)`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Parent package of `id`, skipping the root.
    pub fn parent_package(&self, id: NodeId) -> Option<&VirtualPackage> {
        self.parent(id).and_then(|p| self.get(p))
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Other children of `id`'s parent.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self
                .children(parent)
                .iter()
                .copied()
                .filter(|&c| c != id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// All package ids in depth-first pre-order, root excluded.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.children(self.root()).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Iterate over `(id, package)` pairs in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VirtualPackage)> + '_ {
        self.ids()
            .into_iter()
            .filter_map(move |id| self.get(id).map(|p| (id, p)))
    }

    /// First node (pre-order) whose package satisfies `predicate`.
    pub fn find<P>(&self, predicate: P) -> Option<NodeId>
    where
        P: Fn(&VirtualPackage) -> bool,
    {
        self.iter().find(|(_, p)| predicate(p)).map(|(id, _)| id)
    }

    /// All nodes whose package satisfies `predicate`.
    pub fn filter<P>(&self, predicate: P) -> Vec<NodeId>
    where
        P: Fn(&VirtualPackage) -> bool,
    {
        self.iter()
            .filter(|(_, p)| predicate(p))
            .map(|(id, _)| id)
            .collect()
    }

    /// Clear every resettable flag on every package.
    pub fn reset_flags(&mut self) {
        for node in self.nodes.iter_mut() {
            if let Some(pkg) = node.package.as_mut() {
                pkg.flags.reset();
                pkg.saved_removal = None;
            }
        }
    }

    /// Apply `f` to every package.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut VirtualPackage),
    {
        for node in self.nodes.iter_mut() {
            if let Some(pkg) = node.package.as_mut() {
                f(pkg);
            }
        }
    }
}

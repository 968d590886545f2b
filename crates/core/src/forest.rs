//! Forest construction from a flat record list and a resolved parent map.
//!
//! Nodes live in a [`NodeArena`]: a flat table indexed by [`NodeId`] with
//! explicit child lists, so no subtree is ever shared between two parents
//! and the cycle check is a walk up parent indices.

use crate::lineage::ParentMap;
use crate::{ChatRecord, SortConfig};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use tracing::{debug, warn};

/// Trees with at most this many nodes start expanded.
pub const AUTO_EXPAND_MAX_NODES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One chat record plus transient view state.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub record: ChatRecord,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// 0 for roots, parent depth + 1 otherwise
    pub depth: usize,
    pub expanded: bool,
    pub selected: bool,
}

impl TreeNode {
    fn new(record: ChatRecord, expanded: bool) -> Self {
        Self {
            record,
            parent: None,
            children: Vec::new(),
            depth: 0,
            expanded,
            selected: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Flat node table keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<TreeNode>,
    index: HashMap<String, NodeId>,
}

impl NodeArena {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0)
    }

    /// Node holding the record with `record_id`.
    pub fn find(&self, record_id: &str) -> Option<NodeId> {
        self.index.get(record_id).copied()
    }

    /// All nodes in arena (sorted record) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    fn push(&mut self, node: TreeNode) -> Option<NodeId> {
        if self.index.contains_key(node.id()) {
            warn!(id = node.id(), "duplicate session id, keeping first occurrence");
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.id().to_string(), id);
        self.nodes.push(node);
        Some(id)
    }

    /// True when `needle` is `start` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, needle: NodeId, start: NodeId) -> bool {
        let mut current = Some(start);
        let mut steps = 0;
        while let Some(id) = current {
            if id == needle {
                return true;
            }
            // Attachment never closes a loop; the bound only guards misuse.
            steps += 1;
            if steps > self.nodes.len() {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    fn attach(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn sort_children_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&TreeNode, &TreeNode) -> std::cmp::Ordering,
    {
        for i in 0..self.nodes.len() {
            if self.nodes[i].children.len() < 2 {
                continue;
            }
            let mut children = std::mem::take(&mut self.nodes[i].children);
            children.sort_by(|a, b| cmp(&self.nodes[a.0], &self.nodes[b.0]));
            self.nodes[i].children = children;
        }
    }

    fn assign_depths(&mut self, roots: &[NodeId]) {
        let mut stack: Vec<(NodeId, usize)> = roots.iter().map(|r| (*r, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            self.nodes[id.0].depth = depth;
            for child in &self.nodes[id.0].children {
                stack.push((*child, depth + 1));
            }
        }
    }
}

impl Index<NodeId> for NodeArena {
    type Output = TreeNode;

    fn index(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }
}

/// One lineage group.
#[derive(Debug, Clone)]
pub struct Tree {
    pub root: NodeId,
    pub node_count: usize,
    pub latest_update: DateTime<Utc>,
    /// Some node in the tree is the active session
    pub has_current: bool,
    /// Header expansion
    pub expanded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub(crate) arena: NodeArena,
    pub(crate) trees: Vec<Tree>,
    total_count: usize,
}

impl Forest {
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn tree(&self, index: usize) -> Option<&Tree> {
        self.trees.get(index)
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Index of the tree rooted at `root`.
    pub fn tree_of_root(&self, root: NodeId) -> Option<usize> {
        self.trees.iter().position(|t| t.root == root)
    }

    pub fn toggle_tree(&mut self, index: usize) {
        if let Some(tree) = self.trees.get_mut(index) {
            tree.expanded = !tree.expanded;
        }
    }
}

/// Ordered roots for the flat "tree list" mode.
#[derive(Debug, Clone, Default)]
pub struct FlatTree {
    pub(crate) arena: NodeArena,
    pub(crate) roots: Vec<NodeId>,
}

impl FlatTree {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

/// Sort, instantiate and link. Returns the arena and its roots in sorted
/// order. Cycles degrade to extra roots.
fn link(
    records: &[ChatRecord],
    parents: &ParentMap,
    sort: &SortConfig,
    expanded: bool,
) -> (NodeArena, Vec<NodeId>) {
    let mut sorted = records.to_vec();
    sort.sort(&mut sorted);

    let mut arena = NodeArena::default();
    for record in sorted {
        arena.push(TreeNode::new(record, expanded));
    }

    for i in 0..arena.len() {
        let child = NodeId(i);
        let Some(parent) = parents
            .get(arena[child].id())
            .and_then(|parent_id| arena.find(parent_id))
        else {
            continue;
        };
        if arena.is_ancestor_or_self(child, parent) {
            debug!(
                id = arena[child].id(),
                parent = arena[parent].id(),
                "refusing cyclic parent link"
            );
            continue;
        }
        arena.attach(child, parent);
    }

    let roots: Vec<NodeId> = arena
        .iter()
        .filter(|(_, node)| node.parent.is_none())
        .map(|(id, _)| id)
        .collect();

    (arena, roots)
}

/// Build the lineage forest: children newest first, trees holding the
/// active session first, then most recently updated.
pub fn build_forest(records: &[ChatRecord], parents: &ParentMap, sort: &SortConfig) -> Forest {
    let (mut arena, roots) = link(records, parents, sort, true);
    arena.sort_children_by(|a, b| b.record.updated_at.cmp(&a.record.updated_at));
    arena.assign_depths(&roots);

    let mut trees: Vec<Tree> = roots
        .iter()
        .map(|root| {
            let (node_count, latest_update, has_current) = aggregate(&arena, *root);
            Tree {
                root: *root,
                node_count,
                latest_update,
                has_current,
                expanded: has_current || node_count <= AUTO_EXPAND_MAX_NODES,
            }
        })
        .collect();

    trees.sort_by(|a, b| {
        b.has_current
            .cmp(&a.has_current)
            .then_with(|| b.latest_update.cmp(&a.latest_update))
    });

    let total_count = arena.len();
    debug!(trees = trees.len(), nodes = total_count, "built session forest");
    Forest {
        arena,
        trees,
        total_count,
    }
}

/// Build the flat root list: collapsed nodes, siblings in the configured
/// order.
pub fn build_flat_tree(records: &[ChatRecord], parents: &ParentMap, sort: &SortConfig) -> FlatTree {
    let (mut arena, roots) = link(records, parents, sort, false);
    arena.sort_children_by(|a, b| sort.compare(&a.record, &b.record));
    arena.assign_depths(&roots);
    FlatTree { arena, roots }
}

/// (node count, latest update, any active) over the subtree at `root`.
fn aggregate(arena: &NodeArena, root: NodeId) -> (usize, DateTime<Utc>, bool) {
    let mut count = 0;
    let mut latest = arena[root].record.updated_at;
    let mut has_current = false;
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = &arena[id];
        count += 1;
        latest = latest.max(node.record.updated_at);
        has_current |= node.record.is_active;
        stack.extend(node.children.iter().copied());
    }
    (count, latest, has_current)
}

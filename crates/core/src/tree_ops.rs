//! Traversal helpers over a built forest: selection, expansion, counting
//! and the visible-row sequence the panel draws connector lines from.

use crate::forest::{FlatTree, Forest, NodeArena, NodeId, TreeNode};

/// Target of a bulk selection/expansion change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every tree, including tree headers
    Forest,
    /// One tree by index, including its header
    Tree(usize),
    /// A node and all of its descendants
    Subtree(NodeId),
}

impl NodeArena {
    /// Pre-order ids of the subtree at `root`, ignoring expansion state.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        out
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) {
        if let Some(node) = self.get_mut(id) {
            node.selected = selected;
        }
    }

    pub fn toggle_expanded(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.expanded = !node.expanded;
        }
    }

    fn set_subtree<F>(&mut self, root: NodeId, mut apply: F)
    where
        F: FnMut(&mut TreeNode),
    {
        for id in self.subtree(root) {
            apply(&mut self[id]);
        }
    }

    /// Rows reachable from `roots` through expanded nodes.
    pub fn visible_nodes<'a>(&'a self, roots: &[NodeId]) -> VisibleNodes<'a> {
        VisibleNodes::new(self, roots, false)
    }
}

impl Forest {
    /// Every selected node, collapsed ancestors or not, in display order.
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.trees
            .iter()
            .flat_map(|tree| self.arena.subtree(tree.root))
            .filter(|id| self.arena[*id].selected)
            .collect()
    }

    pub fn set_all_selected(&mut self, scope: Scope, selected: bool) {
        for root in self.scope_roots(scope) {
            self.arena.set_subtree(root, |node| node.selected = selected);
        }
    }

    pub fn set_all_expanded(&mut self, scope: Scope, expanded: bool) {
        match scope {
            Scope::Forest => self.trees.iter_mut().for_each(|t| t.expanded = expanded),
            Scope::Tree(index) => {
                if let Some(tree) = self.trees.get_mut(index) {
                    tree.expanded = expanded;
                }
            }
            Scope::Subtree(_) => {}
        }
        for root in self.scope_roots(scope) {
            self.arena.set_subtree(root, |node| node.expanded = expanded);
        }
    }

    fn scope_roots(&self, scope: Scope) -> Vec<NodeId> {
        match scope {
            Scope::Forest => self.trees.iter().map(|t| t.root).collect(),
            Scope::Tree(index) => self.trees.get(index).map(|t| t.root).into_iter().collect(),
            Scope::Subtree(id) => self.arena.get(id).map(|_| id).into_iter().collect(),
        }
    }

    /// Nodes reachable from the tree roots. Always equals `total_count()`
    /// and the sum of per-tree `node_count`.
    pub fn count_nodes(&self) -> usize {
        self.trees
            .iter()
            .map(|tree| self.arena.subtree(tree.root).len())
            .sum()
    }

    /// Visible rows of one tree. A collapsed tree header shows only its
    /// root row.
    pub fn visible_nodes(&self, tree_index: usize) -> VisibleNodes<'_> {
        match self.trees.get(tree_index) {
            Some(tree) => VisibleNodes::new(&self.arena, &[tree.root], !tree.expanded),
            None => VisibleNodes::new(&self.arena, &[], false),
        }
    }

    /// Number of rows [`Forest::visible_nodes`] yields across all trees.
    pub fn visible_count(&self) -> usize {
        (0..self.trees.len())
            .map(|i| self.visible_nodes(i).count())
            .sum()
    }

    /// Record ids in display order, ignoring expansion.
    pub fn record_ids(&self) -> Vec<&str> {
        self.trees
            .iter()
            .flat_map(|tree| self.arena.subtree(tree.root))
            .map(|id| self.arena[id].id())
            .collect()
    }
}

impl FlatTree {
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .flat_map(|root| self.arena.subtree(*root))
            .filter(|id| self.arena[*id].selected)
            .collect()
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for root in self.roots.clone() {
            self.arena.set_subtree(root, |node| node.selected = selected);
        }
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        for root in self.roots.clone() {
            self.arena.set_subtree(root, |node| node.expanded = expanded);
        }
    }

    pub fn visible_nodes(&self) -> VisibleNodes<'_> {
        self.arena.visible_nodes(&self.roots)
    }
}

/// One row of the visible sequence.
#[derive(Debug, Clone)]
pub struct VisibleNode<'a> {
    pub id: NodeId,
    pub node: &'a TreeNode,
    /// Last among its siblings (draws `└` instead of `├`)
    pub is_last: bool,
    /// One entry per ancestor from the root down: true when that ancestor
    /// has later siblings, so its vertical connector continues.
    pub continuations: Vec<bool>,
}

#[derive(Debug, Clone)]
struct Pending {
    id: NodeId,
    is_last: bool,
    continuations: Vec<bool>,
}

/// Lazy depth-first pre-order walk. Clone it (or ask for a new one) to
/// restart.
#[derive(Debug, Clone)]
pub struct VisibleNodes<'a> {
    arena: &'a NodeArena,
    stack: Vec<Pending>,
    roots_collapsed: bool,
}

impl<'a> VisibleNodes<'a> {
    fn new(arena: &'a NodeArena, roots: &[NodeId], roots_collapsed: bool) -> Self {
        let last = roots.len().saturating_sub(1);
        let stack = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, id)| Pending {
                id: *id,
                is_last: i == last,
                continuations: Vec::new(),
            })
            .collect();
        Self {
            arena,
            stack,
            roots_collapsed,
        }
    }
}

impl<'a> Iterator for VisibleNodes<'a> {
    type Item = VisibleNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let Pending {
            id,
            is_last,
            continuations,
        } = self.stack.pop()?;
        let node = &self.arena[id];

        let is_root_row = continuations.is_empty();
        let descend = node.expanded && !(is_root_row && self.roots_collapsed);
        if descend && node.has_children() {
            let mut child_path = continuations.clone();
            child_path.push(!is_last);
            let last = node.children.len() - 1;
            for (i, child) in node.children.iter().enumerate().rev() {
                self.stack.push(Pending {
                    id: *child,
                    is_last: i == last,
                    continuations: child_path.clone(),
                });
            }
        }

        Some(VisibleNode {
            id,
            node,
            is_last,
            continuations,
        })
    }
}

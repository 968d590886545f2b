//! Chat-session lineage: resolve which session branched from which and
//! arrange the result as a forest the panel can walk row by row.

pub mod filter;
pub mod forest;
pub mod lineage;
pub mod record;
pub mod tree_ops;

pub use filter::RecordFilter;
pub use forest::{
    build_flat_tree, build_forest, FlatTree, Forest, NodeArena, NodeId, Tree, TreeNode,
    AUTO_EXPAND_MAX_NODES,
};
pub use lineage::{resolve_parents, ParentMap, RelationSource};
pub use record::{ChatRecord, SortConfig, SortKey, SortOrder};
pub use tree_ops::{Scope, VisibleNode, VisibleNodes};

#[cfg(any(test, feature = "testing"))]
pub mod testing;

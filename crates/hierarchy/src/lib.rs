//! `opsdesk-hierarchy` — the organizational group tree.
//!
//! Owns group tree mutation and traversal: create, update, delete,
//! ancestor/descendant queries, cycle detection, and the materialized-path
//! maintenance that keeps every group's `path` consistent with its ancestor
//! chain. Also provides the recursive expansion of group sets and the
//! immutable hierarchy snapshot consumed by authorization contexts.

pub mod expander;
pub mod service;
pub mod snapshot;

pub use expander::RecursiveGroupExpander;
pub use service::{GroupHierarchyService, GroupUpdate, NewGroup};
pub use snapshot::{GroupNode, HierarchySnapshot};

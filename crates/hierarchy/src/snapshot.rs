//! Immutable point-in-time view of the group hierarchy.

use std::collections::{HashMap, HashSet, VecDeque};

use opsdesk_core::GroupId;
use opsdesk_store::Group;

/// One group as captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub id: GroupId,
    pub name: String,
    pub parent_id: Option<GroupId>,
    pub is_active: bool,
    pub path: String,
}

/// A consistent snapshot of the group hierarchy at one instant.
///
/// Authorization contexts hold one of these; it is never updated in place.
/// A caller holding a snapshot across a hierarchy mutation observes a stale
/// view and must build a new one.
#[derive(Debug, Clone)]
pub struct HierarchySnapshot {
    nodes: HashMap<GroupId, GroupNode>,
    children: HashMap<GroupId, Vec<GroupId>>,
    order: Vec<GroupId>,
}

impl HierarchySnapshot {
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut nodes = HashMap::with_capacity(groups.len());
        let mut children: HashMap<GroupId, Vec<GroupId>> = HashMap::new();
        let mut order = Vec::with_capacity(groups.len());

        for group in groups {
            if let Some(parent_id) = group.parent_id {
                children.entry(parent_id).or_default().push(group.id);
            }
            order.push(group.id);
            nodes.insert(
                group.id,
                GroupNode {
                    id: group.id,
                    name: group.name,
                    parent_id: group.parent_id,
                    is_active: group.is_active,
                    path: group.path,
                },
            );
        }

        Self {
            nodes,
            children,
            order,
        }
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: GroupId) -> Option<&GroupNode> {
        self.nodes.get(&id)
    }

    /// Every group id in the snapshot, in capture order.
    pub fn group_ids(&self) -> &[GroupId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Descendants of `id`, excluding `id` itself. Iterative walk with a
    /// visited-set guard; unknown ids yield an empty set.
    pub fn descendants_of(&self, id: GroupId) -> Vec<GroupId> {
        let mut out = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut frontier = VecDeque::from([id]);

        while let Some(current) = frontier.pop_front() {
            for &child in self.children.get(&current).into_iter().flatten() {
                if visited.insert(child) {
                    frontier.push_back(child);
                    out.push(child);
                }
            }
        }

        out
    }
}

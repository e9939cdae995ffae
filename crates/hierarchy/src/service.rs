//! Group tree mutation and traversal.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use opsdesk_core::{DomainError, DomainResult, GroupId};
use opsdesk_store::group::PATH_SEPARATOR;
use opsdesk_store::{Group, GroupStore};

use crate::snapshot::HierarchySnapshot;

/// Input for creating a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<GroupId>,
}

/// Partial update for a group. `None` fields are left untouched.
///
/// `parent_id` is doubly optional: `Some(None)` moves the group to the root,
/// `Some(Some(p))` reparents it under `p`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Option<GroupId>>,
    pub is_active: Option<bool>,
}

/// Maintains a cycle-free group tree and exposes traversal queries.
///
/// Mutations serialize through a service-level mutex and re-validate against
/// the store inside the critical section, so two concurrent reparenting calls
/// cannot both pass validation against stale state and jointly introduce a
/// cycle. Reads run unsynchronized; callers get the store's isolation level.
pub struct GroupHierarchyService<S> {
    store: S,
    mutation: Mutex<()>,
}

impl<S> GroupHierarchyService<S>
where
    S: GroupStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            mutation: Mutex::new(()),
        }
    }

    fn mutation_guard(&self) -> DomainResult<std::sync::MutexGuard<'_, ()>> {
        self.mutation
            .lock()
            .map_err(|_| DomainError::storage("mutation lock poisoned"))
    }

    /// Create a new active group under `parent_id` (or at the root).
    pub fn create(&self, input: NewGroup) -> DomainResult<Group> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("group name cannot be empty"));
        }

        let _guard = self.mutation_guard()?;

        let path = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .find_by_id(parent_id)?
                    .ok_or_else(|| DomainError::not_found("group", parent_id))?;
                format!("{}{}{}", parent.path, PATH_SEPARATOR, name)
            }
            None => name.to_string(),
        };

        let group = Group::new(GroupId::new(), name, input.description, input.parent_id, path);
        self.store.insert(group.clone())?;

        info!(group_id = %group.id, name = %group.name, path = %group.path, "group created");
        Ok(group)
    }

    /// Apply a partial update; recomputes the materialized path of the group
    /// and cascades it to all descendants in one atomic batch.
    pub fn update(&self, group_id: GroupId, update: GroupUpdate) -> DomainResult<Group> {
        let _guard = self.mutation_guard()?;

        let mut groups = index_by_id(self.store.find_all()?);
        let current = groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("group", group_id))?;

        let name = match &update.name {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(DomainError::validation("group name cannot be empty"));
                }
                name.to_string()
            }
            None => current.name.clone(),
        };

        let parent_id = match update.parent_id {
            Some(Some(candidate)) => {
                if !groups.contains_key(&candidate) {
                    return Err(DomainError::not_found("group", candidate));
                }
                ensure_no_cycle(&groups, group_id, candidate)?;
                Some(candidate)
            }
            Some(None) => None,
            None => current.parent_id,
        };

        let mut target = current;
        target.name = name;
        target.parent_id = parent_id;
        if let Some(description) = update.description {
            target.description = Some(description);
        }
        if let Some(is_active) = update.is_active {
            target.is_active = is_active;
        }
        target.path = match parent_id {
            Some(pid) => {
                // The cycle check guarantees the parent is outside the subtree,
                // so its path is unaffected by this update.
                let parent = &groups[&pid];
                format!("{}{}{}", parent.path, PATH_SEPARATOR, target.name)
            }
            None => target.name.clone(),
        };
        groups.insert(group_id, target.clone());

        let mut changed = vec![target.clone()];
        changed.extend(recompute_descendant_paths(&mut groups, group_id));
        self.store.update_many(changed)?;

        info!(group_id = %group_id, path = %target.path, "group updated");
        Ok(target)
    }

    /// Delete a group. Rejected while any child group exists, active or not;
    /// children must be deleted or reparented first.
    pub fn delete(&self, group_id: GroupId) -> DomainResult<()> {
        let _guard = self.mutation_guard()?;

        if self.store.find_by_id(group_id)?.is_none() {
            return Err(DomainError::not_found("group", group_id));
        }
        if !self.store.find_by_parent_id(group_id)?.is_empty() {
            return Err(DomainError::ChildGroupsExist { group_id });
        }

        self.store.delete(group_id)?;
        info!(group_id = %group_id, "group deleted");
        Ok(())
    }

    pub fn get(&self, group_id: GroupId) -> DomainResult<Group> {
        self.store
            .find_by_id(group_id)?
            .ok_or_else(|| DomainError::not_found("group", group_id))
    }

    pub fn list(&self) -> DomainResult<Vec<Group>> {
        self.store.find_all()
    }

    /// All groups reachable by following parent edges downward from
    /// `group_id`, excluding the group itself. Unknown ids yield an empty
    /// set. Terminates even on a malformed store (visited-set guard).
    pub fn descendants_of(&self, group_id: GroupId) -> DomainResult<Vec<Group>> {
        let mut out = Vec::new();
        let mut visited = HashSet::from([group_id]);
        let mut frontier = VecDeque::from([group_id]);

        while let Some(id) = frontier.pop_front() {
            for child in self.store.find_by_parent_id(id)? {
                if visited.insert(child.id) {
                    frontier.push_back(child.id);
                    out.push(child);
                }
            }
        }

        debug!(group_id = %group_id, count = out.len(), "descendants resolved");
        Ok(out)
    }

    /// The chain from `group_id` up to the root, nearest parent first,
    /// excluding the group itself.
    pub fn ancestors_of(&self, group_id: GroupId) -> DomainResult<Vec<Group>> {
        let start = self
            .store
            .find_by_id(group_id)?
            .ok_or_else(|| DomainError::not_found("group", group_id))?;

        let mut out = Vec::new();
        let mut visited = HashSet::from([group_id]);
        let mut cursor = start.parent_id;

        while let Some(id) = cursor {
            if !visited.insert(id) {
                // Malformed store: bail out rather than loop.
                break;
            }
            let Some(group) = self.store.find_by_id(id)? else {
                break;
            };
            cursor = group.parent_id;
            out.push(group);
        }

        Ok(out)
    }

    /// Point-in-time snapshot of the whole hierarchy for context building.
    pub fn snapshot(&self) -> DomainResult<HierarchySnapshot> {
        Ok(HierarchySnapshot::from_groups(self.store.find_all()?))
    }
}

fn index_by_id(groups: Vec<Group>) -> HashMap<GroupId, Group> {
    groups.into_iter().map(|g| (g.id, g)).collect()
}

/// Reject a reparent that would make `candidate` a parent of `group_id` while
/// being the group itself or inside its subtree. Walks upward from the
/// candidate with a visited-set guard so a corrupted store cannot loop.
fn ensure_no_cycle(
    groups: &HashMap<GroupId, Group>,
    group_id: GroupId,
    candidate: GroupId,
) -> DomainResult<()> {
    if candidate == group_id {
        return Err(DomainError::CircularReference {
            group_id,
            parent_id: candidate,
        });
    }

    let mut visited = HashSet::new();
    let mut cursor = Some(candidate);
    while let Some(id) = cursor {
        if id == group_id {
            return Err(DomainError::CircularReference {
                group_id,
                parent_id: candidate,
            });
        }
        if !visited.insert(id) {
            break;
        }
        cursor = groups.get(&id).and_then(|g| g.parent_id);
    }

    Ok(())
}

/// Recompute materialized paths below `root` (already updated in `groups`).
/// Returns the descendants whose path changed, in traversal order.
fn recompute_descendant_paths(
    groups: &mut HashMap<GroupId, Group>,
    root: GroupId,
) -> Vec<Group> {
    let mut children: HashMap<GroupId, Vec<GroupId>> = HashMap::new();
    for group in groups.values() {
        if let Some(parent_id) = group.parent_id {
            children.entry(parent_id).or_default().push(group.id);
        }
    }
    for ids in children.values_mut() {
        ids.sort();
    }

    let mut changed = Vec::new();
    let mut visited = HashSet::from([root]);
    let mut frontier = VecDeque::from([root]);

    while let Some(id) = frontier.pop_front() {
        let parent_path = groups[&id].path.clone();
        for child_id in children.get(&id).cloned().unwrap_or_default() {
            if !visited.insert(child_id) {
                continue;
            }
            let Some(child) = groups.get_mut(&child_id) else {
                continue;
            };
            let path = format!("{}{}{}", parent_path, PATH_SEPARATOR, child.name);
            if child.path != path {
                child.path = path;
                changed.push(child.clone());
            }
            frontier.push_back(child_id);
        }
    }

    changed
}

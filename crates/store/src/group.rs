//! Organizational group record and its store contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::{DomainResult, Entity, GroupId};

/// Separator used in materialized group paths, e.g. `"TI > Desenvolvimento"`.
pub const PATH_SEPARATOR: &str = " > ";

/// A node in the organizational tree.
///
/// # Invariants
/// - The parent-child relation forms a forest (no cycles).
/// - `path` is always the concatenation of ancestor names down to the group
///   itself, joined by [`PATH_SEPARATOR`].
/// - `name` is non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<GroupId>,
    pub is_active: bool,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Construct an active group. `path` is the caller's responsibility: the
    /// hierarchy service computes it from the resolved parent chain.
    pub fn new(
        id: GroupId,
        name: impl Into<String>,
        description: Option<String>,
        parent_id: Option<GroupId>,
        path: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description,
            parent_id,
            is_active: true,
            path: path.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Group {
    type Id = GroupId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persistence contract for groups.
///
/// Only the hierarchy service mutates group rows, and only through its
/// validated entry points. `update_many` exists so a materialized-path
/// cascade commits as one unit and is never observable half-applied.
pub trait GroupStore: Send + Sync {
    fn find_by_id(&self, id: GroupId) -> DomainResult<Option<Group>>;
    fn find_by_parent_id(&self, parent_id: GroupId) -> DomainResult<Vec<Group>>;
    fn find_all(&self) -> DomainResult<Vec<Group>>;
    fn insert(&self, group: Group) -> DomainResult<()>;
    fn update(&self, group: Group) -> DomainResult<()>;
    fn update_many(&self, groups: Vec<Group>) -> DomainResult<()>;
    fn delete(&self, id: GroupId) -> DomainResult<()>;
}

impl<S> GroupStore for Arc<S>
where
    S: GroupStore + ?Sized,
{
    fn find_by_id(&self, id: GroupId) -> DomainResult<Option<Group>> {
        (**self).find_by_id(id)
    }

    fn find_by_parent_id(&self, parent_id: GroupId) -> DomainResult<Vec<Group>> {
        (**self).find_by_parent_id(parent_id)
    }

    fn find_all(&self) -> DomainResult<Vec<Group>> {
        (**self).find_all()
    }

    fn insert(&self, group: Group) -> DomainResult<()> {
        (**self).insert(group)
    }

    fn update(&self, group: Group) -> DomainResult<()> {
        (**self).update(group)
    }

    fn update_many(&self, groups: Vec<Group>) -> DomainResult<()> {
        (**self).update_many(groups)
    }

    fn delete(&self, id: GroupId) -> DomainResult<()> {
        (**self).delete(id)
    }
}

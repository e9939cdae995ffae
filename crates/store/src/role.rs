//! Role record and its store contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::{DomainResult, Entity, PermissionId, RoleId};

/// A named bundle of permissions assignable to users.
///
/// Role names are globally unique and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persistence contract for roles and their permission grants.
///
/// The role→permission edges live with the role store; `delete` cascades a
/// role's grants and user assignments in one unit.
pub trait RoleStore: Send + Sync {
    fn find_by_id(&self, id: RoleId) -> DomainResult<Option<Role>>;
    fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>>;
    fn find_all(&self) -> DomainResult<Vec<Role>>;
    fn find_by_ids(&self, ids: &[RoleId]) -> DomainResult<Vec<Role>>;
    fn insert(&self, role: Role) -> DomainResult<()>;
    fn update(&self, role: Role) -> DomainResult<()>;
    fn delete(&self, id: RoleId) -> DomainResult<()>;
    fn add_permission(&self, role_id: RoleId, permission_id: PermissionId) -> DomainResult<()>;
    fn remove_permission(&self, role_id: RoleId, permission_id: PermissionId) -> DomainResult<()>;
    fn permission_ids_for(&self, role_id: RoleId) -> DomainResult<Vec<PermissionId>>;
}

impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    fn find_by_id(&self, id: RoleId) -> DomainResult<Option<Role>> {
        (**self).find_by_id(id)
    }

    fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>> {
        (**self).find_by_name(name)
    }

    fn find_all(&self) -> DomainResult<Vec<Role>> {
        (**self).find_all()
    }

    fn find_by_ids(&self, ids: &[RoleId]) -> DomainResult<Vec<Role>> {
        (**self).find_by_ids(ids)
    }

    fn insert(&self, role: Role) -> DomainResult<()> {
        (**self).insert(role)
    }

    fn update(&self, role: Role) -> DomainResult<()> {
        (**self).update(role)
    }

    fn delete(&self, id: RoleId) -> DomainResult<()> {
        (**self).delete(id)
    }

    fn add_permission(&self, role_id: RoleId, permission_id: PermissionId) -> DomainResult<()> {
        (**self).add_permission(role_id, permission_id)
    }

    fn remove_permission(&self, role_id: RoleId, permission_id: PermissionId) -> DomainResult<()> {
        (**self).remove_permission(role_id, permission_id)
    }

    fn permission_ids_for(&self, role_id: RoleId) -> DomainResult<Vec<PermissionId>> {
        (**self).permission_ids_for(role_id)
    }
}

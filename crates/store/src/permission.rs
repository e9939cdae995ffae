//! Permission record and its store contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::{DomainResult, Entity, PermissionId, RoleId};

/// An atomic `(resource, action)` capability.
///
/// Identity for matching purposes is the pair, serialized as
/// `"resource:action"` (see [`Permission::key`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub resource: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(id: PermissionId, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id,
            resource: resource.into(),
            action: action.into(),
            created_at: Utc::now(),
        }
    }

    /// Serialized matching key, e.g. `"ticket:resolve"`.
    pub fn key(&self) -> String {
        Self::key_of(&self.resource, &self.action)
    }

    pub fn key_of(resource: &str, action: &str) -> String {
        format!("{resource}:{action}")
    }
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persistence contract for permissions.
pub trait PermissionStore: Send + Sync {
    fn find_by_id(&self, id: PermissionId) -> DomainResult<Option<Permission>>;
    /// Look up by serialized `"resource:action"` key.
    fn find_by_key(&self, key: &str) -> DomainResult<Option<Permission>>;
    fn find_all(&self) -> DomainResult<Vec<Permission>>;
    /// Permissions granted to any of the given roles, distinct by id.
    fn find_by_role_ids(&self, role_ids: &[RoleId]) -> DomainResult<Vec<Permission>>;
    fn insert(&self, permission: Permission) -> DomainResult<()>;
    fn update(&self, permission: Permission) -> DomainResult<()>;
    fn delete(&self, id: PermissionId) -> DomainResult<()>;
}

impl<S> PermissionStore for Arc<S>
where
    S: PermissionStore + ?Sized,
{
    fn find_by_id(&self, id: PermissionId) -> DomainResult<Option<Permission>> {
        (**self).find_by_id(id)
    }

    fn find_by_key(&self, key: &str) -> DomainResult<Option<Permission>> {
        (**self).find_by_key(key)
    }

    fn find_all(&self) -> DomainResult<Vec<Permission>> {
        (**self).find_all()
    }

    fn find_by_role_ids(&self, role_ids: &[RoleId]) -> DomainResult<Vec<Permission>> {
        (**self).find_by_role_ids(role_ids)
    }

    fn insert(&self, permission: Permission) -> DomainResult<()> {
        (**self).insert(permission)
    }

    fn update(&self, permission: Permission) -> DomainResult<()> {
        (**self).update(permission)
    }

    fn delete(&self, id: PermissionId) -> DomainResult<()> {
        (**self).delete(id)
    }
}

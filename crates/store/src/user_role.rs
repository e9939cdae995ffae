//! User↔role association and its store contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::{DomainResult, RoleId, UserId};

/// Association between a user and a role, unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
}

impl UserRole {
    pub fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            user_id,
            role_id,
            created_at: Utc::now(),
        }
    }
}

/// Persistence contract for user↔role assignments.
pub trait UserRoleStore: Send + Sync {
    fn find_by_user_and_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> DomainResult<Option<UserRole>>;
    fn find_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<UserRole>>;
    fn insert(&self, user_role: UserRole) -> DomainResult<()>;
    fn delete(&self, user_id: UserId, role_id: RoleId) -> DomainResult<()>;
}

impl<S> UserRoleStore for Arc<S>
where
    S: UserRoleStore + ?Sized,
{
    fn find_by_user_and_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> DomainResult<Option<UserRole>> {
        (**self).find_by_user_and_role(user_id, role_id)
    }

    fn find_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<UserRole>> {
        (**self).find_by_user_id(user_id)
    }

    fn insert(&self, user_role: UserRole) -> DomainResult<()> {
        (**self).insert(user_role)
    }

    fn delete(&self, user_id: UserId, role_id: RoleId) -> DomainResult<()> {
        (**self).delete(user_id, role_id)
    }
}

//! User directory record and its store contract.
//!
//! The engine does not own identity proofing; it consumes the raw identity
//! attributes recorded here (admin flags, home group) to derive authorization
//! contexts, and queries the directory through scoped listings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::{DomainResult, Entity, GroupId, UserId};

use crate::query::Page;

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserStatus {
    /// User is active and can authenticate/transact.
    #[default]
    Active,
    /// User is suspended and cannot authenticate.
    Suspended,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

/// A user as the identity collaborator supplies it.
///
/// `is_super_admin` and `is_group_admin` are mutually non-exclusive raw
/// flags; their meaning is derived downstream when a context is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub is_super_admin: bool,
    pub is_group_admin: bool,
    pub home_group_id: GroupId,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Closed filter structure for directory searches.
///
/// `group_ids` is the already-resolved scope: the caller (the scoped listing
/// resolver) intersects its manageable set with any requested group before
/// the query reaches the store. An empty `group_ids` matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    pub group_ids: Vec<GroupId>,
    /// Case-insensitive match against email and display name.
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub limit: u32,
    pub offset: u32,
}

/// Persistence contract for the user directory.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>>;
    fn insert(&self, user: User) -> DomainResult<()>;
    fn update(&self, user: User) -> DomainResult<()>;
    fn delete(&self, id: UserId) -> DomainResult<()>;
    /// Scoped, filtered, paginated listing. The store clamps `limit` to
    /// [`crate::MAX_PAGE_SIZE`]; `total` counts before pagination.
    fn search(&self, query: &UserQuery) -> DomainResult<Page<User>>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        (**self).find_by_id(id)
    }

    fn insert(&self, user: User) -> DomainResult<()> {
        (**self).insert(user)
    }

    fn update(&self, user: User) -> DomainResult<()> {
        (**self).update(user)
    }

    fn delete(&self, id: UserId) -> DomainResult<()> {
        (**self).delete(id)
    }

    fn search(&self, query: &UserQuery) -> DomainResult<Page<User>> {
        (**self).search(query)
    }
}

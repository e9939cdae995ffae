//! Domain error model.

use thiserror::Error;

use crate::id::{GroupId, RoleId, UserId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Transport concerns belong elsewhere. Every variant
/// carries enough structure (offending id, kind) for a caller to map it to a
/// transport-level response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty name, duplicate role name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A proposed parent is the group itself or one of its descendants.
    #[error("circular reference: group {group_id} cannot be parented to {parent_id}")]
    CircularReference { group_id: GroupId, parent_id: GroupId },

    /// Delete attempted on a group that still has children.
    #[error("group {group_id} has child groups; delete or reparent them first")]
    ChildGroupsExist { group_id: GroupId },

    /// The `(user, role)` pair already exists.
    #[error("role {role_id} is already assigned to user {user_id}")]
    AlreadyAssigned { user_id: UserId, role_id: RoleId },

    /// The `(user, role)` pair does not exist.
    #[error("role {role_id} is not assigned to user {user_id}")]
    NotAssigned { user_id: UserId, role_id: RoleId },

    /// A conflict occurred (e.g. concurrent mutation detected at commit).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed (e.g. poisoned lock).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

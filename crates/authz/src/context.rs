//! Authorization context derivation.

use tracing::debug;

use opsdesk_core::{DomainError, DomainResult, GroupId, UserId};
use opsdesk_hierarchy::HierarchySnapshot;
use opsdesk_store::{GroupStore, UserStore};

/// A fully resolved authorization context for one actor.
///
/// This is immutable: it captures the actor's identity flags, home group and
/// a point-in-time snapshot of the group hierarchy. Any change to the
/// underlying user or hierarchy requires building a new context; a caller
/// holding one across a mutation observes a stale view.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    user_id: UserId,
    is_super_admin: bool,
    is_group_admin: bool,
    home_group_id: GroupId,
    hierarchy: HierarchySnapshot,
}

impl PermissionContext {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_super_admin
    }

    pub fn is_group_admin(&self) -> bool {
        self.is_group_admin
    }

    pub fn home_group_id(&self) -> GroupId {
        self.home_group_id
    }

    pub fn hierarchy(&self) -> &HierarchySnapshot {
        &self.hierarchy
    }
}

/// The only path that produces a [`PermissionContext`], so every caller goes
/// through identical derivation logic.
pub struct PermissionContextFactory<U, G> {
    users: U,
    groups: G,
}

impl<U, G> PermissionContextFactory<U, G>
where
    U: UserStore,
    G: GroupStore,
{
    pub fn new(users: U, groups: G) -> Self {
        Self { users, groups }
    }

    /// Build a context for `user_id`. Never mutates stores; fails with
    /// `NotFound` if the user is unknown or their home group does not
    /// resolve to an existing group.
    pub fn context_for(&self, user_id: UserId) -> DomainResult<PermissionContext> {
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;

        let hierarchy = HierarchySnapshot::from_groups(self.groups.find_all()?);
        if !hierarchy.contains(user.home_group_id) {
            return Err(DomainError::not_found("group", user.home_group_id));
        }

        debug!(
            user_id = %user.id,
            is_super_admin = user.is_super_admin,
            is_group_admin = user.is_group_admin,
            home_group_id = %user.home_group_id,
            groups = hierarchy.len(),
            "permission context built"
        );

        Ok(PermissionContext {
            user_id: user.id,
            is_super_admin: user.is_super_admin,
            is_group_admin: user.is_group_admin,
            home_group_id: user.home_group_id,
            hierarchy,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use opsdesk_store::{Group, InMemoryDirectory, User, UserStatus};

    use super::*;

    fn directory_with_user(home: Option<GroupId>) -> (Arc<InMemoryDirectory>, UserId) {
        let dir = Arc::new(InMemoryDirectory::new());
        let home_group_id = match home {
            Some(id) => {
                GroupStore::insert(&*dir, Group::new(id, "TI", None, None, "TI")).unwrap();
                id
            }
            None => GroupId::new(), // dangling reference
        };

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            is_super_admin: false,
            is_group_admin: true,
            home_group_id,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let user_id = user.id;
        UserStore::insert(&*dir, user).unwrap();
        (dir, user_id)
    }

    #[test]
    fn builds_context_with_snapshot() {
        let home = GroupId::new();
        let (dir, user_id) = directory_with_user(Some(home));
        let factory = PermissionContextFactory::new(dir.clone(), dir);

        let ctx = factory.context_for(user_id).unwrap();
        assert_eq!(ctx.user_id(), user_id);
        assert_eq!(ctx.home_group_id(), home);
        assert!(ctx.is_group_admin());
        assert!(!ctx.is_super_admin());
        assert_eq!(ctx.hierarchy().len(), 1);
    }

    #[test]
    fn unknown_user_fails() {
        let (dir, _) = directory_with_user(Some(GroupId::new()));
        let factory = PermissionContextFactory::new(dir.clone(), dir);
        assert!(matches!(
            factory.context_for(UserId::new()).unwrap_err(),
            DomainError::NotFound { entity: "user", .. }
        ));
    }

    #[test]
    fn unresolved_home_group_fails() {
        let (dir, user_id) = directory_with_user(None);
        let factory = PermissionContextFactory::new(dir.clone(), dir);
        assert!(matches!(
            factory.context_for(user_id).unwrap_err(),
            DomainError::NotFound { entity: "group", .. }
        ));
    }
}

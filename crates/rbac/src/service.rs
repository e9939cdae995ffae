//! Role/permission lifecycle and permission-check evaluation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use opsdesk_core::{DomainError, DomainResult, PermissionId, RoleId, UserId};
use opsdesk_store::{
    Permission, PermissionStore, Role, RoleStore, UserRole, UserRoleStore,
};

/// Partial update for a role. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial update for a permission. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionUpdate {
    pub resource: Option<String>,
    pub action: Option<String>,
}

/// Role and permission CRUD, user↔role assignment, and permission checks.
///
/// Evaluation is a pure set-membership check over `"resource:action"` keys;
/// no wildcard or permission-hierarchy semantics.
pub struct RbacService<R, P, U> {
    roles: R,
    permissions: P,
    user_roles: U,
}

impl<R, P, U> RbacService<R, P, U>
where
    R: RoleStore,
    P: PermissionStore,
    U: UserRoleStore,
{
    pub fn new(roles: R, permissions: P, user_roles: U) -> Self {
        Self {
            roles,
            permissions,
            user_roles,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_role(&self, name: &str, description: Option<String>) -> DomainResult<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("role name cannot be empty"));
        }
        if self.roles.find_by_name(name)?.is_some() {
            return Err(DomainError::validation("role already exists"));
        }

        let role = Role::new(RoleId::new(), name, description);
        self.roles.insert(role.clone())?;
        info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub fn update_role(&self, role_id: RoleId, update: RoleUpdate) -> DomainResult<Role> {
        let mut role = self
            .roles
            .find_by_id(role_id)?
            .ok_or_else(|| DomainError::not_found("role", role_id))?;

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::validation("role name cannot be empty"));
            }
            // Renaming onto a *different* role's name is a collision.
            if let Some(existing) = self.roles.find_by_name(name)? {
                if existing.id != role_id {
                    return Err(DomainError::validation("role already exists"));
                }
            }
            role.name = name.to_string();
        }
        if let Some(description) = update.description {
            role.description = Some(description);
        }

        self.roles.update(role.clone())?;
        info!(role_id = %role_id, "role updated");
        Ok(role)
    }

    /// Delete a role. The store cascades the role's permission grants and
    /// user assignments in the same unit.
    pub fn delete_role(&self, role_id: RoleId) -> DomainResult<()> {
        if self.roles.find_by_id(role_id)?.is_none() {
            return Err(DomainError::not_found("role", role_id));
        }
        self.roles.delete(role_id)?;
        info!(role_id = %role_id, "role deleted");
        Ok(())
    }

    pub fn get_role(&self, role_id: RoleId) -> DomainResult<Role> {
        self.roles
            .find_by_id(role_id)?
            .ok_or_else(|| DomainError::not_found("role", role_id))
    }

    pub fn list_roles(&self) -> DomainResult<Vec<Role>> {
        self.roles.find_all()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_permission(&self, resource: &str, action: &str) -> DomainResult<Permission> {
        let (resource, action) = (resource.trim(), action.trim());
        if resource.is_empty() || action.is_empty() {
            return Err(DomainError::validation(
                "permission resource and action cannot be empty",
            ));
        }
        let key = Permission::key_of(resource, action);
        if self.permissions.find_by_key(&key)?.is_some() {
            return Err(DomainError::validation("permission already exists"));
        }

        let permission = Permission::new(PermissionId::new(), resource, action);
        self.permissions.insert(permission.clone())?;
        info!(permission_id = %permission.id, key = %permission.key(), "permission created");
        Ok(permission)
    }

    pub fn update_permission(
        &self,
        permission_id: PermissionId,
        update: PermissionUpdate,
    ) -> DomainResult<Permission> {
        let mut permission = self
            .permissions
            .find_by_id(permission_id)?
            .ok_or_else(|| DomainError::not_found("permission", permission_id))?;

        if let Some(resource) = update.resource {
            let resource = resource.trim().to_string();
            if resource.is_empty() {
                return Err(DomainError::validation("permission resource cannot be empty"));
            }
            permission.resource = resource;
        }
        if let Some(action) = update.action {
            let action = action.trim().to_string();
            if action.is_empty() {
                return Err(DomainError::validation("permission action cannot be empty"));
            }
            permission.action = action;
        }

        if let Some(existing) = self.permissions.find_by_key(&permission.key())? {
            if existing.id != permission_id {
                return Err(DomainError::validation("permission already exists"));
            }
        }

        self.permissions.update(permission.clone())?;
        info!(permission_id = %permission_id, key = %permission.key(), "permission updated");
        Ok(permission)
    }

    pub fn delete_permission(&self, permission_id: PermissionId) -> DomainResult<()> {
        if self.permissions.find_by_id(permission_id)?.is_none() {
            return Err(DomainError::not_found("permission", permission_id));
        }
        self.permissions.delete(permission_id)?;
        info!(permission_id = %permission_id, "permission deleted");
        Ok(())
    }

    pub fn list_permissions(&self) -> DomainResult<Vec<Permission>> {
        self.permissions.find_all()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Role ↔ permission grants
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_permission_to_role(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> DomainResult<()> {
        self.roles.add_permission(role_id, permission_id)?;
        info!(role_id = %role_id, permission_id = %permission_id, "permission granted to role");
        Ok(())
    }

    pub fn remove_permission_from_role(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> DomainResult<()> {
        self.roles.remove_permission(role_id, permission_id)?;
        info!(role_id = %role_id, permission_id = %permission_id, "permission revoked from role");
        Ok(())
    }

    pub fn role_permissions(&self, role_id: RoleId) -> DomainResult<Vec<Permission>> {
        if self.roles.find_by_id(role_id)?.is_none() {
            return Err(DomainError::not_found("role", role_id));
        }
        self.permissions.find_by_role_ids(&[role_id])
    }

    // ─────────────────────────────────────────────────────────────────────
    // User ↔ role assignment and evaluation
    // ─────────────────────────────────────────────────────────────────────

    pub fn assign_role_to_user(&self, user_id: UserId, role_id: RoleId) -> DomainResult<UserRole> {
        if self.roles.find_by_id(role_id)?.is_none() {
            return Err(DomainError::not_found("role", role_id));
        }
        if self
            .user_roles
            .find_by_user_and_role(user_id, role_id)?
            .is_some()
        {
            return Err(DomainError::AlreadyAssigned { user_id, role_id });
        }

        let user_role = UserRole::new(user_id, role_id);
        self.user_roles.insert(user_role.clone())?;
        info!(user_id = %user_id, role_id = %role_id, "role assigned to user");
        Ok(user_role)
    }

    pub fn remove_role_from_user(&self, user_id: UserId, role_id: RoleId) -> DomainResult<()> {
        if self
            .user_roles
            .find_by_user_and_role(user_id, role_id)?
            .is_none()
        {
            return Err(DomainError::NotAssigned { user_id, role_id });
        }
        self.user_roles.delete(user_id, role_id)?;
        info!(user_id = %user_id, role_id = %role_id, "role removed from user");
        Ok(())
    }

    pub fn get_user_roles(&self, user_id: UserId) -> DomainResult<Vec<Role>> {
        let role_ids: Vec<RoleId> = self
            .user_roles
            .find_by_user_id(user_id)?
            .into_iter()
            .map(|ur| ur.role_id)
            .collect();
        self.roles.find_by_ids(&role_ids)
    }

    /// The union, deduplicated and sorted, of all permissions attached to
    /// any role the user holds, serialized as `"resource:action"` strings.
    pub fn get_user_permissions(&self, user_id: UserId) -> DomainResult<Vec<String>> {
        let role_ids: Vec<RoleId> = self
            .user_roles
            .find_by_user_id(user_id)?
            .into_iter()
            .map(|ur| ur.role_id)
            .collect();

        let mut keys: Vec<String> = self
            .permissions
            .find_by_role_ids(&role_ids)?
            .into_iter()
            .map(|p| p.key())
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// True iff `"resource:action"` is a member of the user's permission set.
    /// Exact-string match only.
    pub fn has_permission(
        &self,
        user_id: UserId,
        resource: &str,
        action: &str,
    ) -> DomainResult<bool> {
        let key = Permission::key_of(resource, action);
        let granted = self
            .get_user_permissions(user_id)?
            .iter()
            .any(|k| *k == key);
        debug!(user_id = %user_id, key = %key, granted, "permission check");
        Ok(granted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use opsdesk_store::InMemoryDirectory;

    use super::*;

    type Svc = RbacService<Arc<InMemoryDirectory>, Arc<InMemoryDirectory>, Arc<InMemoryDirectory>>;

    fn service() -> Svc {
        let dir = Arc::new(InMemoryDirectory::new());
        RbacService::new(dir.clone(), dir.clone(), dir)
    }

    #[test]
    fn create_role_rejects_duplicates_case_sensitively() {
        let svc = service();
        svc.create_role("Support", None).unwrap();

        let err = svc.create_role("Support", None).unwrap_err();
        assert_eq!(err, DomainError::validation("role already exists"));

        // Case-sensitive exact match: a different casing is a different role.
        svc.create_role("support", None).unwrap();
    }

    #[test]
    fn update_role_rejects_collision_with_other_role() {
        let svc = service();
        let support = svc.create_role("Support", None).unwrap();
        svc.create_role("Manager", None).unwrap();

        let err = svc
            .update_role(
                support.id,
                RoleUpdate {
                    name: Some("Manager".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, DomainError::validation("role already exists"));

        // Renaming to its own name is fine.
        svc.update_role(
            support.id,
            RoleUpdate {
                name: Some("Support".to_string()),
                description: Some("front line".to_string()),
            },
        )
        .unwrap();
    }

    #[test]
    fn assign_twice_fails_then_remove_twice_fails() {
        let svc = service();
        let role = svc.create_role("Support", None).unwrap();
        let user_id = UserId::new();

        svc.assign_role_to_user(user_id, role.id).unwrap();
        assert_eq!(
            svc.assign_role_to_user(user_id, role.id).unwrap_err(),
            DomainError::AlreadyAssigned {
                user_id,
                role_id: role.id
            }
        );

        svc.remove_role_from_user(user_id, role.id).unwrap();
        assert_eq!(
            svc.remove_role_from_user(user_id, role.id).unwrap_err(),
            DomainError::NotAssigned {
                user_id,
                role_id: role.id
            }
        );
    }

    #[test]
    fn assign_unknown_role_fails() {
        let svc = service();
        assert!(matches!(
            svc.assign_role_to_user(UserId::new(), RoleId::new())
                .unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }

    #[test]
    fn permissions_resolve_through_roles() {
        let svc = service();
        let support = svc.create_role("Support", None).unwrap();
        let resolve = svc.create_permission("ticket", "resolve").unwrap();
        svc.add_permission_to_role(support.id, resolve.id).unwrap();

        let user_id = UserId::new();
        svc.assign_role_to_user(user_id, support.id).unwrap();

        assert!(svc.has_permission(user_id, "ticket", "resolve").unwrap());
        assert!(!svc.has_permission(user_id, "ticket", "delete").unwrap());
        assert_eq!(
            svc.get_user_permissions(user_id).unwrap(),
            vec!["ticket:resolve".to_string()]
        );
    }

    #[test]
    fn user_permissions_union_across_roles_is_deduplicated() {
        let svc = service();
        let support = svc.create_role("Support", None).unwrap();
        let manager = svc.create_role("Manager", None).unwrap();
        let resolve = svc.create_permission("ticket", "resolve").unwrap();
        let close = svc.create_permission("ticket", "close").unwrap();

        svc.add_permission_to_role(support.id, resolve.id).unwrap();
        svc.add_permission_to_role(manager.id, resolve.id).unwrap();
        svc.add_permission_to_role(manager.id, close.id).unwrap();

        let user_id = UserId::new();
        svc.assign_role_to_user(user_id, support.id).unwrap();
        svc.assign_role_to_user(user_id, manager.id).unwrap();

        assert_eq!(
            svc.get_user_permissions(user_id).unwrap(),
            vec!["ticket:close".to_string(), "ticket:resolve".to_string()]
        );
    }

    #[test]
    fn no_wildcard_semantics() {
        let svc = service();
        let role = svc.create_role("Support", None).unwrap();
        let star = svc.create_permission("ticket", "*").unwrap();
        svc.add_permission_to_role(role.id, star.id).unwrap();

        let user_id = UserId::new();
        svc.assign_role_to_user(user_id, role.id).unwrap();

        // "ticket:*" is just another opaque key, not a wildcard.
        assert!(svc.has_permission(user_id, "ticket", "*").unwrap());
        assert!(!svc.has_permission(user_id, "ticket", "resolve").unwrap());
    }

    #[test]
    fn delete_role_cascades_assignments_and_grants() {
        let svc = service();
        let role = svc.create_role("Support", None).unwrap();
        let resolve = svc.create_permission("ticket", "resolve").unwrap();
        svc.add_permission_to_role(role.id, resolve.id).unwrap();

        let user_id = UserId::new();
        svc.assign_role_to_user(user_id, role.id).unwrap();

        svc.delete_role(role.id).unwrap();

        assert!(svc.get_user_roles(user_id).unwrap().is_empty());
        assert!(svc.get_user_permissions(user_id).unwrap().is_empty());
        assert!(!svc.has_permission(user_id, "ticket", "resolve").unwrap());
        // The permission definition itself survives the role.
        assert_eq!(svc.list_permissions().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_permission_key_is_rejected() {
        let svc = service();
        svc.create_permission("ticket", "resolve").unwrap();
        let err = svc.create_permission("ticket", "resolve").unwrap_err();
        assert_eq!(err, DomainError::validation("permission already exists"));
    }

    #[test]
    fn update_permission_rechecks_key_uniqueness() {
        let svc = service();
        svc.create_permission("ticket", "resolve").unwrap();
        let close = svc.create_permission("ticket", "close").unwrap();

        let err = svc
            .update_permission(
                close.id,
                PermissionUpdate {
                    action: Some("resolve".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, DomainError::validation("permission already exists"));

        let renamed = svc
            .update_permission(
                close.id,
                PermissionUpdate {
                    resource: Some("task".to_string()),
                    action: Some("close".to_string()),
                },
            )
            .unwrap();
        assert_eq!(renamed.key(), "task:close");
    }

    #[test]
    fn grant_requires_existing_role_and_permission() {
        let svc = service();
        let role = svc.create_role("Support", None).unwrap();

        assert!(matches!(
            svc.add_permission_to_role(role.id, PermissionId::new())
                .unwrap_err(),
            DomainError::NotFound { .. }
        ));
        assert!(matches!(
            svc.add_permission_to_role(RoleId::new(), PermissionId::new())
                .unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }
}

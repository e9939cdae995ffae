//! In-memory implementation of the store contracts.
//!
//! One backing struct implements all five contracts over a single
//! `RwLock`-guarded state, so cross-record cascades (role delete, path
//! cascade batches) commit under one write lock and are never observable
//! half-applied. Intended for tests/dev. Not optimized for performance.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use opsdesk_core::{DomainError, DomainResult, GroupId, PermissionId, RoleId, UserId};

use crate::group::{Group, GroupStore};
use crate::permission::{Permission, PermissionStore};
use crate::query::{Page, clamp_limit};
use crate::role::{Role, RoleStore};
use crate::user::{User, UserQuery, UserStore};
use crate::user_role::{UserRole, UserRoleStore};

#[derive(Debug, Default)]
struct DirectoryState {
    groups: HashMap<GroupId, Group>,
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
    role_grants: HashSet<(RoleId, PermissionId)>,
    user_roles: HashMap<(UserId, RoleId), UserRole>,
    users: HashMap<UserId, User>,
}

/// In-memory directory backing all store contracts.
///
/// Share it via `Arc` and hand the same clone to every service; the blanket
/// `Arc<S>` impls on the contracts make that transparent.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, DirectoryState>> {
        self.inner
            .read()
            .map_err(|_| DomainError::storage("lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, DirectoryState>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("lock poisoned"))
    }
}

impl GroupStore for InMemoryDirectory {
    fn find_by_id(&self, id: GroupId) -> DomainResult<Option<Group>> {
        Ok(self.read()?.groups.get(&id).cloned())
    }

    fn find_by_parent_id(&self, parent_id: GroupId) -> DomainResult<Vec<Group>> {
        let state = self.read()?;
        let mut children: Vec<Group> = state
            .groups
            .values()
            .filter(|g| g.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(children)
    }

    fn find_all(&self) -> DomainResult<Vec<Group>> {
        let state = self.read()?;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(groups)
    }

    fn insert(&self, group: Group) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.groups.contains_key(&group.id) {
            return Err(DomainError::conflict(format!(
                "group {} already exists",
                group.id
            )));
        }
        state.groups.insert(group.id, group);
        Ok(())
    }

    fn update(&self, mut group: Group) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.groups.contains_key(&group.id) {
            return Err(DomainError::not_found("group", group.id));
        }
        group.updated_at = Utc::now();
        state.groups.insert(group.id, group);
        Ok(())
    }

    fn update_many(&self, groups: Vec<Group>) -> DomainResult<()> {
        let mut state = self.write()?;
        for group in &groups {
            if !state.groups.contains_key(&group.id) {
                return Err(DomainError::not_found("group", group.id));
            }
        }
        let now = Utc::now();
        for mut group in groups {
            group.updated_at = now;
            state.groups.insert(group.id, group);
        }
        Ok(())
    }

    fn delete(&self, id: GroupId) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.groups.remove(&id).is_none() {
            return Err(DomainError::not_found("group", id));
        }
        Ok(())
    }
}

impl RoleStore for InMemoryDirectory {
    fn find_by_id(&self, id: RoleId) -> DomainResult<Option<Role>> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>> {
        let state = self.read()?;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    fn find_all(&self) -> DomainResult<Vec<Role>> {
        let state = self.read()?;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roles)
    }

    fn find_by_ids(&self, ids: &[RoleId]) -> DomainResult<Vec<Role>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.roles.get(id).cloned())
            .collect())
    }

    fn insert(&self, role: Role) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.roles.contains_key(&role.id) {
            return Err(DomainError::conflict(format!(
                "role {} already exists",
                role.id
            )));
        }
        state.roles.insert(role.id, role);
        Ok(())
    }

    fn update(&self, mut role: Role) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.roles.contains_key(&role.id) {
            return Err(DomainError::not_found("role", role.id));
        }
        role.updated_at = Utc::now();
        state.roles.insert(role.id, role);
        Ok(())
    }

    fn delete(&self, id: RoleId) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.roles.remove(&id).is_none() {
            return Err(DomainError::not_found("role", id));
        }
        // Cascade: grants and user assignments go with the role, atomically.
        state.role_grants.retain(|(role_id, _)| *role_id != id);
        state.user_roles.retain(|(_, role_id), _| *role_id != id);
        Ok(())
    }

    fn add_permission(&self, role_id: RoleId, permission_id: PermissionId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.roles.contains_key(&role_id) {
            return Err(DomainError::not_found("role", role_id));
        }
        if !state.permissions.contains_key(&permission_id) {
            return Err(DomainError::not_found("permission", permission_id));
        }
        state.role_grants.insert((role_id, permission_id));
        Ok(())
    }

    fn remove_permission(&self, role_id: RoleId, permission_id: PermissionId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.roles.contains_key(&role_id) {
            return Err(DomainError::not_found("role", role_id));
        }
        state.role_grants.remove(&(role_id, permission_id));
        Ok(())
    }

    fn permission_ids_for(&self, role_id: RoleId) -> DomainResult<Vec<PermissionId>> {
        let state = self.read()?;
        let mut ids: Vec<PermissionId> = state
            .role_grants
            .iter()
            .filter(|(r, _)| *r == role_id)
            .map(|(_, p)| *p)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl PermissionStore for InMemoryDirectory {
    fn find_by_id(&self, id: PermissionId) -> DomainResult<Option<Permission>> {
        Ok(self.read()?.permissions.get(&id).cloned())
    }

    fn find_by_key(&self, key: &str) -> DomainResult<Option<Permission>> {
        let state = self.read()?;
        Ok(state.permissions.values().find(|p| p.key() == key).cloned())
    }

    fn find_all(&self) -> DomainResult<Vec<Permission>> {
        let state = self.read()?;
        let mut permissions: Vec<Permission> = state.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(permissions)
    }

    fn find_by_role_ids(&self, role_ids: &[RoleId]) -> DomainResult<Vec<Permission>> {
        let state = self.read()?;
        let wanted: HashSet<RoleId> = role_ids.iter().copied().collect();
        let mut ids: Vec<PermissionId> = state
            .role_grants
            .iter()
            .filter(|(role_id, _)| wanted.contains(role_id))
            .map(|(_, permission_id)| *permission_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.permissions.get(&id).cloned())
            .collect())
    }

    fn insert(&self, permission: Permission) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.permissions.contains_key(&permission.id) {
            return Err(DomainError::conflict(format!(
                "permission {} already exists",
                permission.id
            )));
        }
        state.permissions.insert(permission.id, permission);
        Ok(())
    }

    fn update(&self, permission: Permission) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.permissions.contains_key(&permission.id) {
            return Err(DomainError::not_found("permission", permission.id));
        }
        state.permissions.insert(permission.id, permission);
        Ok(())
    }

    fn delete(&self, id: PermissionId) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.permissions.remove(&id).is_none() {
            return Err(DomainError::not_found("permission", id));
        }
        state.role_grants.retain(|(_, perm_id)| *perm_id != id);
        Ok(())
    }
}

impl UserRoleStore for InMemoryDirectory {
    fn find_by_user_and_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> DomainResult<Option<UserRole>> {
        Ok(self.read()?.user_roles.get(&(user_id, role_id)).cloned())
    }

    fn find_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<UserRole>> {
        let state = self.read()?;
        let mut rows: Vec<UserRole> = state
            .user_roles
            .values()
            .filter(|ur| ur.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.role_id.cmp(&b.role_id));
        Ok(rows)
    }

    fn insert(&self, user_role: UserRole) -> DomainResult<()> {
        let mut state = self.write()?;
        let key = (user_role.user_id, user_role.role_id);
        if state.user_roles.contains_key(&key) {
            return Err(DomainError::AlreadyAssigned {
                user_id: user_role.user_id,
                role_id: user_role.role_id,
            });
        }
        state.user_roles.insert(key, user_role);
        Ok(())
    }

    fn delete(&self, user_id: UserId, role_id: RoleId) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.user_roles.remove(&(user_id, role_id)).is_none() {
            return Err(DomainError::NotAssigned { user_id, role_id });
        }
        Ok(())
    }
}

impl UserStore for InMemoryDirectory {
    fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn insert(&self, user: User) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.users.contains_key(&user.id) {
            return Err(DomainError::conflict(format!(
                "user {} already exists",
                user.id
            )));
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    fn update(&self, mut user: User) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.users.contains_key(&user.id) {
            return Err(DomainError::not_found("user", user.id));
        }
        user.updated_at = Utc::now();
        state.users.insert(user.id, user);
        Ok(())
    }

    fn delete(&self, id: UserId) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.users.remove(&id).is_none() {
            return Err(DomainError::not_found("user", id));
        }
        state.user_roles.retain(|(user_id, _), _| *user_id != id);
        Ok(())
    }

    fn search(&self, query: &UserQuery) -> DomainResult<Page<User>> {
        let state = self.read()?;
        let scope: HashSet<GroupId> = query.group_ids.iter().copied().collect();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<User> = state
            .users
            .values()
            .filter(|u| scope.contains(&u.home_group_id))
            .filter(|u| query.status.is_none_or(|s| u.status == s))
            .filter(|u| {
                needle.as_ref().is_none_or(|n| {
                    u.email.to_lowercase().contains(n)
                        || u.display_name.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));

        let total = matches.len() as u64;
        let limit = clamp_limit(query.limit) as usize;
        let offset = query.offset as usize;
        let items = matches.into_iter().skip(offset).take(limit).collect();

        Ok(Page { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: &str, email: &str, home: GroupId) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            is_super_admin: false,
            is_group_admin: false,
            home_group_id: home,
            status: crate::UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_delete_cascades_grants_and_assignments() {
        let dir = InMemoryDirectory::new();

        let role = Role::new(RoleId::new(), "support", None);
        let role_id = role.id;
        RoleStore::insert(&dir, role).unwrap();

        let perm = Permission::new(PermissionId::new(), "ticket", "resolve");
        let perm_id = perm.id;
        PermissionStore::insert(&dir, perm).unwrap();
        dir.add_permission(role_id, perm_id).unwrap();

        let user_id = UserId::new();
        UserRoleStore::insert(&dir, UserRole::new(user_id, role_id)).unwrap();

        RoleStore::delete(&dir, role_id).unwrap();

        assert!(dir.permission_ids_for(role_id).unwrap().is_empty());
        assert!(
            dir.find_by_user_and_role(user_id, role_id)
                .unwrap()
                .is_none()
        );
        // The permission itself survives; only the edge is gone.
        assert!(PermissionStore::find_by_id(&dir, perm_id).unwrap().is_some());
    }

    #[test]
    fn permission_delete_cascades_grants() {
        let dir = InMemoryDirectory::new();

        let role = Role::new(RoleId::new(), "support", None);
        let role_id = role.id;
        RoleStore::insert(&dir, role).unwrap();

        let perm = Permission::new(PermissionId::new(), "ticket", "resolve");
        let perm_id = perm.id;
        PermissionStore::insert(&dir, perm).unwrap();
        dir.add_permission(role_id, perm_id).unwrap();

        PermissionStore::delete(&dir, perm_id).unwrap();
        assert!(dir.permission_ids_for(role_id).unwrap().is_empty());
    }

    #[test]
    fn duplicate_assignment_is_rejected_at_the_store() {
        let dir = InMemoryDirectory::new();
        let (user_id, role_id) = (UserId::new(), RoleId::new());

        UserRoleStore::insert(&dir, UserRole::new(user_id, role_id)).unwrap();
        let err = UserRoleStore::insert(&dir, UserRole::new(user_id, role_id)).unwrap_err();
        assert_eq!(err, DomainError::AlreadyAssigned { user_id, role_id });
    }

    #[test]
    fn search_clamps_limit_and_counts_before_pagination() {
        let dir = InMemoryDirectory::new();
        let home = GroupId::new();
        for i in 0..150 {
            UserStore::insert(&dir, user(&format!("user{i:03}"), &format!("u{i}@x.dev"), home))
                .unwrap();
        }

        let page = dir
            .search(&UserQuery {
                group_ids: vec![home],
                search: None,
                status: None,
                limit: 500,
                offset: 0,
            })
            .unwrap();

        assert_eq!(page.total, 150);
        assert_eq!(page.items.len(), crate::MAX_PAGE_SIZE as usize);
    }

    #[test]
    fn search_is_case_insensitive_on_email_and_display_name() {
        let dir = InMemoryDirectory::new();
        let home = GroupId::new();
        UserStore::insert(&dir, user("Alice Smith", "alice@example.com", home)).unwrap();
        UserStore::insert(&dir, user("Bob Jones", "bob@example.com", home)).unwrap();

        let page = dir
            .search(&UserQuery {
                group_ids: vec![home],
                search: Some("ALICE".to_string()),
                status: None,
                limit: 10,
                offset: 0,
            })
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].display_name, "Alice Smith");
    }

    #[test]
    fn search_outside_scope_matches_nothing() {
        let dir = InMemoryDirectory::new();
        let home = GroupId::new();
        UserStore::insert(&dir, user("Alice Smith", "alice@example.com", home)).unwrap();

        let page = dir
            .search(&UserQuery {
                group_ids: vec![GroupId::new()],
                search: None,
                status: None,
                limit: 10,
                offset: 0,
            })
            .unwrap();

        assert_eq!(page, Page::empty());
    }
}

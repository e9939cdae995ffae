//! Administrative scope resolution and scoped entity listing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use opsdesk_core::{DomainResult, GroupId};
use opsdesk_store::{DEFAULT_PAGE_SIZE, Page, User, UserQuery, UserStatus, UserStore};

use crate::context::PermissionContext;

/// Compute the groups an actor may administer.
///
/// - Super-admin: every group in the hierarchy snapshot.
/// - Group-admin: the actor's own subtree, home group inclusive.
/// - Plain user: the home group only (self-scope, no administrative reach).
///
/// Read-only and side-effect-free; re-derive whenever the context or the
/// hierarchy changes, never cache across mutations.
pub fn manageable_groups(ctx: &PermissionContext) -> Vec<GroupId> {
    if ctx.is_super_admin() {
        return ctx.hierarchy().group_ids().to_vec();
    }

    if ctx.is_group_admin() {
        let mut out = vec![ctx.home_group_id()];
        out.extend(ctx.hierarchy().descendants_of(ctx.home_group_id()));
        return out;
    }

    vec![ctx.home_group_id()]
}

/// Closed filter for a scoped user listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    /// Case-insensitive match against email and display name.
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    /// Restrict to one group; intersected with the caller's manageable set.
    pub group_id: Option<GroupId>,
    pub limit: u32,
    pub offset: u32,
}

impl UserFilter {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Default::default()
        }
    }
}

/// Scopes user listings to what the actor may legitimately see.
pub struct ScopedUserDirectory<S> {
    users: S,
}

impl<S> ScopedUserDirectory<S>
where
    S: UserStore,
{
    pub fn new(users: S) -> Self {
        Self { users }
    }

    /// List users visible to `ctx`, merging the caller's filters with the
    /// manageable scope.
    ///
    /// A requested `group_id` outside the manageable set yields an empty
    /// page rather than an error, so a caller cannot distinguish "no
    /// visibility there" from "group has no members".
    pub fn list_users(
        &self,
        ctx: &PermissionContext,
        filter: &UserFilter,
    ) -> DomainResult<Page<User>> {
        let manageable = manageable_groups(ctx);

        let group_ids = match filter.group_id {
            Some(requested) => {
                if !manageable.contains(&requested) {
                    debug!(
                        user_id = %ctx.user_id(),
                        group_id = %requested,
                        "requested group outside manageable scope"
                    );
                    return Ok(Page::empty());
                }
                vec![requested]
            }
            None => manageable,
        };

        let limit = if filter.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            filter.limit
        };

        self.users.search(&UserQuery {
            group_ids,
            search: filter.search.clone(),
            status: filter.status,
            limit,
            offset: filter.offset,
        })
    }
}

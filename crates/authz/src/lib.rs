//! `opsdesk-authz` — authorization contexts and scope resolution.
//!
//! Every authorization decision flows through one derivation path: load a
//! user's raw identity attributes, snapshot the group hierarchy, build an
//! immutable [`PermissionContext`], then resolve what that context may see
//! or administer. This crate is intentionally decoupled from HTTP and
//! storage technology.

pub mod context;
pub mod scope;

pub use context::{PermissionContext, PermissionContextFactory};
pub use scope::{ScopedUserDirectory, UserFilter, manageable_groups};

//! `opsdesk-rbac` — role and permission lifecycle, and permission evaluation.

pub mod service;

pub use service::{PermissionUpdate, RbacService, RoleUpdate};

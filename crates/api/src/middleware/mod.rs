//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the admin behind a bearer token with an active session.
//! - [`rbac::RequireAdmin`] -- requires `admin` or `super_admin`.
//! - [`rbac::RequireSuperAdmin`] -- requires `super_admin`.

pub mod auth;
pub mod rbac;

//! Well-known admin role names.
//!
//! Stored in the `role` field of `admins` documents and embedded in session
//! tokens.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// All roles an admin document may carry.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_SUPER_ADMIN];

/// Whether `role` grants access to the admin console at all.
pub fn is_admin_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

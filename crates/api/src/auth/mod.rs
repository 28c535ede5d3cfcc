//! Authentication primitives and the session context.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- HS256 session-token generation and validation.
//! - [`identity`] -- the identity provider contract and its local adapter.
//! - [`session`] -- the registry of active admin sessions.

pub mod identity;
pub mod jwt;
pub mod password;
pub mod session;

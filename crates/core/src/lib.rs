//! Domain building blocks for the Atelier admin console.
//!
//! Everything here is pure: no I/O, no async. The store adapters, the HTTP
//! layer and any future tooling build on these types and functions.

pub mod chat;
pub mod document;
pub mod error;
pub mod export;
pub mod filter;
pub mod roles;
pub mod schema;
pub mod session;
pub mod stats;
pub mod storage;
pub mod types;
pub mod validation;

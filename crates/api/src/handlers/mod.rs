//! Request handlers.
//!
//! [`crud`] serves every admin collection generically; the remaining
//! submodules cover endpoints with behaviour of their own. Handlers delegate
//! to the [`Facade`](atelier_db::Facade) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod admins;
pub mod auth;
pub mod chat;
pub mod crud;
pub mod dashboard;
pub mod login_requests;
pub mod uploads;

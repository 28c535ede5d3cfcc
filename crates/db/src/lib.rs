//! Persistence for the Atelier admin console.
//!
//! - [`store`] -- the [`DocumentStore`](store::DocumentStore) trait, errors and change feed.
//! - [`memory`] -- in-process store used for development and tests.
//! - [`postgres`] -- JSONB-backed store for production.
//! - [`object_store`] -- the object storage trait and its filesystem adapter.
//! - [`models`] -- typed entity views over documents.
//! - [`facade`] -- one call per (collection, operation).

use sqlx::postgres::PgPoolOptions;

pub mod facade;
pub mod memory;
pub mod models;
pub mod object_store;
pub mod postgres;
pub mod store;

pub use facade::{Envelope, Facade};
pub use memory::MemoryStore;
pub use object_store::{LocalObjectStore, ObjectStore, UploadProgress};
pub use postgres::PgDocumentStore;
pub use store::{ChangeKind, DocumentStore, StoreChange, StoreError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

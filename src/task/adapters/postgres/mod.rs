//! `PostgreSQL` adapters for task workflow persistence.
//!
//! The schema lives in `migrations/`; apply it before constructing a
//! [`PostgresTaskStore`].

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskStore, TaskPgPool};

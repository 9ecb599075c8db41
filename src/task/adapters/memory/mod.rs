//! In-memory adapters for tests and single-process use.

mod catalog;
mod store;

pub use catalog::{InMemoryCompanyDirectory, InMemoryServiceCatalog};
pub use store::InMemoryTaskStore;

//! Port contracts for the fulfilment workflow.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod catalog;
pub mod documents;
pub mod ledger;
pub mod repository;

pub use catalog::{CatalogError, CompanyDirectory, ServiceCatalog, ServiceSummary};
pub use documents::DocumentRepository;
pub use ledger::StatusLedger;
pub use repository::{
    TaskCommit, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};

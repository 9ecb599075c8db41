//! Task lifecycle management.
//!
//! A task moves through `NEW`, `DOCUMENTS_UPLOADED`, `ASSIGNED`,
//! `IN_PROGRESS` and finally `COMPLETED` or `REJECTED`. Each mutation is
//! committed together with exactly one ledger entry, and documents are
//! attached either at intake or as final deliverables. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

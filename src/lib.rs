//! Servicedesk: task workflow engine for a professional-services
//! marketplace.
//!
//! Customers request a catalog service, the fulfilling company triages the
//! request and assigns a professional, and the professional works it to
//! completion. Every change is recorded in an append-only status ledger
//! whose internal entries are hidden from customers.
//!
//! # Architecture
//!
//! Servicedesk follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, storage)
//!
//! # Modules
//!
//! - [`blob`]: Storage for uploaded file contents
//! - [`task`]: Task lifecycle, status ledger and role-scoped queries

pub mod blob;
pub mod task;

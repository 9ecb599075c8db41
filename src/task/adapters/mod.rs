//! Adapter implementations for task workflow ports.

pub mod memory;
pub mod postgres;

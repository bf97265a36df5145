//! Supplier reference data.
//!
//! Suppliers are managed outside this subsystem; procurement references them
//! and forecasting reads their average lead time for safety-stock buffers.

pub mod supplier;

pub use supplier::{ContactInfo, Supplier};

//! Purchase order domain module.
//!
//! Owns the order lifecycle state machine and the all-or-nothing receipt
//! application logic, implemented purely as deterministic domain rules (no
//! IO, no storage). The corresponding ledger writes are coordinated by the
//! infrastructure services.

pub mod order;

pub use order::{
    LineReceipt, OrderLineSpec, OrderStatus, PurchaseOrder, PurchaseOrderLine,
};

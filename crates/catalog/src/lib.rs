//! Catalog reference data (items and batches).
//!
//! Items and batch lot/expiry records are owned by catalog management; the
//! inventory core references them and never duplicates them. This crate is
//! pure data + validation (no IO, no storage).

pub mod batch;
pub mod item;

pub use batch::Batch;
pub use item::{Category, Item, UnitOfMeasure};

//! Infrastructure for the inventory & procurement core.
//!
//! Composes the pure domain crates into a running subsystem: the in-memory
//! movement/order/reference stores, the `StockLedger` executor that
//! serializes writers per item, the derived `InventoryRepository` view, and
//! the application services exposing the external operation surface.
//!
//! Transport and persistence engines are out of scope; the store traits are
//! the seam where a real backend would plug in.

pub mod catalog_store;
pub mod movement_store;
pub mod order_store;
pub mod repository;
pub mod services;
pub mod stock_ledger;


pub use catalog_store::{
    BatchRegistry, InMemoryBatchRegistry, InMemoryItemCatalog, InMemorySupplierDirectory,
    ItemCatalog, SupplierDirectory,
};
pub use movement_store::{
    AppendBatch, InMemoryMovementStore, MovementStore, StockLevel, StoreError,
};
pub use order_store::{InMemoryOrderStore, OrderStore};
pub use repository::{
    InventoryPage, InventoryQuery, InventoryRepository, InventorySort, ItemSummary, StockStatus,
};
pub use services::AppServices;
pub use stock_ledger::{ReconcileOutcome, StockLedger};

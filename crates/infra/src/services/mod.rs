//! Application services: the operation surface consumed by external
//! collaborators (transport/encoding is their concern, not ours).
//!
//! One facade wires the in-memory stores to the ledger executor and the
//! derived repository view. Wall-clock time enters the system only here;
//! every deterministic `*_at` variant takes explicit time for tests.

mod analytics;
mod inventory;
mod procurement;

pub mod dto;

pub use analytics::{AnalyticsReport, CategoryShare};

use std::sync::Arc;

use rxstock_analytics::ForecastConfig;
use rxstock_catalog::{Batch, Item};
use rxstock_suppliers::Supplier;

use crate::catalog_store::{
    BatchRegistry, InMemoryBatchRegistry, InMemoryItemCatalog, InMemorySupplierDirectory,
    ItemCatalog, SupplierDirectory,
};
use crate::movement_store::InMemoryMovementStore;
use crate::order_store::InMemoryOrderStore;
use crate::repository::InventoryRepository;
use crate::stock_ledger::StockLedger;

type Movements = Arc<InMemoryMovementStore>;
type Catalog = Arc<InMemoryItemCatalog>;
type Batches = Arc<InMemoryBatchRegistry>;

/// In-memory service wiring (dev/test); persistent backends would replace
/// the stores behind the same traits.
pub struct AppServices {
    pub(crate) movements: Movements,
    pub(crate) catalog: Catalog,
    pub(crate) batches: Batches,
    pub(crate) suppliers: Arc<InMemorySupplierDirectory>,
    pub(crate) orders: Arc<InMemoryOrderStore>,
    pub(crate) ledger: StockLedger<Movements, Catalog>,
    pub(crate) repository: InventoryRepository<Movements, Catalog, Batches>,
    pub(crate) forecast_config: ForecastConfig,
    pub(crate) default_lead_time_days: u32,
}

impl AppServices {
    pub fn new() -> Self {
        let movements = Arc::new(InMemoryMovementStore::new());
        let catalog = Arc::new(InMemoryItemCatalog::new());
        let batches = Arc::new(InMemoryBatchRegistry::new());
        let suppliers = Arc::new(InMemorySupplierDirectory::new());
        let orders = Arc::new(InMemoryOrderStore::new());

        let ledger = StockLedger::new(movements.clone(), catalog.clone());
        let repository =
            InventoryRepository::new(movements.clone(), catalog.clone(), batches.clone());

        Self {
            movements,
            catalog,
            batches,
            suppliers,
            orders,
            ledger,
            repository,
            forecast_config: ForecastConfig::default(),
            default_lead_time_days: 7,
        }
    }

    pub fn with_forecast_config(mut self, config: ForecastConfig) -> Self {
        self.forecast_config = config;
        self
    }

    /// Lead time used when an item was never ordered from any supplier.
    pub fn with_default_lead_time(mut self, days: u32) -> Self {
        self.default_lead_time_days = days;
        self
    }

    // Catalog management integration points: items, suppliers and batch
    // metadata are owned outside this subsystem and surfaced through here.

    pub fn register_item(&self, item: Item) {
        self.catalog.upsert(item);
    }

    pub fn register_supplier(&self, supplier: Supplier) {
        self.suppliers.upsert(supplier);
    }

    pub fn register_batch(&self, batch: Batch) -> Batch {
        self.batches.register(batch)
    }

    pub fn ledger(&self) -> &StockLedger<Movements, Catalog> {
        &self.ledger
    }

    pub fn repository(&self) -> &InventoryRepository<Movements, Catalog, Batches> {
        &self.repository
    }
}

impl Default for AppServices {
    fn default() -> Self {
        Self::new()
    }
}

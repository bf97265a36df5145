//! In-memory reference-data stores (items, batches, suppliers).
//!
//! Items and suppliers are owned by external catalog management; these
//! stores are the integration point where that data is made available to
//! the subsystem. Batch lot/expiry records are additionally registered at
//! receipt time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rxstock_catalog::{Batch, Item};
use rxstock_core::{BatchId, ItemId, SupplierId};
use rxstock_suppliers::Supplier;

/// Read access plus upsert for catalog items.
pub trait ItemCatalog: Send + Sync {
    fn get(&self, item_id: &ItemId) -> Option<Item>;
    fn list(&self) -> Vec<Item>;
    fn upsert(&self, item: Item);
}

/// Lot/expiry records per item.
pub trait BatchRegistry: Send + Sync {
    /// Register a batch, reusing the existing record when the same
    /// `(item, lot)` pair was registered before.
    fn register(&self, batch: Batch) -> Batch;
    fn get(&self, batch_id: &BatchId) -> Option<Batch>;
    fn for_item(&self, item_id: &ItemId) -> Vec<Batch>;
}

/// Supplier directory.
pub trait SupplierDirectory: Send + Sync {
    fn get(&self, supplier_id: &SupplierId) -> Option<Supplier>;
    fn list(&self) -> Vec<Supplier>;
    fn upsert(&self, supplier: Supplier);
}

impl<S> ItemCatalog for Arc<S>
where
    S: ItemCatalog + ?Sized,
{
    fn get(&self, item_id: &ItemId) -> Option<Item> {
        (**self).get(item_id)
    }

    fn list(&self) -> Vec<Item> {
        (**self).list()
    }

    fn upsert(&self, item: Item) {
        (**self).upsert(item)
    }
}

impl<S> BatchRegistry for Arc<S>
where
    S: BatchRegistry + ?Sized,
{
    fn register(&self, batch: Batch) -> Batch {
        (**self).register(batch)
    }

    fn get(&self, batch_id: &BatchId) -> Option<Batch> {
        (**self).get(batch_id)
    }

    fn for_item(&self, item_id: &ItemId) -> Vec<Batch> {
        (**self).for_item(item_id)
    }
}

impl<S> SupplierDirectory for Arc<S>
where
    S: SupplierDirectory + ?Sized,
{
    fn get(&self, supplier_id: &SupplierId) -> Option<Supplier> {
        (**self).get(supplier_id)
    }

    fn list(&self) -> Vec<Supplier> {
        (**self).list()
    }

    fn upsert(&self, supplier: Supplier) {
        (**self).upsert(supplier)
    }
}

/// In-memory item catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryItemCatalog {
    inner: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemCatalog for InMemoryItemCatalog {
    fn get(&self, item_id: &ItemId) -> Option<Item> {
        self.inner.read().ok()?.get(item_id).cloned()
    }

    fn list(&self) -> Vec<Item> {
        match self.inner.read() {
            Ok(map) => {
                let mut items: Vec<Item> = map.values().cloned().collect();
                items.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
                items
            }
            Err(_) => vec![],
        }
    }

    fn upsert(&self, item: Item) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(item.id(), item);
        }
    }
}

/// In-memory batch registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBatchRegistry {
    inner: RwLock<HashMap<BatchId, Batch>>,
}

impl InMemoryBatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchRegistry for InMemoryBatchRegistry {
    fn register(&self, batch: Batch) -> Batch {
        let Ok(mut map) = self.inner.write() else {
            return batch;
        };
        if let Some(existing) = map
            .values()
            .find(|b| b.item_id() == batch.item_id() && b.lot() == batch.lot())
        {
            return existing.clone();
        }
        map.insert(batch.id(), batch.clone());
        batch
    }

    fn get(&self, batch_id: &BatchId) -> Option<Batch> {
        self.inner.read().ok()?.get(batch_id).cloned()
    }

    fn for_item(&self, item_id: &ItemId) -> Vec<Batch> {
        match self.inner.read() {
            Ok(map) => {
                let mut batches: Vec<Batch> = map
                    .values()
                    .filter(|b| b.item_id() == *item_id)
                    .cloned()
                    .collect();
                batches.sort_by_key(Batch::expiry);
                batches
            }
            Err(_) => vec![],
        }
    }
}

/// In-memory supplier directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySupplierDirectory {
    inner: RwLock<HashMap<SupplierId, Supplier>>,
}

impl InMemorySupplierDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SupplierDirectory for InMemorySupplierDirectory {
    fn get(&self, supplier_id: &SupplierId) -> Option<Supplier> {
        self.inner.read().ok()?.get(supplier_id).cloned()
    }

    fn list(&self) -> Vec<Supplier> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn upsert(&self, supplier: Supplier) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(supplier.id(), supplier);
        }
    }
}

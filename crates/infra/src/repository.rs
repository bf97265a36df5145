//! Derived inventory view.
//!
//! All balance reads go through here; the view is computed from the
//! canonical catalog + ledger state on every call and never stored, so it
//! cannot drift from the movement log. Status labels and totals are pure
//! functions over that state.

use serde::{Deserialize, Serialize};

use rxstock_analytics::{BatchStock, StockSnapshot};
use rxstock_catalog::{Category, Item};
use rxstock_core::{DomainError, DomainResult, ItemId};

use crate::catalog_store::{BatchRegistry, ItemCatalog};
use crate::movement_store::MovementStore;

/// Computed stock status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Normal,
    Low,
    Critical,
}

impl StockStatus {
    /// Pure derivation: `critical` at zero stock or at most half the
    /// minimum threshold, `low` at or below the threshold.
    pub fn compute(on_hand: i64, minimum_threshold: i64) -> Self {
        if on_hand <= 0 || (minimum_threshold > 0 && on_hand * 2 <= minimum_threshold) {
            StockStatus::Critical
        } else if on_hand <= minimum_threshold {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }
}

/// One inventory row: the item annotated with its derived balance, status
/// and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item: Item,
    pub on_hand: i64,
    pub status: StockStatus,
    /// `on_hand × unit_cost`, in minor units.
    pub total_value: u64,
}

/// Sort key for inventory listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventorySort {
    /// Alphabetical by item name.
    #[default]
    Name,
    /// Lowest stock first.
    Stock,
    /// Highest value first.
    Value,
}

/// Inventory listing query. Pages are 1-based; the limit is capped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub sort: InventorySort,
    pub page: u32,
    pub limit: u32,
}

impl Default for InventoryQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            sort: InventorySort::Name,
            page: 1,
            limit: 50,
        }
    }
}

/// One page of inventory rows plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPage {
    pub items: Vec<ItemSummary>,
    pub total: u64,
}

const MAX_PAGE_LIMIT: u32 = 1000;

/// Read-only inventory view over the catalog, batch registry and ledger.
#[derive(Debug)]
pub struct InventoryRepository<S, C, B> {
    store: S,
    catalog: C,
    batches: B,
}

impl<S, C, B> InventoryRepository<S, C, B>
where
    S: MovementStore,
    C: ItemCatalog,
    B: BatchRegistry,
{
    pub fn new(store: S, catalog: C, batches: B) -> Self {
        Self {
            store,
            catalog,
            batches,
        }
    }

    /// Current recorded balance for one item.
    pub fn current_stock(&self, item_id: ItemId) -> DomainResult<i64> {
        if self.catalog.get(&item_id).is_none() {
            return Err(DomainError::not_found(format!("item {item_id}")));
        }
        Ok(self.store.level(&item_id).map(|l| l.on_hand).unwrap_or(0))
    }

    /// List inventory with search/filter/sort/pagination, each row
    /// annotated with computed status and value.
    pub fn list(&self, query: &InventoryQuery) -> InventoryPage {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<ItemSummary> = self
            .catalog
            .list()
            .into_iter()
            .filter(|item| {
                query.category.is_none_or(|c| item.category() == c)
                    && needle
                        .as_deref()
                        .is_none_or(|n| item.name().to_lowercase().contains(n))
            })
            .map(|item| self.summarize(item))
            .collect();

        match query.sort {
            InventorySort::Name => {
                rows.sort_by(|a, b| {
                    a.item
                        .name()
                        .to_lowercase()
                        .cmp(&b.item.name().to_lowercase())
                });
            }
            InventorySort::Stock => rows.sort_by_key(|r| r.on_hand),
            InventorySort::Value => rows.sort_by(|a, b| b.total_value.cmp(&a.total_value)),
        }

        let total = rows.len() as u64;
        let limit = query.limit.clamp(1, MAX_PAGE_LIMIT) as usize;
        let offset = (query.page.max(1) - 1) as usize * limit;
        let items = rows.into_iter().skip(offset).take(limit).collect();

        InventoryPage { items, total }
    }

    /// Consistent point-in-time snapshot of one item for analytics.
    pub fn snapshot(&self, item_id: ItemId) -> DomainResult<StockSnapshot> {
        let item = self
            .catalog
            .get(&item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;
        Ok(self.snapshot_of(item))
    }

    /// Snapshots of every catalog item.
    pub fn snapshots(&self) -> Vec<StockSnapshot> {
        self.catalog
            .list()
            .into_iter()
            .map(|item| self.snapshot_of(item))
            .collect()
    }

    fn summarize(&self, item: Item) -> ItemSummary {
        let on_hand = self.store.level(&item.id()).map(|l| l.on_hand).unwrap_or(0);
        ItemSummary {
            status: StockStatus::compute(on_hand, item.minimum_threshold()),
            total_value: on_hand.max(0) as u64 * item.unit_cost(),
            on_hand,
            item,
        }
    }

    fn snapshot_of(&self, item: Item) -> StockSnapshot {
        let level = self.store.level(&item.id()).unwrap_or_default();
        let batches = self
            .batches
            .for_item(&item.id())
            .into_iter()
            .map(|batch| BatchStock {
                on_hand: level.by_batch.get(&batch.id()).copied().unwrap_or(0),
                batch,
            })
            .collect();
        StockSnapshot {
            on_hand: level.on_hand,
            batches,
            item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use rxstock_catalog::UnitOfMeasure;
    use rxstock_core::{ActorId, ExpectedVersion};
    use rxstock_ledger::{MovementKind, MovementRecord};

    use crate::catalog_store::{InMemoryBatchRegistry, InMemoryItemCatalog};
    use crate::movement_store::{AppendBatch, InMemoryMovementStore};

    fn setup() -> (
        InventoryRepository<
            Arc<InMemoryMovementStore>,
            Arc<InMemoryItemCatalog>,
            Arc<InMemoryBatchRegistry>,
        >,
        Arc<InMemoryMovementStore>,
        Arc<InMemoryItemCatalog>,
    ) {
        let store = Arc::new(InMemoryMovementStore::new());
        let catalog = Arc::new(InMemoryItemCatalog::new());
        let batches = Arc::new(InMemoryBatchRegistry::new());
        (
            InventoryRepository::new(store.clone(), catalog.clone(), batches),
            store,
            catalog,
        )
    }

    fn seed_item(
        catalog: &InMemoryItemCatalog,
        store: &InMemoryMovementStore,
        name: &str,
        category: Category,
        unit_cost: u64,
        threshold: i64,
        on_hand: i64,
    ) -> ItemId {
        let item = Item::new(
            ItemId::new(),
            name,
            category,
            unit_cost,
            threshold,
            UnitOfMeasure::Tablet,
        )
        .unwrap();
        let item_id = item.id();
        catalog.upsert(item);
        if on_hand > 0 {
            store
                .append(AppendBatch {
                    item_id,
                    expected: ExpectedVersion::Exact(0),
                    records: vec![MovementRecord {
                        item_id,
                        batch_id: None,
                        kind: MovementKind::Receipt,
                        quantity_delta: on_hand,
                        unit_cost: Some(unit_cost),
                        actor: ActorId::new(),
                        reason: None,
                        related_order_id: None,
                        occurred_at: Utc::now(),
                    }],
                })
                .unwrap();
        }
        item_id
    }

    #[test]
    fn status_tiers() {
        assert_eq!(StockStatus::compute(0, 20), StockStatus::Critical);
        assert_eq!(StockStatus::compute(10, 20), StockStatus::Critical);
        assert_eq!(StockStatus::compute(11, 20), StockStatus::Low);
        assert_eq!(StockStatus::compute(20, 20), StockStatus::Low);
        assert_eq!(StockStatus::compute(21, 20), StockStatus::Normal);
        // No threshold configured: anything positive is normal.
        assert_eq!(StockStatus::compute(1, 0), StockStatus::Normal);
        assert_eq!(StockStatus::compute(0, 0), StockStatus::Critical);
    }

    #[test]
    fn list_annotates_filters_and_pages() {
        let (repo, store, catalog) = setup();
        seed_item(&catalog, &store, "Aspirin 100mg", Category::Analgesic, 100, 20, 50);
        seed_item(&catalog, &store, "Amoxicillin 250mg", Category::Antibiotic, 250, 20, 5);
        seed_item(&catalog, &store, "Aciclovir cream", Category::Dermatological, 420, 10, 0);

        let all = repo.list(&InventoryQuery::default());
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].item.name(), "Aciclovir cream");
        assert_eq!(all.items[0].status, StockStatus::Critical);
        assert_eq!(all.items[0].total_value, 0);
        assert_eq!(all.items[1].status, StockStatus::Critical); // 5 * 2 <= 20
        assert_eq!(all.items[2].status, StockStatus::Normal);
        assert_eq!(all.items[2].total_value, 5000);

        let filtered = repo.list(&InventoryQuery {
            category: Some(Category::Antibiotic),
            ..InventoryQuery::default()
        });
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.items[0].item.name(), "Amoxicillin 250mg");

        let searched = repo.list(&InventoryQuery {
            search: Some("cream".to_string()),
            ..InventoryQuery::default()
        });
        assert_eq!(searched.total, 1);

        let paged = repo.list(&InventoryQuery {
            limit: 2,
            page: 2,
            ..InventoryQuery::default()
        });
        assert_eq!(paged.total, 3);
        assert_eq!(paged.items.len(), 1);
    }

    #[test]
    fn sort_by_stock_puts_lowest_first() {
        let (repo, store, catalog) = setup();
        seed_item(&catalog, &store, "A", Category::Other, 100, 0, 50);
        seed_item(&catalog, &store, "B", Category::Other, 100, 0, 5);

        let page = repo.list(&InventoryQuery {
            sort: InventorySort::Stock,
            ..InventoryQuery::default()
        });
        assert_eq!(page.items[0].item.name(), "B");
    }

    #[test]
    fn unknown_item_stock_is_not_found() {
        let (repo, _, _) = setup();
        assert!(matches!(
            repo.current_stock(ItemId::new()).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }
}

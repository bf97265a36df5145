//! Versioned purchase-order records.
//!
//! Orders are keyed by their own identifiers (they are not replayed from the
//! movement log); updates carry an expected record version so concurrent
//! transitions surface as conflicts instead of silently overwriting.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rxstock_core::{
    AggregateRoot, DomainError, DomainResult, ExpectedVersion, OrderId,
};
use rxstock_procurement::{OrderStatus, PurchaseOrder};

pub trait OrderStore: Send + Sync {
    /// Insert a newly created order. Fails on duplicate id.
    fn insert(&self, order: PurchaseOrder) -> DomainResult<()>;

    fn get(&self, order_id: &OrderId) -> Option<PurchaseOrder>;

    /// Replace an order, checking the stored record is still at `expected`.
    fn update(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()>;

    fn list(&self, status: Option<OrderStatus>) -> Vec<PurchaseOrder>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert(&self, order: PurchaseOrder) -> DomainResult<()> {
        (**self).insert(order)
    }

    fn get(&self, order_id: &OrderId) -> Option<PurchaseOrder> {
        (**self).get(order_id)
    }

    fn update(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).update(order, expected)
    }

    fn list(&self, status: Option<OrderStatus>) -> Vec<PurchaseOrder> {
        (**self).list(status)
    }
}

/// In-memory order store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, PurchaseOrder>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> DomainError {
        DomainError::conflict("order store unavailable")
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: PurchaseOrder) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| Self::lock_err())?;
        let order_id = order.id_typed();
        if map.contains_key(&order_id) {
            return Err(DomainError::conflict(format!(
                "order {order_id} already exists"
            )));
        }
        map.insert(order_id, order);
        Ok(())
    }

    fn get(&self, order_id: &OrderId) -> Option<PurchaseOrder> {
        self.inner.read().ok()?.get(order_id).cloned()
    }

    fn update(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| Self::lock_err())?;
        let order_id = order.id_typed();
        let stored = map
            .get(&order_id)
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")))?;
        expected.check(stored.version())?;
        map.insert(order_id, order);
        Ok(())
    }

    fn list(&self, status: Option<OrderStatus>) -> Vec<PurchaseOrder> {
        let map = match self.inner.read() {
            Ok(map) => map,
            Err(_) => return vec![],
        };
        let mut orders: Vec<PurchaseOrder> = map
            .values()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .cloned()
            .collect();
        orders.sort_by_key(PurchaseOrder::created_at);
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rxstock_core::{ItemId, SupplierId};
    use rxstock_procurement::OrderLineSpec;

    fn test_order() -> PurchaseOrder {
        PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![OrderLineSpec {
                item_id: ItemId::new(),
                ordered_qty: 5,
                unit_price: 100,
            }],
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn stale_update_is_a_conflict() {
        let store = InMemoryOrderStore::new();
        let order = test_order();
        let order_id = order.id_typed();
        store.insert(order).unwrap();

        // Two writers load the same version.
        let mut first = store.get(&order_id).unwrap();
        let mut second = store.get(&order_id).unwrap();
        let expected = first.version();

        first.cancel(Utc::now()).unwrap();
        store
            .update(first, ExpectedVersion::Exact(expected))
            .unwrap();

        second.cancel(Utc::now()).unwrap();
        let err = store
            .update(second, ExpectedVersion::Exact(expected))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn duplicate_insert_is_a_conflict() {
        let store = InMemoryOrderStore::new();
        let order = test_order();
        store.insert(order.clone()).unwrap();
        assert!(store.insert(order).unwrap_err().is_conflict());
    }
}

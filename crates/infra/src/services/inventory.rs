use chrono::Utc;

use rxstock_core::{ActorId, BatchId, DomainError, DomainResult, ItemId};
use rxstock_ledger::{ReasonCode, StockCommand, StockMovement};

use crate::movement_store::MovementStore;
use crate::repository::{InventoryPage, InventoryQuery};
use crate::stock_ledger::ReconcileOutcome;

use super::AppServices;

impl AppServices {
    /// Inventory listing with computed status and value per row.
    pub fn list_inventory(&self, query: &InventoryQuery) -> InventoryPage {
        self.repository.list(query)
    }

    /// Physical-count correction: align the recorded balance with
    /// `real_quantity`. A matching count is an idempotent no-op; a drifting
    /// one requires a reason and appends a single adjustment movement.
    pub fn adjust_stock(
        &self,
        item_id: ItemId,
        real_quantity: i64,
        reason: Option<ReasonCode>,
        actor: ActorId,
    ) -> DomainResult<ReconcileOutcome> {
        self.ledger
            .reconcile(item_id, real_quantity, reason, actor, Utc::now())
    }

    /// Dispense stock to a patient/ward.
    pub fn dispense_stock(
        &self,
        item_id: ItemId,
        quantity: i64,
        batch_id: Option<BatchId>,
        actor: ActorId,
    ) -> DomainResult<StockMovement> {
        let committed = self.ledger.execute(
            item_id,
            StockCommand::Dispense {
                quantity,
                batch_id,
                actor,
                occurred_at: Utc::now(),
            },
        )?;
        single_movement(committed)
    }

    /// Take returned goods back into stock.
    pub fn return_stock(
        &self,
        item_id: ItemId,
        quantity: i64,
        batch_id: Option<BatchId>,
        actor: ActorId,
    ) -> DomainResult<StockMovement> {
        let committed = self.ledger.execute(
            item_id,
            StockCommand::Return {
                quantity,
                batch_id,
                actor,
                occurred_at: Utc::now(),
            },
        )?;
        single_movement(committed)
    }

    /// Audit trail for one item, most recent first.
    pub fn item_movements(
        &self,
        item_id: ItemId,
        limit: Option<usize>,
    ) -> DomainResult<Vec<StockMovement>> {
        let mut movements = self.ledger.movements(item_id)?;
        movements.reverse();
        if let Some(limit) = limit {
            movements.truncate(limit);
        }
        Ok(movements)
    }

    /// Current recorded balance for one item.
    pub fn current_stock(&self, item_id: ItemId) -> DomainResult<i64> {
        self.repository.current_stock(item_id)
    }

    /// Ledger invariant check: the cached balance of every item equals the
    /// sum of its recorded deltas.
    pub fn verify_balances(&self) -> bool {
        self.catalog_items().into_iter().all(|item_id| {
            let cached = self
                .movements
                .level(&item_id)
                .map(|l| l.on_hand)
                .unwrap_or(0);
            cached == self.movements.replay_balance(&item_id)
        })
    }

    fn catalog_items(&self) -> Vec<ItemId> {
        use crate::catalog_store::ItemCatalog;
        self.catalog.list().into_iter().map(|i| i.id()).collect()
    }
}

fn single_movement(mut committed: Vec<StockMovement>) -> DomainResult<StockMovement> {
    committed
        .pop()
        .ok_or_else(|| DomainError::conflict("no movement was recorded"))
}

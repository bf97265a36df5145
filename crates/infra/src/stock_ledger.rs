//! Stock ledger executor.
//!
//! The only write path for balances. Each execution loads the item's
//! movement stream, rehydrates [`ItemStock`], lets it decide, then appends
//! with an exact expected version: "serialize writers per item" as
//! optimistic concurrency. A conflicting concurrent writer causes exactly
//! one automatic retry with freshly loaded state before the conflict is
//! surfaced.

use chrono::{DateTime, Utc};

use rxstock_core::{
    ActorId, Aggregate, AggregateRoot, DomainError, DomainResult, ExpectedVersion, ItemId,
};
use rxstock_ledger::{ItemStock, ReasonCode, StockCommand, StockMovement};

use crate::catalog_store::ItemCatalog;
use crate::movement_store::{AppendBatch, MovementStore, StoreError};

/// Result of a physical-count reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The count differed; one adjustment movement was appended.
    Adjusted(StockMovement),
    /// The count matched the recorded balance; nothing was appended.
    NoOp { on_hand: i64 },
}

/// Executor over a movement store and the item catalog.
#[derive(Debug)]
pub struct StockLedger<S, C> {
    store: S,
    catalog: C,
}

impl<S, C> StockLedger<S, C>
where
    S: MovementStore,
    C: ItemCatalog,
{
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute one stock command against one item.
    pub fn execute(&self, item_id: ItemId, command: StockCommand) -> DomainResult<Vec<StockMovement>> {
        self.with_retry(|| self.try_execute(item_id, &command))
    }

    /// Execute commands across several items as one atomic unit: either
    /// every decided movement commits or none does. Used by receiving so a
    /// multi-line delivery posts all-or-nothing.
    pub fn execute_multi(
        &self,
        commands: Vec<(ItemId, StockCommand)>,
    ) -> DomainResult<Vec<StockMovement>> {
        self.with_retry(|| self.try_execute_multi(&commands))
    }

    /// Physical inventory reconciliation; the audit point for shrinkage.
    ///
    /// Computes `delta = counted - recorded`. A matching count is an
    /// idempotent no-op; a differing count requires a reason code and
    /// appends a single adjustment movement. The delta is recomputed from
    /// fresh state on the conflict retry, so a racing writer cannot make
    /// the correction overshoot.
    pub fn reconcile(
        &self,
        item_id: ItemId,
        counted_qty: i64,
        reason: Option<ReasonCode>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ReconcileOutcome> {
        if counted_qty < 0 {
            return Err(DomainError::validation(format!(
                "counted quantity cannot be negative (got {counted_qty})"
            )));
        }

        self.with_retry(|| {
            let stock = self.rehydrate(item_id)?;
            let delta = counted_qty - stock.on_hand();
            if delta == 0 {
                return Ok(ReconcileOutcome::NoOp {
                    on_hand: stock.on_hand(),
                });
            }
            let Some(reason) = reason else {
                return Err(DomainError::validation(
                    "a reason code is required when the counted quantity differs from the recorded balance",
                ));
            };

            let command = StockCommand::Adjust {
                quantity_delta: delta,
                reason,
                batch_id: None,
                actor,
                occurred_at,
            };
            let decided = stock.handle(&command)?;
            let mut committed = self
                .store
                .append(AppendBatch {
                    item_id,
                    expected: ExpectedVersion::Exact(stock.version()),
                    records: decided,
                })
                .map_err(map_store_error)?;

            let movement = committed.pop().ok_or_else(|| {
                DomainError::conflict("reconciliation appended no movement")
            })?;
            tracing::info!(
                item = %item_id,
                delta,
                reason = %reason,
                "physical count reconciled"
            );
            Ok(ReconcileOutcome::Adjusted(movement))
        })
    }

    /// Current recorded balance; zero for an item with no movements yet.
    pub fn current_stock(&self, item_id: ItemId) -> DomainResult<i64> {
        self.ensure_item(item_id)?;
        Ok(self.store.level(&item_id).map(|l| l.on_hand).unwrap_or(0))
    }

    /// Full movement history for one item, oldest first.
    pub fn movements(&self, item_id: ItemId) -> DomainResult<Vec<StockMovement>> {
        self.ensure_item(item_id)?;
        Ok(self.store.load_item(&item_id))
    }

    fn try_execute(
        &self,
        item_id: ItemId,
        command: &StockCommand,
    ) -> DomainResult<Vec<StockMovement>> {
        self.ensure_item(item_id)?;

        let stock = self.rehydrate(item_id)?;
        let decided = stock.handle(command)?;
        let committed = self
            .store
            .append(AppendBatch {
                item_id,
                expected: ExpectedVersion::Exact(stock.version()),
                records: decided,
            })
            .map_err(map_store_error)?;

        tracing::debug!(
            item = %item_id,
            movements = committed.len(),
            "ledger append committed"
        );
        Ok(committed)
    }

    fn try_execute_multi(
        &self,
        commands: &[(ItemId, StockCommand)],
    ) -> DomainResult<Vec<StockMovement>> {
        if commands.is_empty() {
            return Ok(vec![]);
        }

        // Group per item, preserving first-seen order; each item's commands
        // are decided against an in-memory copy so later commands in the
        // same call observe earlier ones.
        let mut item_order: Vec<ItemId> = Vec::new();
        for (item_id, _) in commands {
            if !item_order.contains(item_id) {
                item_order.push(*item_id);
            }
        }

        let mut batches = Vec::with_capacity(item_order.len());
        for item_id in item_order {
            self.ensure_item(item_id)?;
            let mut stock = self.rehydrate(item_id)?;
            let expected = ExpectedVersion::Exact(stock.version());

            let mut records = Vec::new();
            for (cmd_item, command) in commands {
                if *cmd_item != item_id {
                    continue;
                }
                for record in stock.handle(command)? {
                    stock.apply(&record);
                    records.push(record);
                }
            }
            batches.push(AppendBatch {
                item_id,
                expected,
                records,
            });
        }

        let committed = self.store.append_multi(batches).map_err(map_store_error)?;
        tracing::debug!(movements = committed.len(), "atomic multi-item append committed");
        Ok(committed)
    }

    fn rehydrate(&self, item_id: ItemId) -> DomainResult<ItemStock> {
        let history = self.store.load_item(&item_id);
        let mut stock = ItemStock::empty(item_id);
        let mut last_sequence = 0u64;
        for movement in &history {
            if movement.sequence <= last_sequence {
                return Err(DomainError::conflict(format!(
                    "non-monotonic sequence in stream for item {item_id}"
                )));
            }
            last_sequence = movement.sequence;
            stock.apply(&movement.record);
        }
        Ok(stock)
    }

    fn ensure_item(&self, item_id: ItemId) -> DomainResult<()> {
        if self.catalog.get(&item_id).is_none() {
            return Err(DomainError::not_found(format!("item {item_id}")));
        }
        Ok(())
    }

    fn with_retry<T>(&self, attempt: impl Fn() -> DomainResult<T>) -> DomainResult<T> {
        match attempt() {
            Err(err) if err.is_conflict() => {
                tracing::warn!(error = %err, "conflict on ledger write, retrying once with fresh state");
                attempt()
            }
            result => result,
        }
    }
}

fn map_store_error(err: StoreError) -> DomainError {
    match err {
        StoreError::Concurrency(msg) => DomainError::conflict(msg),
        StoreError::InvalidAppend(msg) => DomainError::validation(msg),
        StoreError::Internal(msg) => {
            // Full context stays in the log; callers get a generic failure.
            tracing::error!(error = %msg, "movement store failure");
            DomainError::conflict("persistence failure")
        }
    }
}

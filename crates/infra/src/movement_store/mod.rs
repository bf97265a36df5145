//! Append-only movement streams with a cached balance per item.
//!
//! The store is the only place a balance changes, and every
//! append-plus-balance-update happens under one write guard so readers can
//! never observe a half-applied movement. Sequence numbers are per-item,
//! monotonically increasing, and double as the stream version for the
//! optimistic concurrency check.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use rxstock_core::{BatchId, ExpectedVersion, ItemId};
use rxstock_ledger::{MovementRecord, StockMovement};

mod in_memory;

pub use in_memory::InMemoryMovementStore;

/// A batch of decided movements for one item, appended atomically against
/// an expected stream version.
#[derive(Debug, Clone)]
pub struct AppendBatch {
    pub item_id: ItemId,
    pub expected: ExpectedVersion,
    pub records: Vec<MovementRecord>,
}

/// Cached balance for one item, maintained in the same critical section as
/// the append. Disposable: rebuildable by replaying the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLevel {
    pub on_hand: i64,
    pub by_batch: HashMap<BatchId, i64>,
    /// Sequence number of the last movement (stream version).
    pub version: u64,
}

/// Movement store operation error (infrastructure taxonomy; mapped into the
/// domain taxonomy at the executor boundary).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed (stale stream version).
    #[error("concurrency check failed: {0}")]
    Concurrency(String),

    /// Malformed append (records not matching the batch's item, duplicate
    /// item streams in one multi-append).
    #[error("invalid append: {0}")]
    InvalidAppend(String),

    /// Unexpected storage failure (poisoned lock). Logged with context and
    /// surfaced to callers without storage detail.
    #[error("storage failure: {0}")]
    Internal(String),
}

/// Append-only, per-item movement streams.
///
/// Implementations must:
/// - check every batch's expected version before committing anything
///   (multi-item appends are all-or-nothing);
/// - assign per-item sequence numbers monotonically, without gaps;
/// - update the cached balance in the same atomic unit as the append.
pub trait MovementStore: Send + Sync {
    /// Append one item's batch. Empty batches are a no-op.
    fn append(&self, batch: AppendBatch) -> Result<Vec<StockMovement>, StoreError> {
        self.append_multi(vec![batch])
    }

    /// Append batches for several items atomically: either every batch
    /// commits or none does.
    fn append_multi(&self, batches: Vec<AppendBatch>) -> Result<Vec<StockMovement>, StoreError>;

    /// Full stream for one item, in sequence order.
    fn load_item(&self, item_id: &ItemId) -> Vec<StockMovement>;

    /// Every movement in the ledger, ordered by item then sequence.
    fn load_all(&self) -> Vec<StockMovement>;

    /// Cached balance for one item; `None` when no movement was ever
    /// recorded for it.
    fn level(&self, item_id: &ItemId) -> Option<StockLevel>;

    /// Recompute the balance by replaying the stream from empty.
    ///
    /// The ledger invariant is that this always equals the cached
    /// `level().on_hand`; tests exercise exactly that.
    fn replay_balance(&self, item_id: &ItemId) -> i64 {
        self.load_item(item_id)
            .iter()
            .map(|m| m.record.quantity_delta)
            .sum()
    }
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn append_multi(&self, batches: Vec<AppendBatch>) -> Result<Vec<StockMovement>, StoreError> {
        (**self).append_multi(batches)
    }

    fn load_item(&self, item_id: &ItemId) -> Vec<StockMovement> {
        (**self).load_item(item_id)
    }

    fn load_all(&self) -> Vec<StockMovement> {
        (**self).load_all()
    }

    fn level(&self, item_id: &ItemId) -> Option<StockLevel> {
        (**self).level(item_id)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rxstock_core::{ActorId, BatchId, ItemId, MovementId, OrderId};

/// Kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock handed out to a patient/ward; negative delta.
    Dispense,
    /// Goods received against a purchase order; positive delta.
    Receipt,
    /// Physical-count correction; the only path that moves a balance without
    /// a dispense/receipt trail, so a reason code is mandatory.
    Adjustment,
    /// Goods returned into stock; positive delta.
    Return,
}

/// Why an adjustment moved the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Loss,
    Damage,
    ExpiryDestruction,
    MiscountCorrection,
}

impl core::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ReasonCode::Loss => "loss",
            ReasonCode::Damage => "damage",
            ReasonCode::ExpiryDestruction => "expiry_destruction",
            ReasonCode::MiscountCorrection => "miscount_correction",
        };
        f.write_str(s)
    }
}

/// The recorded fact: one signed quantity change against an item/batch.
///
/// Immutable once decided; never updated or deleted. The store wraps it into
/// a [`StockMovement`] when it assigns the per-item sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub item_id: ItemId,
    pub batch_id: Option<BatchId>,
    pub kind: MovementKind,
    /// Signed change to quantity on hand; never zero.
    pub quantity_delta: i64,
    /// Acquisition cost per unit in minor units, when known (receipts).
    pub unit_cost: Option<u64>,
    pub actor: ActorId,
    pub reason: Option<ReasonCode>,
    pub related_order_id: Option<OrderId>,
    pub occurred_at: DateTime<Utc>,
}

impl MovementRecord {
    /// Unsigned size of the movement (consumption magnitude for forecasting).
    pub fn magnitude(&self) -> i64 {
        self.quantity_delta.abs()
    }
}

/// A movement persisted to the ledger: the record plus its identity and its
/// position in the item's stream.
///
/// `sequence` is monotonically increasing per item, assigned at append time,
/// and doubles as the stream version for optimistic concurrency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub sequence: u64,
    pub record: MovementRecord,
}

impl StockMovement {
    pub fn item_id(&self) -> ItemId {
        self.record.item_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.record.occurred_at
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rxstock_core::{
    ActorId, Aggregate, AggregateRoot, BatchId, DomainError, ItemId, OrderId,
};

use crate::movement::{MovementKind, MovementRecord, ReasonCode};

/// Per-item stock state, rebuilt by replaying the item's movement stream.
///
/// `handle` decides movements against current state without mutating;
/// `apply` evolves state from one recorded movement. Replaying every
/// movement from `empty` therefore reproduces the cached balance exactly,
/// which is the ledger's core invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStock {
    item_id: ItemId,
    on_hand: i64,
    by_batch: HashMap<BatchId, i64>,
    version: u64,
}

impl ItemStock {
    /// Empty state for rehydration.
    pub fn empty(item_id: ItemId) -> Self {
        Self {
            item_id,
            on_hand: 0,
            by_batch: HashMap::new(),
            version: 0,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }

    /// Quantity on hand for one lot; zero when the lot is unknown.
    pub fn batch_on_hand(&self, batch_id: &BatchId) -> i64 {
        self.by_batch.get(batch_id).copied().unwrap_or(0)
    }

    pub fn batches(&self) -> &HashMap<BatchId, i64> {
        &self.by_batch
    }
}

impl AggregateRoot for ItemStock {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.item_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: a requested stock change on one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    /// Hand stock out; `quantity` must be positive and available.
    Dispense {
        quantity: i64,
        batch_id: Option<BatchId>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    },
    /// Take delivered goods into stock.
    Receive {
        quantity: i64,
        batch_id: Option<BatchId>,
        unit_cost: Option<u64>,
        related_order_id: Option<OrderId>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    },
    /// Physical-count correction; signed delta, reason mandatory.
    Adjust {
        quantity_delta: i64,
        reason: ReasonCode,
        batch_id: Option<BatchId>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    },
    /// Goods returned into stock.
    Return {
        quantity: i64,
        batch_id: Option<BatchId>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    },
}

impl Aggregate for ItemStock {
    type Command = StockCommand;
    type Event = MovementRecord;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        self.on_hand += event.quantity_delta;
        if let Some(batch_id) = event.batch_id {
            *self.by_batch.entry(batch_id).or_insert(0) += event.quantity_delta;
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockCommand::Dispense {
                quantity,
                batch_id,
                actor,
                occurred_at,
            } => self.handle_outgoing(
                MovementKind::Dispense,
                *quantity,
                *batch_id,
                *actor,
                *occurred_at,
            ),
            StockCommand::Receive {
                quantity,
                batch_id,
                unit_cost,
                related_order_id,
                actor,
                occurred_at,
            } => {
                require_positive(*quantity, "receive quantity")?;
                Ok(vec![MovementRecord {
                    item_id: self.item_id,
                    batch_id: *batch_id,
                    kind: MovementKind::Receipt,
                    quantity_delta: *quantity,
                    unit_cost: *unit_cost,
                    actor: *actor,
                    reason: None,
                    related_order_id: *related_order_id,
                    occurred_at: *occurred_at,
                }])
            }
            StockCommand::Adjust {
                quantity_delta,
                reason,
                batch_id,
                actor,
                occurred_at,
            } => self.handle_adjust(*quantity_delta, *reason, *batch_id, *actor, *occurred_at),
            StockCommand::Return {
                quantity,
                batch_id,
                actor,
                occurred_at,
            } => {
                require_positive(*quantity, "return quantity")?;
                Ok(vec![MovementRecord {
                    item_id: self.item_id,
                    batch_id: *batch_id,
                    kind: MovementKind::Return,
                    quantity_delta: *quantity,
                    unit_cost: None,
                    actor: *actor,
                    reason: None,
                    related_order_id: None,
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

impl ItemStock {
    fn handle_outgoing(
        &self,
        kind: MovementKind,
        quantity: i64,
        batch_id: Option<BatchId>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<MovementRecord>, DomainError> {
        require_positive(quantity, "dispense quantity")?;

        if quantity > self.on_hand {
            return Err(DomainError::state(format!(
                "insufficient stock for item {}: requested {quantity}, on hand {}",
                self.item_id, self.on_hand
            )));
        }
        if let Some(batch_id) = batch_id {
            let lot_on_hand = self.batch_on_hand(&batch_id);
            if quantity > lot_on_hand {
                return Err(DomainError::state(format!(
                    "insufficient stock in lot {batch_id}: requested {quantity}, on hand {lot_on_hand}"
                )));
            }
        }

        Ok(vec![MovementRecord {
            item_id: self.item_id,
            batch_id,
            kind,
            quantity_delta: -quantity,
            unit_cost: None,
            actor,
            reason: None,
            related_order_id: None,
            occurred_at,
        }])
    }

    fn handle_adjust(
        &self,
        quantity_delta: i64,
        reason: ReasonCode,
        batch_id: Option<BatchId>,
        actor: ActorId,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<MovementRecord>, DomainError> {
        // A zero-delta adjustment is a no-op and must not pollute the ledger.
        if quantity_delta == 0 {
            return Err(DomainError::validation(
                "adjustment delta cannot be zero",
            ));
        }
        if self.on_hand + quantity_delta < 0 {
            return Err(DomainError::state(format!(
                "adjustment would take item {} below zero (on hand {}, delta {quantity_delta})",
                self.item_id, self.on_hand
            )));
        }
        if let Some(batch_id) = batch_id {
            if self.batch_on_hand(&batch_id) + quantity_delta < 0 {
                return Err(DomainError::state(format!(
                    "adjustment would take lot {batch_id} below zero"
                )));
            }
        }

        Ok(vec![MovementRecord {
            item_id: self.item_id,
            batch_id,
            kind: MovementKind::Adjustment,
            quantity_delta,
            unit_cost: None,
            actor,
            reason: Some(reason),
            related_order_id: None,
            occurred_at,
        }])
    }
}

fn require_positive(quantity: i64, what: &str) -> Result<(), DomainError> {
    if quantity <= 0 {
        return Err(DomainError::validation(format!(
            "{what} must be positive (got {quantity})"
        )));
    }
    Ok(())
}

use std::collections::HashMap;
use std::sync::RwLock;

use rxstock_core::{ItemId, MovementId};
use rxstock_ledger::StockMovement;

use super::{AppendBatch, MovementStore, StockLevel, StoreError};

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<ItemId, Vec<StockMovement>>,
    levels: HashMap<ItemId, StockLevel>,
}

/// In-memory append-only movement store.
///
/// Intended for tests/dev; a persistent backend would implement the same
/// trait. One `RwLock` write guard spans validation, sequence assignment and
/// the balance-cache update, so an append is observed all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<Inner>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream_version(stream: &[StockMovement]) -> u64 {
        stream.last().map(|m| m.sequence).unwrap_or(0)
    }
}

impl MovementStore for InMemoryMovementStore {
    fn append_multi(&self, batches: Vec<AppendBatch>) -> Result<Vec<StockMovement>, StoreError> {
        let batches: Vec<AppendBatch> =
            batches.into_iter().filter(|b| !b.records.is_empty()).collect();
        if batches.is_empty() {
            return Ok(vec![]);
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Internal("movement store lock poisoned".to_string()))?;

        // Validate every batch before committing any: the whole multi-item
        // append is one atomic unit.
        let mut seen: Vec<ItemId> = Vec::with_capacity(batches.len());
        for batch in &batches {
            if seen.contains(&batch.item_id) {
                return Err(StoreError::InvalidAppend(format!(
                    "duplicate stream for item {} in one append",
                    batch.item_id
                )));
            }
            seen.push(batch.item_id);

            for (idx, record) in batch.records.iter().enumerate() {
                if record.item_id != batch.item_id {
                    return Err(StoreError::InvalidAppend(format!(
                        "record {idx} targets item {}, batch targets {}",
                        record.item_id, batch.item_id
                    )));
                }
                if record.quantity_delta == 0 {
                    return Err(StoreError::InvalidAppend(format!(
                        "record {idx} for item {} has zero delta",
                        batch.item_id
                    )));
                }
            }

            let current = Self::stream_version(
                inner
                    .streams
                    .get(&batch.item_id)
                    .map_or(&[][..], Vec::as_slice),
            );
            if !batch.expected.matches(current) {
                return Err(StoreError::Concurrency(format!(
                    "item {}: expected {:?}, found {current}",
                    batch.item_id, batch.expected
                )));
            }
        }

        // Commit: assign sequences and update the cached balances.
        let mut committed = Vec::new();
        for batch in batches {
            let stream = inner.streams.entry(batch.item_id).or_default();
            let mut next = Self::stream_version(stream) + 1;
            let mut appended = Vec::with_capacity(batch.records.len());
            for record in batch.records {
                let stored = StockMovement {
                    id: MovementId::new(),
                    sequence: next,
                    record,
                };
                next += 1;
                stream.push(stored.clone());
                appended.push(stored);
            }

            let level = inner.levels.entry(batch.item_id).or_default();
            for movement in &appended {
                level.on_hand += movement.record.quantity_delta;
                if let Some(batch_id) = movement.record.batch_id {
                    *level.by_batch.entry(batch_id).or_insert(0) +=
                        movement.record.quantity_delta;
                }
                level.version = movement.sequence;
            }

            committed.extend(appended);
        }

        Ok(committed)
    }

    fn load_item(&self, item_id: &ItemId) -> Vec<StockMovement> {
        match self.inner.read() {
            Ok(inner) => inner.streams.get(item_id).cloned().unwrap_or_default(),
            Err(_) => vec![],
        }
    }

    fn load_all(&self) -> Vec<StockMovement> {
        let inner = match self.inner.read() {
            Ok(inner) => inner,
            Err(_) => return vec![],
        };
        let mut items: Vec<&ItemId> = inner.streams.keys().collect();
        items.sort();
        items
            .into_iter()
            .flat_map(|item_id| inner.streams[item_id].iter().cloned())
            .collect()
    }

    fn level(&self, item_id: &ItemId) -> Option<StockLevel> {
        self.inner.read().ok()?.levels.get(item_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rxstock_core::{ActorId, ExpectedVersion};
    use rxstock_ledger::{MovementKind, MovementRecord};

    fn record(item_id: ItemId, delta: i64) -> MovementRecord {
        MovementRecord {
            item_id,
            batch_id: None,
            kind: if delta >= 0 {
                MovementKind::Receipt
            } else {
                MovementKind::Dispense
            },
            quantity_delta: delta,
            unit_cost: None,
            actor: ActorId::new(),
            reason: None,
            related_order_id: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn append_assigns_monotonic_sequences_and_updates_level() {
        let store = InMemoryMovementStore::new();
        let item = ItemId::new();

        let first = store
            .append(AppendBatch {
                item_id: item,
                expected: ExpectedVersion::Exact(0),
                records: vec![record(item, 10), record(item, 5)],
            })
            .unwrap();
        assert_eq!(
            first.iter().map(|m| m.sequence).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let level = store.level(&item).unwrap();
        assert_eq!(level.on_hand, 15);
        assert_eq!(level.version, 2);
        assert_eq!(store.replay_balance(&item), 15);
    }

    #[test]
    fn stale_version_is_a_concurrency_error() {
        let store = InMemoryMovementStore::new();
        let item = ItemId::new();
        store
            .append(AppendBatch {
                item_id: item,
                expected: ExpectedVersion::Exact(0),
                records: vec![record(item, 10)],
            })
            .unwrap();

        let err = store
            .append(AppendBatch {
                item_id: item,
                expected: ExpectedVersion::Exact(0),
                records: vec![record(item, -3)],
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        // Nothing committed; balance untouched.
        assert_eq!(store.level(&item).unwrap().on_hand, 10);
        assert_eq!(store.load_item(&item).len(), 1);
    }

    #[test]
    fn multi_item_append_is_all_or_nothing() {
        let store = InMemoryMovementStore::new();
        let item_a = ItemId::new();
        let item_b = ItemId::new();

        // item_b's expectation is stale, so item_a must not commit either.
        let err = store
            .append_multi(vec![
                AppendBatch {
                    item_id: item_a,
                    expected: ExpectedVersion::Exact(0),
                    records: vec![record(item_a, 10)],
                },
                AppendBatch {
                    item_id: item_b,
                    expected: ExpectedVersion::Exact(7),
                    records: vec![record(item_b, 3)],
                },
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
        assert!(store.level(&item_a).is_none());
        assert!(store.load_item(&item_a).is_empty());
    }

    #[test]
    fn mismatched_item_in_batch_is_rejected() {
        let store = InMemoryMovementStore::new();
        let item_a = ItemId::new();
        let item_b = ItemId::new();

        let err = store
            .append(AppendBatch {
                item_id: item_a,
                expected: ExpectedVersion::Exact(0),
                records: vec![record(item_b, 10)],
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAppend(_)));
    }

    #[test]
    fn empty_batches_are_a_no_op() {
        let store = InMemoryMovementStore::new();
        let item = ItemId::new();
        let committed = store
            .append(AppendBatch {
                item_id: item,
                expected: ExpectedVersion::Exact(0),
                records: vec![],
            })
            .unwrap();
        assert!(committed.is_empty());
        assert!(store.level(&item).is_none());
    }
}

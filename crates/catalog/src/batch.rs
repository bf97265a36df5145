use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rxstock_core::{BatchId, DomainError, DomainResult, ItemId};

/// Batch/lot metadata for an item.
///
/// One batch is the trackable sub-quantity of an item sharing a single
/// expiry date. Per-lot quantity on hand is not stored here: it is derived
/// from the movements carrying this batch id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    item_id: ItemId,
    lot: String,
    expiry: NaiveDate,
}

impl Batch {
    pub fn new(
        id: BatchId,
        item_id: ItemId,
        lot: impl Into<String>,
        expiry: NaiveDate,
    ) -> DomainResult<Self> {
        let lot = lot.into();
        if lot.trim().is_empty() {
            return Err(DomainError::validation("lot identifier cannot be empty"));
        }
        Ok(Self {
            id,
            item_id,
            lot,
            expiry,
        })
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn lot(&self) -> &str {
        &self.lot
    }

    pub fn expiry(&self) -> NaiveDate {
        self.expiry
    }

    /// Days until expiry relative to `today`; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry - today).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_blank_lot() {
        let err = Batch::new(BatchId::new(), ItemId::new(), "", date(2027, 1, 31)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn days_until_expiry_goes_negative_after_expiry() {
        let batch =
            Batch::new(BatchId::new(), ItemId::new(), "LOT-42", date(2026, 6, 1)).unwrap();
        assert_eq!(batch.days_until_expiry(date(2026, 5, 2)), 30);
        assert_eq!(batch.days_until_expiry(date(2026, 6, 11)), -10);
    }
}

use serde::{Deserialize, Serialize};

use rxstock_catalog::{Batch, Item};

/// One lot with its derived quantity on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStock {
    pub batch: Batch,
    pub on_hand: i64,
}

/// Consistent point-in-time view of one item's stock, produced by the
/// inventory repository and consumed read-only by analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub item: Item,
    pub on_hand: i64,
    pub batches: Vec<BatchStock>,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rxstock_core::{BatchId, ItemId};

use crate::snapshot::StockSnapshot;

/// Batches expiring within this many days are high priority.
pub const EXPIRY_HIGH_DAYS: i64 = 30;
/// Batches expiring within this many days are medium priority; anything
/// further out is excluded from the scan entirely, keeping the list bounded.
pub const EXPIRY_MEDIUM_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
}

/// Derived, ephemeral alert. Never stored; recomputed from item/batch state
/// at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub item_id: ItemId,
    pub item_name: String,
    pub batch_id: Option<BatchId>,
    pub lot: Option<String>,
    pub priority: AlertPriority,
    /// `None` for low-stock alerts; negative once expired.
    pub days_until_expiry: Option<i64>,
    pub action: String,
    pub message: String,
}

/// Scan snapshots for near-expiry batches and low-stock items.
///
/// Stateless and read-only. Output is sorted by priority, then by ascending
/// days remaining (alerts without an expiry date sort last within their
/// priority).
pub fn scan(snapshots: &[StockSnapshot], today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for snapshot in snapshots {
        for batch_stock in &snapshot.batches {
            if batch_stock.on_hand <= 0 {
                continue;
            }
            let days = batch_stock.batch.days_until_expiry(today);
            if days > EXPIRY_MEDIUM_DAYS {
                continue;
            }

            let (priority, action) = if days < 0 {
                (AlertPriority::High, "destroy")
            } else if days <= EXPIRY_HIGH_DAYS {
                (AlertPriority::High, "prioritize dispensing")
            } else {
                (AlertPriority::Medium, "discount/transfer")
            };

            let message = if days < 0 {
                format!(
                    "lot {} of {} expired {} day(s) ago ({} on hand)",
                    batch_stock.batch.lot(),
                    snapshot.item.name(),
                    -days,
                    batch_stock.on_hand
                )
            } else {
                format!(
                    "lot {} of {} expires in {} day(s) ({} on hand)",
                    batch_stock.batch.lot(),
                    snapshot.item.name(),
                    days,
                    batch_stock.on_hand
                )
            };

            alerts.push(Alert {
                item_id: snapshot.item.id(),
                item_name: snapshot.item.name().to_string(),
                batch_id: Some(batch_stock.batch.id()),
                lot: Some(batch_stock.batch.lot().to_string()),
                priority,
                days_until_expiry: Some(days),
                action: action.to_string(),
                message,
            });
        }

        let threshold = snapshot.item.minimum_threshold();
        if snapshot.on_hand <= threshold {
            let priority = if snapshot.on_hand == 0 || snapshot.on_hand * 2 <= threshold {
                AlertPriority::High
            } else {
                AlertPriority::Medium
            };
            alerts.push(Alert {
                item_id: snapshot.item.id(),
                item_name: snapshot.item.name().to_string(),
                batch_id: None,
                lot: None,
                priority,
                days_until_expiry: None,
                action: "reorder".to_string(),
                message: format!(
                    "{} is at {} against a minimum threshold of {}",
                    snapshot.item.name(),
                    snapshot.on_hand,
                    threshold
                ),
            });
        }
    }

    alerts.sort_by(|a, b| {
        b.priority.cmp(&a.priority).then_with(|| {
            a.days_until_expiry
                .unwrap_or(i64::MAX)
                .cmp(&b.days_until_expiry.unwrap_or(i64::MAX))
        })
    });
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::BatchStock;
    use rxstock_catalog::{Batch, Category, Item, UnitOfMeasure};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_item(name: &str, threshold: i64) -> Item {
        Item::new(
            ItemId::new(),
            name,
            Category::Analgesic,
            100,
            threshold,
            UnitOfMeasure::Tablet,
        )
        .unwrap()
    }

    fn batch_stock(item: &Item, lot: &str, expiry: NaiveDate, on_hand: i64) -> BatchStock {
        BatchStock {
            batch: Batch::new(BatchId::new(), item.id(), lot, expiry).unwrap(),
            on_hand,
        }
    }

    #[test]
    fn expiry_tiers_and_bounded_output() {
        let today = date(2026, 8, 1);
        let item = test_item("Ibuprofen 400mg", 0);
        let snapshot = StockSnapshot {
            on_hand: 400,
            batches: vec![
                batch_stock(&item, "FAR", date(2027, 8, 1), 100), // beyond 90d: excluded
                batch_stock(&item, "SOON", date(2026, 8, 20), 100), // 19d: high
                batch_stock(&item, "MID", date(2026, 10, 15), 100), // 75d: medium
                batch_stock(&item, "GONE", date(2026, 7, 20), 100), // expired: high/destroy
            ],
            item,
        };

        let alerts = scan(&[snapshot], today);
        assert_eq!(alerts.len(), 3);

        // Sorted by priority, then ascending days remaining.
        assert_eq!(alerts[0].lot.as_deref(), Some("GONE"));
        assert_eq!(alerts[0].action, "destroy");
        assert_eq!(alerts[1].lot.as_deref(), Some("SOON"));
        assert_eq!(alerts[1].action, "prioritize dispensing");
        assert_eq!(alerts[1].priority, AlertPriority::High);
        assert_eq!(alerts[2].lot.as_deref(), Some("MID"));
        assert_eq!(alerts[2].action, "discount/transfer");
        assert_eq!(alerts[2].priority, AlertPriority::Medium);
    }

    #[test]
    fn empty_lots_do_not_alert() {
        let today = date(2026, 8, 1);
        let item = test_item("Cetirizine 10mg", 0);
        let snapshot = StockSnapshot {
            on_hand: 50,
            batches: vec![batch_stock(&item, "EMPTY", date(2026, 8, 5), 0)],
            item,
        };
        assert!(scan(&[snapshot], today).is_empty());
    }

    #[test]
    fn low_stock_flags_independently_of_expiry() {
        let today = date(2026, 8, 1);
        let low = StockSnapshot {
            item: test_item("Metformin 850mg", 30),
            on_hand: 25,
            batches: vec![],
        };
        let critical = StockSnapshot {
            item: test_item("Insulin pen", 10),
            on_hand: 0,
            batches: vec![],
        };
        let fine = StockSnapshot {
            item: test_item("Saline 0.9%", 10),
            on_hand: 80,
            batches: vec![],
        };

        let alerts = scan(&[low, critical, fine], today);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].item_name, "Insulin pen");
        assert_eq!(alerts[0].priority, AlertPriority::High);
        assert_eq!(alerts[0].action, "reorder");
        assert_eq!(alerts[1].item_name, "Metformin 850mg");
        assert_eq!(alerts[1].priority, AlertPriority::Medium);
    }

    #[test]
    fn stock_exactly_at_threshold_still_flags() {
        let today = date(2026, 8, 1);
        let snapshot = StockSnapshot {
            item: test_item("Omeprazole 20mg", 40),
            on_hand: 40,
            batches: vec![],
        };
        let alerts = scan(&[snapshot], today);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].priority, AlertPriority::Medium);
    }
}

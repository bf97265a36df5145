use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use rxstock_core::{
    AggregateRoot, DomainError, DomainResult, ItemId, OrderId, OrderLineId, SupplierId,
};

/// Purchase order status lifecycle.
///
/// Closed variant; the only ways a status changes are [`OrderStatus::recompute`]
/// after a receipt and the explicit cancel transition. No call site assigns
/// it ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Ordered,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl OrderStatus {
    /// Derive the non-cancelled status from line state.
    pub fn recompute(lines: &[PurchaseOrderLine]) -> Self {
        if lines.iter().all(|l| l.is_complete()) {
            OrderStatus::Received
        } else if lines.iter().any(|l| l.received_qty > 0) {
            OrderStatus::PartiallyReceived
        } else {
            OrderStatus::Ordered
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Cancelled)
    }
}

/// One line of a purchase order.
///
/// Invariant: `0 <= received_qty <= ordered_qty`, maintained by
/// [`PurchaseOrder::apply_receipts`] being the only mutation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: OrderLineId,
    pub item_id: ItemId,
    pub ordered_qty: i64,
    pub received_qty: i64,
    /// Unit price in minor currency units.
    pub unit_price: u64,
}

impl PurchaseOrderLine {
    pub fn remaining(&self) -> i64 {
        self.ordered_qty - self.received_qty
    }

    pub fn is_complete(&self) -> bool {
        self.received_qty == self.ordered_qty
    }
}

/// Input for one line when creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineSpec {
    pub item_id: ItemId,
    pub ordered_qty: i64,
    pub unit_price: u64,
}

/// One received quantity against an order line, optionally carrying the
/// delivered lot so the batch registry can record its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReceipt {
    pub line_id: OrderLineId,
    pub quantity: i64,
    pub lot: Option<String>,
    pub expiry: Option<NaiveDate>,
}

/// Purchase order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: OrderId,
    supplier_id: SupplierId,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    lines: Vec<PurchaseOrderLine>,
    version: u64,
}

impl PurchaseOrder {
    /// Create an order directly in `ordered` state.
    pub fn create(
        id: OrderId,
        supplier_id: SupplierId,
        specs: Vec<OrderLineSpec>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if specs.is_empty() {
            return Err(DomainError::validation(
                "purchase order must have at least one line",
            ));
        }
        for (idx, spec) in specs.iter().enumerate() {
            if spec.ordered_qty <= 0 {
                return Err(DomainError::validation(format!(
                    "line {idx}: ordered quantity must be positive (got {})",
                    spec.ordered_qty
                )));
            }
        }

        let lines = specs
            .into_iter()
            .map(|spec| PurchaseOrderLine {
                id: OrderLineId::new(),
                item_id: spec.item_id,
                ordered_qty: spec.ordered_qty,
                received_qty: 0,
                unit_price: spec.unit_price,
            })
            .collect();

        Ok(Self {
            id,
            supplier_id,
            status: OrderStatus::Ordered,
            created_at,
            cancelled_at: None,
            lines,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn lines(&self) -> &[PurchaseOrderLine] {
        &self.lines
    }

    pub fn line(&self, line_id: OrderLineId) -> Option<&PurchaseOrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Order total: `Σ ordered_qty × unit_price`, in minor units.
    pub fn total(&self) -> u64 {
        self.lines
            .iter()
            .map(|l| l.ordered_qty as u64 * l.unit_price)
            .sum()
    }

    /// Freeze the order. Quantities already received stay received; the
    /// ledger keeps every movement that was posted before cancellation.
    pub fn cancel(&mut self, cancelled_at: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::state(format!(
                "order {} is {:?} and cannot be cancelled",
                self.id, self.status
            )));
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(cancelled_at);
        self.version += 1;
        Ok(())
    }

    /// Apply a batch of receipts, all-or-nothing.
    ///
    /// Every receipt is validated against current line state before any line
    /// is touched: an unknown line, a non-positive quantity, or a quantity
    /// exceeding a line's remaining amount rejects the whole call and leaves
    /// the order unchanged. An empty batch is a no-op.
    pub fn apply_receipts(&mut self, receipts: &[LineReceipt]) -> DomainResult<()> {
        if receipts.is_empty() {
            return Ok(());
        }
        if self.status.is_terminal() {
            return Err(DomainError::state(format!(
                "cannot receive against order {} in status {:?}",
                self.id, self.status
            )));
        }

        // Accumulate per line so duplicate line ids in one call are judged
        // against the combined quantity.
        let mut per_line: HashMap<OrderLineId, i64> = HashMap::new();
        for receipt in receipts {
            if receipt.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "receipt quantity for line {} must be positive (got {})",
                    receipt.line_id, receipt.quantity
                )));
            }
            *per_line.entry(receipt.line_id).or_insert(0) += receipt.quantity;
        }

        for (line_id, quantity) in &per_line {
            let line = self
                .line(*line_id)
                .ok_or_else(|| DomainError::not_found(format!("order line {line_id}")))?;
            if *quantity > line.remaining() {
                return Err(DomainError::state(format!(
                    "over-receipt on line {line_id}: received {quantity}, remaining {}",
                    line.remaining()
                )));
            }
        }

        for line in &mut self.lines {
            if let Some(quantity) = per_line.get(&line.id) {
                line.received_qty += quantity;
            }
        }
        self.status = OrderStatus::recompute(&self.lines);
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn spec(ordered_qty: i64, unit_price: u64) -> OrderLineSpec {
        OrderLineSpec {
            item_id: ItemId::new(),
            ordered_qty,
            unit_price,
        }
    }

    fn receipt(line_id: OrderLineId, quantity: i64) -> LineReceipt {
        LineReceipt {
            line_id,
            quantity,
            lot: None,
            expiry: None,
        }
    }

    #[test]
    fn create_lands_in_ordered_with_computed_total() {
        // Ten at $2 and five at $3 -> $35.
        let order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200), spec(5, 300)],
            test_time(),
        )
        .unwrap();

        assert_eq!(order.status(), OrderStatus::Ordered);
        assert_eq!(order.total(), 3500);
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn create_rejects_empty_lines_and_non_positive_quantities() {
        let err = PurchaseOrder::create(OrderId::new(), SupplierId::new(), vec![], test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(0, 100)],
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn partial_receipt_then_completion() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200), spec(5, 300)],
            test_time(),
        )
        .unwrap();
        let line_a = order.lines()[0].id;
        let line_b = order.lines()[1].id;

        order
            .apply_receipts(&[receipt(line_a, 10), receipt(line_b, 3)])
            .unwrap();
        assert_eq!(order.status(), OrderStatus::PartiallyReceived);
        assert_eq!(order.lines()[0].received_qty, 10);
        assert_eq!(order.lines()[1].received_qty, 3);

        order.apply_receipts(&[receipt(line_b, 2)]).unwrap();
        assert_eq!(order.status(), OrderStatus::Received);
        assert!(order.lines().iter().all(|l| l.is_complete()));
    }

    #[test]
    fn over_receipt_rejects_the_whole_call() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200), spec(5, 300)],
            test_time(),
        )
        .unwrap();
        let line_a = order.lines()[0].id;
        let line_b = order.lines()[1].id;

        let err = order
            .apply_receipts(&[receipt(line_a, 4), receipt(line_b, 6)])
            .unwrap_err();
        assert!(matches!(err, DomainError::State(_)));

        // Nothing from the batch was applied, including the valid line.
        assert_eq!(order.lines()[0].received_qty, 0);
        assert_eq!(order.lines()[1].received_qty, 0);
        assert_eq!(order.status(), OrderStatus::Ordered);
    }

    #[test]
    fn duplicate_line_ids_in_one_call_are_judged_combined() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200)],
            test_time(),
        )
        .unwrap();
        let line_a = order.lines()[0].id;

        let err = order
            .apply_receipts(&[receipt(line_a, 6), receipt(line_a, 6)])
            .unwrap_err();
        assert!(matches!(err, DomainError::State(_)));
        assert_eq!(order.lines()[0].received_qty, 0);
    }

    #[test]
    fn unknown_line_is_not_found() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200)],
            test_time(),
        )
        .unwrap();

        let err = order
            .apply_receipts(&[receipt(OrderLineId::new(), 1)])
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn empty_receipt_batch_is_a_no_op() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200)],
            test_time(),
        )
        .unwrap();
        let before = order.clone();
        order.apply_receipts(&[]).unwrap();
        assert_eq!(order, before);
    }

    #[test]
    fn cancel_freezes_but_keeps_received_quantities() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(10, 200)],
            test_time(),
        )
        .unwrap();
        let line_a = order.lines()[0].id;
        order.apply_receipts(&[receipt(line_a, 3)]).unwrap();

        order.cancel(test_time()).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.lines()[0].received_qty, 3);
        assert!(order.cancelled_at().is_some());

        // Terminal: no further receipts, no second cancel.
        let err = order.apply_receipts(&[receipt(line_a, 1)]).unwrap_err();
        assert!(matches!(err, DomainError::State(_)));
        let err = order.cancel(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::State(_)));
    }

    #[test]
    fn receiving_against_completed_order_is_a_state_error() {
        let mut order = PurchaseOrder::create(
            OrderId::new(),
            SupplierId::new(),
            vec![spec(2, 100)],
            test_time(),
        )
        .unwrap();
        let line = order.lines()[0].id;
        order.apply_receipts(&[receipt(line, 2)]).unwrap();
        assert_eq!(order.status(), OrderStatus::Received);

        let err = order.apply_receipts(&[receipt(line, 1)]).unwrap_err();
        assert!(matches!(err, DomainError::State(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: over any receipt sequence, received quantities are
        /// non-decreasing, never exceed the ordered quantity, and the status
        /// always matches the recomputation over line state.
        #[test]
        fn received_quantities_are_monotonic_and_bounded(
            ordered in 1i64..40,
            receipts in prop::collection::vec(1i64..20, 0..12)
        ) {
            let mut order = PurchaseOrder::create(
                OrderId::new(),
                SupplierId::new(),
                vec![spec(ordered, 150)],
                test_time(),
            ).unwrap();
            let line_id = order.lines()[0].id;

            let mut previous = 0i64;
            for quantity in receipts {
                let before = order.lines()[0].received_qty;
                let result = order.apply_receipts(&[receipt(line_id, quantity)]);
                let after = order.lines()[0].received_qty;

                match result {
                    Ok(()) => prop_assert_eq!(after, before + quantity),
                    // Rejected calls leave the line untouched.
                    Err(_) => prop_assert_eq!(after, before),
                }

                prop_assert!(after >= previous);
                prop_assert!(after <= ordered);
                previous = after;

                let expected = if order.status() == OrderStatus::Cancelled {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::recompute(order.lines())
                };
                prop_assert_eq!(order.status(), expected);
            }
        }
    }
}

use chrono::Utc;

use rxstock_catalog::Batch;
use rxstock_core::{
    ActorId, AggregateRoot, BatchId, DomainError, DomainResult, ExpectedVersion, OrderId,
    SupplierId,
};
use rxstock_ledger::StockCommand;
use rxstock_procurement::{LineReceipt, OrderLineSpec, OrderStatus, PurchaseOrder};

use crate::catalog_store::{BatchRegistry, ItemCatalog, SupplierDirectory};
use crate::order_store::OrderStore;

use super::AppServices;

impl AppServices {
    /// Create a purchase order in `ordered` state.
    pub fn create_order(
        &self,
        supplier_id: SupplierId,
        lines: Vec<OrderLineSpec>,
    ) -> DomainResult<PurchaseOrder> {
        if self.suppliers.get(&supplier_id).is_none() {
            return Err(DomainError::not_found(format!("supplier {supplier_id}")));
        }
        for spec in &lines {
            if self.catalog.get(&spec.item_id).is_none() {
                return Err(DomainError::not_found(format!("item {}", spec.item_id)));
            }
        }

        let order = PurchaseOrder::create(OrderId::new(), supplier_id, lines, Utc::now())?;
        self.orders.insert(order.clone())?;
        tracing::info!(
            order = %order.id_typed(),
            supplier = %supplier_id,
            lines = order.lines().len(),
            total = order.total(),
            "purchase order created"
        );
        Ok(order)
    }

    pub fn get_order(&self, order_id: OrderId) -> DomainResult<PurchaseOrder> {
        self.orders
            .get(&order_id)
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")))
    }

    pub fn list_orders(&self, status: Option<OrderStatus>) -> Vec<PurchaseOrder> {
        self.orders.list(status)
    }

    /// Receive delivered quantities against an order.
    ///
    /// The whole receipt batch is validated against current line state
    /// first; one invalid line rejects the call with nothing applied. The
    /// corresponding receipt movements then post in one atomic multi-item
    /// append, and only after they commit does the order transition; the
    /// order status never claims a receipt whose movement does not exist.
    pub fn receive_order(
        &self,
        order_id: OrderId,
        receipts: Vec<LineReceipt>,
        actor: ActorId,
    ) -> DomainResult<PurchaseOrder> {
        let order = self.get_order(order_id)?;
        if receipts.is_empty() {
            return Ok(order);
        }

        // Dry-run the receipt application so invalid batches fail before
        // any ledger write.
        {
            let mut probe = order.clone();
            probe.apply_receipts(&receipts)?;
        }
        for receipt in &receipts {
            if receipt.lot.is_some() != receipt.expiry.is_some() {
                return Err(DomainError::validation(format!(
                    "line {}: lot and expiry must be provided together",
                    receipt.line_id
                )));
            }
        }

        let occurred_at = Utc::now();
        let mut commands = Vec::with_capacity(receipts.len());
        for receipt in &receipts {
            let line = order
                .line(receipt.line_id)
                .ok_or_else(|| DomainError::not_found(format!("order line {}", receipt.line_id)))?;

            let batch_id = match (&receipt.lot, receipt.expiry) {
                (Some(lot), Some(expiry)) => {
                    let batch = self.batches.register(Batch::new(
                        BatchId::new(),
                        line.item_id,
                        lot.clone(),
                        expiry,
                    )?);
                    Some(batch.id())
                }
                _ => None,
            };

            commands.push((
                line.item_id,
                StockCommand::Receive {
                    quantity: receipt.quantity,
                    batch_id,
                    unit_cost: Some(line.unit_price),
                    related_order_id: Some(order_id),
                    actor,
                    occurred_at,
                },
            ));
        }

        // Ledger first; the order record follows the committed movements.
        self.ledger.execute_multi(commands)?;

        let updated =
            self.update_order_with_retry(order_id, |order| order.apply_receipts(&receipts))?;
        tracing::info!(
            order = %order_id,
            receipts = receipts.len(),
            status = ?updated.status(),
            "receipts posted"
        );
        Ok(updated)
    }

    /// Cancel a non-terminal order. Movements already posted against it
    /// stay in the ledger, as does the stock they delivered.
    pub fn cancel_order(&self, order_id: OrderId) -> DomainResult<PurchaseOrder> {
        let cancelled = self.update_order_with_retry(order_id, |order| order.cancel(Utc::now()))?;
        tracing::info!(order = %order_id, "purchase order cancelled");
        Ok(cancelled)
    }

    /// Load-mutate-update with one automatic retry on a version conflict.
    fn update_order_with_retry(
        &self,
        order_id: OrderId,
        mutate: impl Fn(&mut PurchaseOrder) -> DomainResult<()>,
    ) -> DomainResult<PurchaseOrder> {
        let attempt = || -> DomainResult<PurchaseOrder> {
            let mut order = self.get_order(order_id)?;
            let expected = order.version();
            mutate(&mut order)?;
            self.orders
                .update(order.clone(), ExpectedVersion::Exact(expected))?;
            Ok(order)
        };

        match attempt() {
            Err(err) if err.is_conflict() => {
                tracing::warn!(
                    order = %order_id,
                    error = %err,
                    "conflict on order update, retrying once with fresh state"
                );
                attempt()
            }
            result => result,
        }
    }
}

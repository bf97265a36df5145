//! JSON mapping helpers for the collaborator layer.
//!
//! The services return typed values; collaborators that need wire shapes
//! map them here. Keeping the mapping in one place means the transport
//! layer never reaches into domain types directly.

use serde_json::json;

use rxstock_analytics::Alert;
use rxstock_ledger::StockMovement;
use rxstock_procurement::PurchaseOrder;

use crate::repository::{InventoryPage, ItemSummary};
use crate::services::analytics::AnalyticsReport;
use crate::stock_ledger::ReconcileOutcome;

pub fn movement_to_json(movement: &StockMovement) -> serde_json::Value {
    json!({
        "id": movement.id.to_string(),
        "item_id": movement.record.item_id.to_string(),
        "batch_id": movement.record.batch_id.map(|b| b.to_string()),
        "sequence": movement.sequence,
        "kind": movement.record.kind,
        "quantity_delta": movement.record.quantity_delta,
        "unit_cost": movement.record.unit_cost,
        "actor": movement.record.actor.to_string(),
        "reason": movement.record.reason,
        "related_order_id": movement.record.related_order_id.map(|o| o.to_string()),
        "occurred_at": movement.record.occurred_at.to_rfc3339(),
    })
}

pub fn reconcile_outcome_to_json(outcome: &ReconcileOutcome) -> serde_json::Value {
    match outcome {
        ReconcileOutcome::Adjusted(movement) => json!({
            "adjusted": true,
            "movement": movement_to_json(movement),
        }),
        ReconcileOutcome::NoOp { on_hand } => json!({
            "adjusted": false,
            "on_hand": on_hand,
        }),
    }
}

pub fn item_summary_to_json(summary: &ItemSummary) -> serde_json::Value {
    json!({
        "id": summary.item.id().to_string(),
        "name": summary.item.name(),
        "category": summary.item.category(),
        "unit": summary.item.unit(),
        "unit_cost": summary.item.unit_cost(),
        "minimum_threshold": summary.item.minimum_threshold(),
        "current_stock": summary.on_hand,
        "status": summary.status,
        "total_value": summary.total_value,
    })
}

pub fn inventory_page_to_json(page: &InventoryPage) -> serde_json::Value {
    json!({
        "items": page.items.iter().map(item_summary_to_json).collect::<Vec<_>>(),
        "total": page.total,
    })
}

pub fn order_to_json(order: &PurchaseOrder) -> serde_json::Value {
    json!({
        "id": order.id_typed().to_string(),
        "supplier_id": order.supplier_id().to_string(),
        "status": order.status(),
        "created_at": order.created_at().to_rfc3339(),
        "cancelled_at": order.cancelled_at().map(|t| t.to_rfc3339()),
        "total": order.total(),
        "lines": order.lines().iter().map(|line| json!({
            "id": line.id.to_string(),
            "item_id": line.item_id.to_string(),
            "ordered_qty": line.ordered_qty,
            "received_qty": line.received_qty,
            "unit_price": line.unit_price,
        })).collect::<Vec<_>>(),
    })
}

pub fn alert_to_json(alert: &Alert) -> serde_json::Value {
    json!({
        "item_id": alert.item_id.to_string(),
        "item_name": alert.item_name,
        "batch_id": alert.batch_id.map(|b| b.to_string()),
        "lot": alert.lot,
        "priority": alert.priority,
        "days_until_expiry": alert.days_until_expiry,
        "action": alert.action,
        "message": alert.message,
    })
}

pub fn analytics_to_json(report: &AnalyticsReport) -> serde_json::Value {
    json!({
        "series": report.series.iter().map(|point| json!({
            "year": point.year,
            "month": point.month,
            "actual": point.actual,
            "projected": point.projected,
        })).collect::<Vec<_>>(),
        "distribution": report.distribution.iter().map(|share| json!({
            "category": share.category,
            "total_value": share.total_value,
            "share": share.share,
        })).collect::<Vec<_>>(),
        "recommendations": report.recommendations.iter().map(|rec| json!({
            "item_id": rec.item_id.to_string(),
            "projected_demand": rec.projected_demand,
            "average_daily_consumption": rec.average_daily_consumption,
            "days_until_stockout": rec.days_until_stockout,
            "safety_stock": rec.safety_stock,
            "recommended_order": rec.recommended_order,
            "urgency": rec.urgency,
            "confidence": rec.confidence,
            "explanation": rec.explanation,
        })).collect::<Vec<_>>(),
    })
}

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use rxstock_analytics::{
    Alert, ForecastPoint, ForecastReport, ReorderRecommendation, forecast_item,
    monthly_dispense_series, scan,
};
use rxstock_catalog::{Category, Item};
use rxstock_core::{DomainResult, ItemId};
use rxstock_ledger::StockMovement;

use crate::catalog_store::ItemCatalog;
use crate::movement_store::MovementStore;
use crate::order_store::OrderStore;

use super::AppServices;

/// Current stock value held per category, as a share of the whole scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub total_value: u64,
    pub share: f64,
}

/// Aggregate analytics: the scope's monthly dispense series, its stock
/// value distribution, and per-item reorder recommendations ranked by
/// urgency.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub series: Vec<ForecastPoint>,
    pub distribution: Vec<CategoryShare>,
    pub recommendations: Vec<ReorderRecommendation>,
}

impl AppServices {
    /// Low-stock and near-expiry alerts, ranked.
    pub fn get_alerts(&self) -> Vec<Alert> {
        self.alerts_at(Utc::now().date_naive())
    }

    /// Deterministic variant of [`Self::get_alerts`].
    pub fn alerts_at(&self, today: NaiveDate) -> Vec<Alert> {
        scan(&self.repository.snapshots(), today)
    }

    /// Consumption analytics over the trailing `period_months`, optionally
    /// restricted to one category.
    pub fn get_analytics(
        &self,
        period_months: u32,
        category: Option<Category>,
    ) -> AnalyticsReport {
        self.analytics_at(period_months, category, Utc::now().date_naive())
    }

    /// Deterministic variant of [`Self::get_analytics`].
    pub fn analytics_at(
        &self,
        period_months: u32,
        category: Option<Category>,
        today: NaiveDate,
    ) -> AnalyticsReport {
        let window = period_months.clamp(1, 24);
        let items: Vec<Item> = self
            .catalog
            .list()
            .into_iter()
            .filter(|item| category.is_none_or(|c| item.category() == c))
            .collect();

        let scope_movements: Vec<StockMovement> = items
            .iter()
            .flat_map(|item| self.movements.load_item(&item.id()))
            .collect();
        let series = monthly_dispense_series(&scope_movements, window, today);

        let mut by_category: HashMap<Category, u64> = HashMap::new();
        for item in &items {
            let on_hand = self
                .movements
                .level(&item.id())
                .map(|l| l.on_hand)
                .unwrap_or(0);
            *by_category.entry(item.category()).or_insert(0) +=
                on_hand.max(0) as u64 * item.unit_cost();
        }
        let grand_total: u64 = by_category.values().sum();
        let mut distribution: Vec<CategoryShare> = by_category
            .into_iter()
            .map(|(category, total_value)| CategoryShare {
                category,
                total_value,
                share: if grand_total == 0 {
                    0.0
                } else {
                    total_value as f64 / grand_total as f64
                },
            })
            .collect();
        distribution.sort_by(|a, b| b.total_value.cmp(&a.total_value));

        let config = self.forecast_config.clone().with_window_months(window);
        let mut recommendations: Vec<ReorderRecommendation> = items
            .iter()
            .map(|item| {
                let history = self.movements.load_item(&item.id());
                let on_hand = self
                    .movements
                    .level(&item.id())
                    .map(|l| l.on_hand)
                    .unwrap_or(0);
                forecast_item(
                    item,
                    &history,
                    on_hand,
                    self.lead_time_for(item.id()),
                    today,
                    &config,
                )
                .recommendation
            })
            .filter(|rec| rec.recommended_order > 0)
            .collect();
        recommendations.sort_by(|a, b| {
            b.urgency.cmp(&a.urgency).then_with(|| {
                a.days_until_stockout
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.days_until_stockout.unwrap_or(f64::INFINITY))
            })
        });

        AnalyticsReport {
            series,
            distribution,
            recommendations,
        }
    }

    /// Demand forecast and reorder advice for a single item.
    pub fn item_forecast(&self, item_id: ItemId, period_months: u32) -> DomainResult<ForecastReport> {
        self.item_forecast_at(item_id, period_months, Utc::now().date_naive())
    }

    /// Deterministic variant of [`Self::item_forecast`].
    pub fn item_forecast_at(
        &self,
        item_id: ItemId,
        period_months: u32,
        today: NaiveDate,
    ) -> DomainResult<ForecastReport> {
        let snapshot = self.repository.snapshot(item_id)?;
        let history = self.movements.load_item(&item_id);
        let config = self
            .forecast_config
            .clone()
            .with_window_months(period_months.clamp(1, 24));
        Ok(forecast_item(
            &snapshot.item,
            &history,
            snapshot.on_hand,
            self.lead_time_for(item_id),
            today,
            &config,
        ))
    }

    /// Lead time from the supplier of the item's most recent order, falling
    /// back to the configured default when the item was never ordered.
    fn lead_time_for(&self, item_id: ItemId) -> u32 {
        use crate::catalog_store::SupplierDirectory;

        self.orders
            .list(None)
            .into_iter()
            .rev()
            .find(|order| order.lines().iter().any(|l| l.item_id == item_id))
            .and_then(|order| self.suppliers.get(&order.supplier_id()))
            .map(|supplier| supplier.lead_time_days())
            .unwrap_or(self.default_lead_time_days)
    }
}

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use rxstock_catalog::Item;
use rxstock_core::ItemId;
use rxstock_ledger::{MovementKind, StockMovement};

/// Days per month used to convert monthly consumption into a daily rate.
const DAYS_PER_MONTH: f64 = 30.0;

/// Forecast engine configuration.
///
/// The estimator is intentionally a transparent moving-average/linear-trend
/// model rather than a black box: clinical stock decisions must be
/// auditable from the numbers in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Trailing window of calendar months to aggregate.
    pub window_months: u32,
    /// Multiplier on the lead-time demand buffer.
    pub safety_factor: f64,
    /// Maximum number of trailing points fed to the trend fit.
    pub trend_points: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_months: 6,
            safety_factor: 1.0,
            trend_points: 6,
        }
    }
}

impl ForecastConfig {
    pub fn with_window_months(mut self, window_months: u32) -> Self {
        self.window_months = window_months.max(1);
        self
    }

    pub fn with_safety_factor(mut self, safety_factor: f64) -> Self {
        self.safety_factor = safety_factor;
        self
    }

    pub fn with_trend_points(mut self, trend_points: usize) -> Self {
        self.trend_points = trend_points.clamp(3, 6);
        self
    }
}

/// One calendar month of the consumption series.
///
/// `projected` is the estimate this model would have produced for the month
/// from the points preceding it (chartable actual-vs-projected); it is
/// `None` while there is no preceding history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub month: u32,
    pub actual: i64,
    pub projected: Option<f64>,
}

/// How soon the item is projected to stock out, relative to lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Reorder advice for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub item_id: ItemId,
    pub projected_demand: f64,
    pub average_daily_consumption: f64,
    /// `None` when consumption is zero (no projected stockout).
    pub days_until_stockout: Option<f64>,
    pub safety_stock: f64,
    pub recommended_order: i64,
    pub urgency: Urgency,
    /// 0..=100, derived from the inverse coefficient of variation.
    pub confidence: u8,
    pub explanation: String,
}

/// Forecast output: the monthly series plus the recommendation derived
/// from it. Recomputed on demand, never persisted as authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub item_id: ItemId,
    pub series: Vec<ForecastPoint>,
    pub recommendation: ReorderRecommendation,
}

/// Forecast demand and derive reorder advice for one item.
///
/// Buckets `dispense` magnitudes by calendar month over the trailing window
/// ending at `today`'s month, projects next-period demand, and sizes the
/// recommended order as `max(0, projected + safety_stock - current_stock)`.
/// With fewer than 2 months of recorded consumption the estimator has
/// nothing to extrapolate: confidence is 0 and the recommendation falls
/// back to topping the stock up to the item's minimum threshold.
pub fn forecast_item(
    item: &Item,
    movements: &[StockMovement],
    current_stock: i64,
    lead_time_days: u32,
    today: NaiveDate,
    config: &ForecastConfig,
) -> ForecastReport {
    let months = trailing_months(today, config.window_months);
    let values = bucket_dispenses(movements, &months);
    let series = build_series(&months, &values);
    forecast_from_series(item, series, &values, current_stock, lead_time_days, config)
}

/// Monthly dispense series over the trailing window, zero-filled; the
/// aggregate-analytics view uses this directly across many items.
pub fn monthly_dispense_series(
    movements: &[StockMovement],
    window_months: u32,
    today: NaiveDate,
) -> Vec<ForecastPoint> {
    let months = trailing_months(today, window_months);
    let values = bucket_dispenses(movements, &months);
    build_series(&months, &values)
}

fn forecast_from_series(
    item: &Item,
    series: Vec<ForecastPoint>,
    values: &[i64],
    current_stock: i64,
    lead_time_days: u32,
    config: &ForecastConfig,
) -> ForecastReport {
    let data_points = values.iter().filter(|v| **v > 0).count();
    let avg_monthly = mean(&values.iter().map(|v| *v as f64).collect::<Vec<_>>());
    let average_daily = avg_monthly / DAYS_PER_MONTH;

    let recommendation = if data_points < 2 {
        let recommended_order = (item.minimum_threshold() - current_stock).max(0);
        ReorderRecommendation {
            item_id: item.id(),
            projected_demand: avg_monthly,
            average_daily_consumption: average_daily,
            days_until_stockout: None,
            safety_stock: 0.0,
            recommended_order,
            urgency: Urgency::Low,
            confidence: 0,
            explanation: format!(
                "{} month(s) of consumption history; recommending top-up to the minimum threshold of {}",
                data_points,
                item.minimum_threshold()
            ),
        }
    } else {
        let projected_demand = project_next(values, config.trend_points);
        let safety_stock = config.safety_factor * f64::from(lead_time_days) * average_daily;
        let recommended_order =
            (projected_demand + safety_stock - current_stock as f64).ceil().max(0.0) as i64;

        let days_until_stockout = if average_daily > 0.0 {
            Some(current_stock as f64 / average_daily)
        } else {
            None
        };
        let urgency = match days_until_stockout {
            Some(days) if days <= f64::from(lead_time_days) => Urgency::High,
            Some(days) if days <= 2.0 * f64::from(lead_time_days) => Urgency::Medium,
            _ => Urgency::Low,
        };
        let confidence = confidence_from_series(values);

        ReorderRecommendation {
            item_id: item.id(),
            projected_demand,
            average_daily_consumption: average_daily,
            days_until_stockout,
            safety_stock,
            recommended_order,
            urgency,
            confidence,
            explanation: format!(
                "projected demand {projected_demand:.1}/month over {} month(s), \
                 ~{average_daily:.2}/day; stock {current_stock} covers \
                 {days:.0} day(s) against a {lead_time_days}-day lead time",
                values.len(),
                average_daily = average_daily,
                days = days_until_stockout.unwrap_or(f64::INFINITY),
            ),
        }
    };

    ForecastReport {
        item_id: item.id(),
        series,
        recommendation,
    }
}

/// The trailing `window` calendar months ending with `today`'s month,
/// oldest first.
fn trailing_months(today: NaiveDate, window: u32) -> Vec<(i32, u32)> {
    let mut months = Vec::with_capacity(window as usize);
    let mut year = today.year();
    let mut month = today.month();
    for _ in 0..window.max(1) {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}

/// Sum dispense magnitudes into the window's month buckets (zero-filled).
fn bucket_dispenses(movements: &[StockMovement], months: &[(i32, u32)]) -> Vec<i64> {
    let mut values = vec![0i64; months.len()];
    for movement in movements {
        if movement.record.kind != MovementKind::Dispense {
            continue;
        }
        let occurred = movement.occurred_at().date_naive();
        let key = (occurred.year(), occurred.month());
        if let Some(idx) = months.iter().position(|m| *m == key) {
            values[idx] += movement.record.magnitude();
        }
    }
    values
}

fn build_series(months: &[(i32, u32)], values: &[i64]) -> Vec<ForecastPoint> {
    months
        .iter()
        .zip(values)
        .enumerate()
        .map(|(idx, (&(year, month), &actual))| {
            // Estimate each month from up to 3 preceding months, so the
            // series can be charted actual-vs-projected.
            let projected = if idx == 0 {
                None
            } else {
                let start = idx.saturating_sub(3);
                let prior: Vec<f64> = values[start..idx].iter().map(|v| *v as f64).collect();
                Some(mean(&prior))
            };
            ForecastPoint {
                year,
                month,
                actual,
                projected,
            }
        })
        .collect()
}

/// Next-period demand: least-squares trend over the trailing points when at
/// least 3 months carry data, otherwise the window's moving average. Trend
/// projections are floored at zero.
fn project_next(values: &[i64], trend_points: usize) -> f64 {
    let as_f64: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    let data_points = values.iter().filter(|v| **v > 0).count();
    if data_points < 3 || as_f64.len() < 3 {
        return mean(&as_f64);
    }

    let tail_len = trend_points.clamp(3, 6).min(as_f64.len());
    let tail = &as_f64[as_f64.len() - tail_len..];

    let n = tail.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = mean(tail);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in tail.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 {
        return mean_y;
    }
    let slope = num / den;
    let intercept = mean_y - slope * mean_x;
    (intercept + slope * n).max(0.0)
}

/// Inverse coefficient of variation, clipped to `[0, 100]`.
fn confidence_from_series(values: &[i64]) -> u8 {
    let as_f64: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    let m = mean(&as_f64);
    if m <= 0.0 {
        return 0;
    }
    let cv = stddev_sample(&as_f64, m) / m;
    ((1.0 - cv) * 100.0).clamp(0.0, 100.0).round() as u8
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

/// Sample standard deviation (n-1), deterministic.
fn stddev_sample(xs: &[f64], mean: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let var = xs
        .iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / ((xs.len() - 1) as f64);
    var.sqrt()
}

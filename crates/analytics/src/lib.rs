//! Read-only analytics over the ledger and repository.
//!
//! The forecast engine and the alert generator are deterministic functions
//! over snapshots and movement history; they never mutate state. `today` is
//! always an explicit input so results are reproducible in tests.

pub mod alerts;
pub mod forecast;
pub mod snapshot;

pub use alerts::{Alert, AlertPriority, scan};
pub use forecast::{
    ForecastConfig, ForecastPoint, ForecastReport, ReorderRecommendation, Urgency, forecast_item,
    monthly_dispense_series,
};
pub use snapshot::{BatchStock, StockSnapshot};

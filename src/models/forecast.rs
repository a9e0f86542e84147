//! Forecast models

use chrono::NaiveDate;
use serde::Serialize;

/// One predicted close on a future calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// One entry per calendar day from tomorrow through the horizon
pub type ForecastSeries = Vec<ForecastPoint>;

//! Chart generation models

use chrono::NaiveDate;
use serde::Serialize;

/// A single daily close on a price chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Chronologically ordered daily closes, one per trading day in a window.
/// Non-trading days are simply absent.
pub type PriceSeries = Vec<PricePoint>;

/// A chart rendered to PNG, together with what it was drawn from
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub points: Vec<(NaiveDate, f64)>,
    pub png: Vec<u8>,
}

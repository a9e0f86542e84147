//! View model returned for a completed forecast request

use chrono::NaiveDate;
use serde::Serialize;

use super::{CompanyProfile, ForecastSeries};

/// A chart ready for inline embedding
#[derive(Debug, Clone, Serialize)]
pub struct EncodedChart {
    pub title: String,
    pub base64_png: String,
}

/// Everything the results page needs
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub symbol: String,
    pub horizon_days: u32,
    pub generated_on: NaiveDate,
    pub profile: CompanyProfile,
    pub chart_1_month: EncodedChart,
    pub chart_6_months: EncodedChart,
    pub chart_12_months: EncodedChart,
    pub chart_forecast: EncodedChart,
    pub forecast: ForecastSeries,
}

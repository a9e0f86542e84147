//! Data models for the stock forecast pipeline
//!
//! Everything here lives for exactly one request. Each model is either an
//! input to a service (query, price series) or the output of one
//! (rendered chart, forecast, report).

pub mod chart;
pub mod forecast;
pub mod profile;
pub mod query;
pub mod report;

// Re-export commonly used types for convenience
pub use chart::{PricePoint, PriceSeries, RenderedChart};
pub use forecast::{ForecastPoint, ForecastSeries};
pub use profile::CompanyProfile;
pub use query::TickerQuery;
pub use report::{EncodedChart, ForecastReport};

pub mod chart_service;
pub mod forecast_service;
pub mod market_service;
pub mod regression;
pub mod report_service;

//! Validated form input

/// A ticker and forecast horizon that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerQuery {
    pub symbol: String,
    pub horizon_days: u32,
}

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::api::yahoo::ApiError;
use crate::models::{CompanyProfile, PriceSeries};

/// Source of company metadata and daily closes
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Company metadata. Unknown symbols are passed straight through.
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, ApiError>;

    /// Daily closes for trading days in `[start, end)`, oldest first
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError>;
}

/// Trailing history windows shown on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    OneMonth,
    SixMonths,
    TwelveMonths,
}

impl HistoryWindow {
    /// Calendar days covered, counted in 30-day months
    pub fn days(&self) -> i64 {
        match self {
            HistoryWindow::OneMonth => 30,
            HistoryWindow::SixMonths => 30 * 6,
            HistoryWindow::TwelveMonths => 30 * 12,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryWindow::OneMonth => "Past 1 Month",
            HistoryWindow::SixMonths => "Past 6 Months",
            HistoryWindow::TwelveMonths => "Past 12 Months",
        }
    }

    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.days())
    }
}

/// The three trailing windows for one symbol, all ending at the same day
#[derive(Debug, Clone)]
pub struct MarketHistory {
    pub one_month: PriceSeries,
    pub six_months: PriceSeries,
    pub twelve_months: PriceSeries,
}

/// Fetch the 1, 6 and 12 month windows ending (exclusively) at `today`
pub async fn fetch_windows(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    today: NaiveDate,
) -> Result<MarketHistory, ApiError> {
    let one_month = fetch_window(provider, symbol, HistoryWindow::OneMonth, today).await?;
    let six_months = fetch_window(provider, symbol, HistoryWindow::SixMonths, today).await?;
    let twelve_months = fetch_window(provider, symbol, HistoryWindow::TwelveMonths, today).await?;

    Ok(MarketHistory {
        one_month,
        six_months,
        twelve_months,
    })
}

async fn fetch_window(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    window: HistoryWindow,
    today: NaiveDate,
) -> Result<PriceSeries, ApiError> {
    let points = provider
        .fetch_history(symbol, window.start(today), today)
        .await?;
    info!("✓ {} {}: {} closes", symbol, window.label(), points.len());
    Ok(points)
}

#[cfg(test)]
pub mod testing {
    //! In-process provider for pipeline and handler tests

    use super::*;
    use crate::models::PricePoint;
    use chrono::{Datelike, Weekday};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits one close per weekday in the requested range
    pub struct FakeProvider {
        pub calls: AtomicUsize,
        pub empty: bool,
        pub failure: Option<ApiError>,
    }

    impl FakeProvider {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                empty: false,
                failure: None,
            }
        }

        pub fn empty() -> Self {
            Self {
                empty: true,
                ..Self::new()
            }
        }

        pub fn failing(err: ApiError) -> Self {
            Self {
                failure: Some(err),
                ..Self::new()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, ApiError> {
            self.check()?;
            Ok(CompanyProfile {
                display_name: format!("{} Corporation", symbol),
                description: Some("Makes everything.".to_string()),
                ..CompanyProfile::default()
            })
        }

        async fn fetch_history(
            &self,
            _symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<PriceSeries, ApiError> {
            self.check()?;
            if self.empty {
                return Ok(Vec::new());
            }
            Ok(start
                .iter_days()
                .take_while(|d| *d < end)
                .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
                .map(|date| PricePoint {
                    date,
                    close: 100.0 + (date.ordinal() as f64 / 10.0).sin() * 5.0,
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeProvider;
    use super::*;

    #[test]
    fn test_window_starts() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            HistoryWindow::OneMonth.start(today),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
        assert_eq!(HistoryWindow::SixMonths.days(), 180);
        assert_eq!(HistoryWindow::TwelveMonths.days(), 360);
    }

    #[tokio::test]
    async fn test_windows_are_nested() {
        let provider = FakeProvider::new();
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let history = fetch_windows(&provider, "ACME", today).await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert!(history.one_month.len() < history.six_months.len());
        assert!(history.six_months.len() < history.twelve_months.len());
        assert!(history
            .one_month
            .iter()
            .all(|p| history.six_months.contains(p)));
        assert!(history
            .six_months
            .iter()
            .all(|p| history.twelve_months.contains(p)));
        assert!(history.twelve_months.iter().all(|p| p.date < today));
    }

    #[tokio::test]
    async fn test_each_window_starts_at_its_own_offset() {
        let provider = FakeProvider::new();
        // Every window start for this day falls on a weekday
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let history = fetch_windows(&provider, "ACME", today).await.unwrap();

        let first = |series: &PriceSeries| series.first().map(|p| p.date);
        assert_eq!(first(&history.one_month), Some(HistoryWindow::OneMonth.start(today)));
        assert_eq!(first(&history.six_months), Some(HistoryWindow::SixMonths.start(today)));
        assert_eq!(
            first(&history.twelve_months),
            Some(HistoryWindow::TwelveMonths.start(today))
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = FakeProvider::failing(ApiError::NotFound("no such symbol".into()));
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let err = fetch_windows(&provider, "NOPE", today).await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("no such symbol".into()));
        assert_eq!(provider.call_count(), 1);
    }
}

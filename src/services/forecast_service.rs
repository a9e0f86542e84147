use chrono::{Duration, NaiveDate};

use super::regression::{FitError, SvrModel, SvrParams};
use crate::models::{ForecastPoint, ForecastSeries, PriceSeries};
use crate::utils::errors::AppError;

/// Fit an RBF SVR on trading-day index → close and extrapolate `horizon_days`
/// steps past the end of the series.
///
/// Known limitation: the model is trained on trading-day indices (weekends
/// and holidays are absent) but the predictions are labelled with calendar
/// days starting tomorrow, so step `k` of the extrapolation is shown as
/// `today + k` even when that is a weekend.
pub fn forecast(
    symbol: &str,
    series: &PriceSeries,
    horizon_days: u32,
    today: NaiveDate,
) -> Result<ForecastSeries, AppError> {
    if series.is_empty() {
        return Err(AppError::InsufficientData {
            symbol: symbol.to_string(),
            points: 0,
        });
    }

    let x: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let y: Vec<f64> = series.iter().map(|p| p.close).collect();

    let model = SvrModel::fit(&x, &y, SvrParams::default()).map_err(|e| match e {
        FitError::Empty => AppError::InsufficientData {
            symbol: symbol.to_string(),
            points: 0,
        },
        other => AppError::Forecast(format!("Failed to fit model for {}: {}", symbol, other)),
    })?;

    let start = series.len();
    let forecast = (0..horizon_days as usize)
        .map(|step| ForecastPoint {
            date: today + Duration::days(step as i64 + 1),
            price: model.predict((start + step) as f64),
        })
        .collect();

    tracing::debug!(
        "Forecast for {}: {} training points, {} support vectors, {} days ahead",
        symbol,
        series.len(),
        model.support_vector_count(),
        horizon_days
    );

    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trading_days(start: NaiveDate, n: usize) -> PriceSeries {
        use chrono::{Datelike, Weekday};
        let mut series = Vec::new();
        let mut day = start;
        while series.len() < n {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                series.push(PricePoint {
                    date: day,
                    close: 100.0 + series.len() as f64 * 0.5,
                });
            }
            day += Duration::days(1);
        }
        series
    }

    #[test]
    fn test_horizon_of_five_from_example_date() {
        let today = date(2024, 1, 10);
        let series = trading_days(date(2023, 7, 14), 120);

        let forecast = forecast("ACME", &series, 5, today).unwrap();

        let dates: Vec<NaiveDate> = forecast.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 11),
                date(2024, 1, 12),
                date(2024, 1, 13),
                date(2024, 1, 14),
                date(2024, 1, 15),
            ]
        );
    }

    #[test]
    fn test_forecast_has_horizon_entries_with_increasing_dates() {
        let today = date(2024, 6, 1);
        let series = trading_days(date(2023, 12, 1), 100);

        for horizon in [1, 7, 30] {
            let forecast = forecast("ACME", &series, horizon, today).unwrap();
            assert_eq!(forecast.len(), horizon as usize);
            assert_eq!(forecast[0].date, today + Duration::days(1));
            assert!(forecast.windows(2).all(|w| w[0].date < w[1].date));
            assert!(forecast.iter().all(|p| p.price.is_finite()));
        }
    }

    #[test]
    fn test_empty_series_is_insufficient_data() {
        let err = forecast("ACME", &Vec::new(), 5, date(2024, 1, 10)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientData { ref symbol, points: 0 } if symbol == "ACME"
        ));
    }

    #[test]
    fn test_non_finite_close_is_forecast_error() {
        let mut series = trading_days(date(2024, 1, 1), 10);
        series[4].close = f64::NAN;

        let err = forecast("ACME", &series, 3, date(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, AppError::Forecast(ref msg) if msg.contains("ACME")));
    }

    #[test]
    fn test_flat_history_forecasts_flat() {
        let mut series = trading_days(date(2024, 1, 1), 30);
        for p in series.iter_mut() {
            p.close = 42.0;
        }

        let forecast = forecast("FLAT", &series, 3, date(2024, 2, 15)).unwrap();
        assert!(forecast.iter().all(|p| (p.price - 42.0).abs() < 1e-9));
    }
}

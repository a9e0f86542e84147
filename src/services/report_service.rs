use chrono::NaiveDate;
use tracing::info;

use super::chart_service::ChartRenderer;
use super::forecast_service;
use super::market_service::{fetch_windows, HistoryWindow, MarketDataProvider};
use crate::models::{EncodedChart, ForecastReport, PriceSeries, RenderedChart, TickerQuery};
use crate::utils::encoding::encode_chart;
use crate::utils::errors::AppError;

const X_LABEL: &str = "Date";
const Y_LABEL: &str = "Stock Price";
pub const FORECAST_TITLE: &str = "Stock Price Forecast";

/// Run the whole fetch → chart → forecast → encode pipeline for one query.
///
/// Steps run strictly in order and the first failure ends the request; no
/// forecast chart is produced unless the forecast itself succeeded.
pub async fn build_report(
    provider: &dyn MarketDataProvider,
    renderer: ChartRenderer,
    query: &TickerQuery,
    today: NaiveDate,
) -> Result<ForecastReport, AppError> {
    let symbol = query.symbol.as_str();

    let profile = provider.fetch_profile(symbol).await?;
    tracing::debug!("Profile for {}: {:?}", symbol, profile);

    let history = fetch_windows(provider, symbol, today).await?;
    let name = profile.title_name(symbol).to_string();

    let chart_1_month = history_chart(&renderer, &history.one_month, HistoryWindow::OneMonth, &name)?;
    let chart_6_months = history_chart(&renderer, &history.six_months, HistoryWindow::SixMonths, &name)?;
    let chart_12_months =
        history_chart(&renderer, &history.twelve_months, HistoryWindow::TwelveMonths, &name)?;

    let forecast = forecast_service::forecast(symbol, &history.six_months, query.horizon_days, today)?;
    let forecast_points: Vec<(NaiveDate, f64)> = forecast.iter().map(|p| (p.date, p.price)).collect();
    let chart_forecast = renderer.render_forecast(&forecast_points, FORECAST_TITLE, X_LABEL, Y_LABEL)?;

    info!(
        "✓ Report ready for {}: {} forecast days from {} training closes",
        symbol,
        forecast.len(),
        history.six_months.len()
    );

    Ok(ForecastReport {
        symbol: symbol.to_string(),
        horizon_days: query.horizon_days,
        generated_on: today,
        profile,
        chart_1_month: encoded(&chart_1_month),
        chart_6_months: encoded(&chart_6_months),
        chart_12_months: encoded(&chart_12_months),
        chart_forecast: encoded(&chart_forecast),
        forecast,
    })
}

fn history_chart(
    renderer: &ChartRenderer,
    series: &PriceSeries,
    window: HistoryWindow,
    name: &str,
) -> Result<RenderedChart, AppError> {
    let points: Vec<(NaiveDate, f64)> = series.iter().map(|p| (p.date, p.close)).collect();
    let title = format!("Stock Price Trend ({}) of {}", window.label(), name);
    Ok(renderer.render_history(&points, &title, X_LABEL, Y_LABEL)?)
}

fn encoded(chart: &RenderedChart) -> EncodedChart {
    tracing::debug!("Encoding '{}' ({} points)", chart.title, chart.points.len());
    EncodedChart {
        title: chart.title.clone(),
        base64_png: encode_chart(chart),
    }
}

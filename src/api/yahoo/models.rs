use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{CompanyProfile, PricePoint, PriceSeries};

/// Envelope of the v8 chart endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<YahooErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

/// Instrument metadata attached to every chart response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub currency: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBars>,
}

/// Daily bars; only closes are used. Yahoo emits `null` for sessions with no print.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteBars {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Envelope of the v10 quoteSummary endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryEnvelope {
    pub result: Option<Vec<QuoteSummaryResult>>,
    pub error: Option<YahooErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    pub price: Option<PriceModule>,
    pub asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetProfileModule {
    pub long_business_summary: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

/// Error object Yahoo nests inside both envelopes
#[derive(Debug, Clone, Deserialize)]
pub struct YahooErrorBody {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl YahooErrorBody {
    pub fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown provider error".to_string(),
        }
    }
}

/// Pull `chart.error.description` or `quoteSummary.error.description` out of
/// an error body, if it has either
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["chart", "quoteSummary", "finance"]
        .iter()
        .filter_map(|key| value.get(*key))
        .filter_map(|envelope| envelope.get("error"))
        .find(|err| !err.is_null())
        .and_then(|err| serde_json::from_value::<YahooErrorBody>(err.clone()).ok())
        .map(|err| err.message())
}

impl ChartResult {
    /// Daily closes in `[start, end)`, keyed by exchange-local trading date
    pub fn closes_between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let timestamps = match &self.timestamp {
            Some(ts) => ts,
            None => return Vec::new(),
        };
        let closes = match self.indicators.quote.first() {
            Some(bars) => &bars.close,
            None => return Vec::new(),
        };

        let mut series: PriceSeries = timestamps
            .iter()
            .zip(closes.iter())
            .filter_map(|(ts, close)| {
                let close = close.filter(|c| c.is_finite())?;
                let local = DateTime::<Utc>::from_timestamp(ts + self.meta.gmtoffset, 0)?;
                Some(PricePoint {
                    date: local.date_naive(),
                    close,
                })
            })
            .filter(|p| p.date >= start && p.date < end)
            .collect();

        series.sort_by_key(|p| p.date);
        series
    }
}

impl From<&ChartMeta> for CompanyProfile {
    fn from(meta: &ChartMeta) -> Self {
        CompanyProfile {
            display_name: meta
                .long_name
                .clone()
                .or_else(|| meta.short_name.clone())
                .unwrap_or_default(),
            logo_url: None,
            description: None,
            website: None,
            currency: meta.currency.clone(),
        }
    }
}

impl From<QuoteSummaryResult> for CompanyProfile {
    fn from(summary: QuoteSummaryResult) -> Self {
        let price = summary.price.unwrap_or_default();
        let asset = summary.asset_profile.unwrap_or_default();
        CompanyProfile {
            display_name: price.long_name.or(price.short_name).unwrap_or_default(),
            logo_url: asset.logo_url,
            description: asset.long_business_summary,
            website: asset.website,
            currency: price.currency,
        }
    }
}

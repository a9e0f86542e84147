use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client as HttpClient, Url};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::ApiError;
use super::models::{extract_error_message, ChartResponse, ChartResult, QuoteSummaryResponse};
use crate::models::{CompanyProfile, PriceSeries};
use crate::services::market_service::MarketDataProvider;

/// Yahoo Finance client for company metadata and daily price history
pub struct YahooClient {
    http_client: HttpClient,
    base_url: Url,
    cookie_url: String,
    crumb: RwLock<Option<String>>,
}

impl YahooClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com";
    pub const DEFAULT_COOKIE_URL: &'static str = "https://fc.yahoo.com";
    pub const DEFAULT_USER_AGENT: &'static str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    /// Create a client with a custom base URL, cookie URL and user agent
    pub fn with_base_url(base_url: &str, cookie_url: &str, user_agent: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::RequestError(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::RequestError(format!("Invalid base URL '{}'", base_url)));
        }

        let http_client = HttpClient::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            cookie_url: cookie_url.to_string(),
            crumb: RwLock::new(None),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::RequestError(format!("Invalid base URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-success response into an `ApiError`, preferring the
    /// message from Yahoo's JSON error envelope over the raw body
    async fn handle_error_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body_text).unwrap_or(body_text);

        match status {
            429 => warn!("Yahoo Finance rate limited the request: {}", message),
            500..=599 => warn!("Yahoo Finance server error {}: {}", status, message),
            _ => debug!("Yahoo Finance returned {}: {}", status, message),
        }

        ApiError::from_status(status, message)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))
    }

    /// GET /v8/finance/chart/{symbol}
    ///
    /// Daily bars between two UTC midnights. Returns `None` when Yahoo
    /// answers successfully but with no result.
    async fn get_chart(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<ChartResult>, ApiError> {
        let url = self.endpoint(&["v8", "finance", "chart", symbol])?;
        let query = [
            ("period1", midnight_timestamp(start).to_string()),
            ("period2", midnight_timestamp(end).to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ];

        let response: ChartResponse = self.get_json(url, &query).await?;

        if let Some(err) = response.chart.error {
            return Err(ApiError::NotFound(err.message()));
        }

        Ok(response.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }))
    }

    /// Session crumb for quoteSummary, fetched once and cached
    async fn crumb(&self) -> Result<String, ApiError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let mut slot = self.crumb.write().await;
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        debug!("Obtained Yahoo Finance crumb");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    /// Cookie handshake then GET /v1/test/getcrumb. Any failure is reported
    /// as `Unauthorized` so callers can degrade the same way as a 401.
    async fn fetch_crumb(&self) -> Result<String, ApiError> {
        // Only the Set-Cookie header matters; the status is usually 404
        self.http_client
            .get(&self.cookie_url)
            .send()
            .await
            .map_err(|e| ApiError::Unauthorized(format!("Cookie request failed: {}", e)))?;

        let url = self.endpoint(&["v1", "test", "getcrumb"])?;
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Unauthorized(format!("Crumb request failed: {}", e)))?;

        if !response.status().is_success() {
            let err = Self::handle_error_response(response).await;
            return Err(ApiError::Unauthorized(format!("Crumb refused: {}", err)));
        }

        let crumb = response
            .text()
            .await
            .map_err(|e| ApiError::Unauthorized(format!("Failed to read crumb: {}", e)))?
            .trim()
            .to_string();

        if crumb.is_empty() || crumb.contains('<') || crumb.contains('{') {
            return Err(ApiError::Unauthorized("Yahoo Finance returned no crumb".to_string()));
        }

        Ok(crumb)
    }

    /// GET /v10/finance/quoteSummary/{symbol}?modules=price,assetProfile
    ///
    /// A rejected crumb is dropped and fetched again once.
    async fn get_quote_summary(&self, symbol: &str) -> Result<CompanyProfile, ApiError> {
        match self.get_quote_summary_once(symbol).await {
            Err(ApiError::Unauthorized(msg)) => {
                debug!("Crumb rejected for {} ({}), refreshing", symbol, msg);
                *self.crumb.write().await = None;
                self.get_quote_summary_once(symbol).await
            }
            other => other,
        }
    }

    async fn get_quote_summary_once(&self, symbol: &str) -> Result<CompanyProfile, ApiError> {
        let crumb = self.crumb().await?;
        let url = self.endpoint(&["v10", "finance", "quoteSummary", symbol])?;
        let query = [
            ("modules", "price,assetProfile".to_string()),
            ("crumb", crumb),
        ];

        let response: QuoteSummaryResponse = self.get_json(url, &query).await?;

        if let Some(err) = response.quote_summary.error {
            return Err(ApiError::NotFound(err.message()));
        }

        Ok(response
            .quote_summary
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .map(CompanyProfile::from)
            .unwrap_or_default())
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, ApiError> {
        match self.get_quote_summary(symbol).await {
            Ok(profile) => Ok(profile),
            Err(ApiError::Unauthorized(msg)) | Err(ApiError::Forbidden(msg)) => {
                // Chart metadata still carries the name, not the description
                warn!("quoteSummary refused for {} ({}), using chart metadata", symbol, msg);
                let today = chrono::Utc::now().date_naive();
                let chart = self
                    .get_chart(symbol, today - chrono::Duration::days(7), today)
                    .await?;
                Ok(chart
                    .map(|c| CompanyProfile::from(&c.meta))
                    .unwrap_or_default())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let chart = self.get_chart(symbol, start, end).await?;
        Ok(chart
            .map(|c| c.closes_between(start, end))
            .unwrap_or_default())
    }
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

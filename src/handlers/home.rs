use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use super::AppState;
use crate::models::TickerQuery;
use crate::services::report_service::build_report;
use crate::utils::errors::AppError;
use crate::views::{render_page, FormInput, PageState};

/// Raw form fields. Both are kept as text so bad input can be reported
/// instead of rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastForm {
    #[serde(default)]
    pub stock_code: String,
    #[serde(default)]
    pub days: String,
}

impl From<&ForecastForm> for FormInput {
    fn from(form: &ForecastForm) -> Self {
        FormInput {
            stock_code: form.stock_code.trim().to_string(),
            days: form.days.trim().to_string(),
        }
    }
}

/// Validate the form before anything touches the network
pub fn parse_query(form: &ForecastForm, max_horizon_days: u32) -> Result<TickerQuery, AppError> {
    let symbol = form.stock_code.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Input("Please enter a ticker symbol.".to_string()));
    }

    let days = form.days.trim();
    let horizon: i64 = days.parse().map_err(|_| {
        AppError::Input(format!(
            "Days to forecast must be a whole number, got '{}'.",
            days
        ))
    })?;

    if horizon <= 0 {
        return Err(AppError::Input(
            "Days to forecast must be at least 1.".to_string(),
        ));
    }
    if horizon > max_horizon_days as i64 {
        return Err(AppError::Input(format!(
            "Days to forecast can be at most {}.",
            max_horizon_days
        )));
    }

    Ok(TickerQuery {
        symbol,
        horizon_days: horizon as u32,
    })
}

/// GET /: the empty form
pub async fn show_form(State(state): State<AppState>) -> Response {
    let page = PageState::AwaitingInput {
        input: FormInput::default(),
        error: None,
    };
    respond(StatusCode::OK, render_page(&page, state.max_horizon_days))
}

/// POST /: run the forecast and show results, or the form with an error
pub async fn submit_form(State(state): State<AppState>, Form(form): Form<ForecastForm>) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("forecast", %request_id);

    async move {
        info!("📈 Forecast requested: stock_code={:?} days={:?}", form.stock_code, form.days);
        let input = FormInput::from(&form);

        let result = match parse_query(&form, state.max_horizon_days) {
            Ok(query) => {
                let today = chrono::Utc::now().date_naive();
                build_report(state.provider.as_ref(), state.renderer, &query, today).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                info!("✓ Forecast page built for {}", report.symbol);
                let page = PageState::Completed {
                    input,
                    report: &report,
                };
                respond(StatusCode::OK, render_page(&page, state.max_horizon_days))
            }
            Err(e) => {
                if e.is_client_side() {
                    warn!("Forecast request failed: {}", e);
                } else {
                    error!("Forecast request failed: {}", e);
                }
                let page = PageState::AwaitingInput {
                    input,
                    error: Some(&e),
                };
                respond(e.status_code(), render_page(&page, state.max_horizon_days))
            }
        }
    }
    .instrument(span)
    .await
}

fn respond(status: StatusCode, page: Result<String, AppError>) -> Response {
    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.user_message()).into_response()
        }
    }
}

use axum::http::StatusCode;
use thiserror::Error;

use crate::api::yahoo::ApiError;

/// Everything that can end a forecast request early
#[derive(Debug, Error)]
pub enum AppError {
    /// The form input could not be turned into a query
    #[error("Invalid input: {0}")]
    Input(String),
    /// The data provider failed or refused the request
    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),
    /// Too few closes to fit the regression
    #[error("Insufficient data for {symbol}: {points} price point(s) available")]
    InsufficientData { symbol: String, points: usize },
    /// The regression could not be fitted to the closes
    #[error("Forecast error: {0}")]
    Forecast(String),
    /// Drawing a chart or encoding it as PNG failed
    #[error("Render error: {0}")]
    Render(String),
    /// The page template failed to render
    #[error("Template error: {0}")]
    Template(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forecast(_) | AppError::Render(_) | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short heading shown above the message on the form
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Input(_) => "Input error",
            AppError::Upstream(_) => "Data provider error",
            AppError::InsufficientData { .. } => "Insufficient data",
            AppError::Forecast(_) => "Forecast error",
            AppError::Render(_) | AppError::Template(_) => "Internal error",
        }
    }

    /// Message safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Input(msg) => msg.clone(),
            AppError::Upstream(e) => e.user_message(),
            AppError::InsufficientData { symbol, points } => format!(
                "Not enough price history for {} to fit a forecast ({} point(s) found).",
                symbol, points
            ),
            AppError::Forecast(_) => {
                "The forecast model could not be fitted to this price history.".to_string()
            }
            AppError::Render(_) | AppError::Template(_) => {
                "Something went wrong while building the page.".to_string()
            }
        }
    }

    /// Caused by the client or provider rather than by us
    pub fn is_client_side(&self) -> bool {
        !matches!(
            self,
            AppError::Forecast(_) | AppError::Render(_) | AppError::Template(_)
        )
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::Template(err.to_string())
    }
}

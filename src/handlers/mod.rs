use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::chart_service::ChartRenderer;
use crate::services::market_service::MarketDataProvider;

pub mod health;
pub mod home;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    pub renderer: ChartRenderer,
    pub max_horizon_days: u32,
}

impl AppState {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &Config) -> Self {
        Self {
            provider,
            renderer: ChartRenderer::new(config.chart_width, config.chart_height),
            max_horizon_days: config.max_horizon_days,
        }
    }
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::show_form).post(home::submit_form))
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod handlers;
mod models;
mod services;
mod utils;
mod views;

use api::yahoo::YahooClient;
use config::Config;
use handlers::{create_router, AppState};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("stockcast=debug".parse().unwrap())
                .add_directive("tower_http=info".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("📈 Starting stockcast v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    debug!("Configuration: {:?}", config);

    let client = match YahooClient::with_base_url(
        &config.yahoo_base_url,
        &config.yahoo_cookie_url,
        &config.user_agent,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create Yahoo Finance client: {}", e);
            return;
        }
    };

    let state = AppState::new(Arc::new(client), &config);
    let app = create_router(state);

    let listener = match TcpListener::bind(&config.bind_address).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", config.bind_address, e);
            return;
        }
    };

    info!("Serving on http://{}", config.bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

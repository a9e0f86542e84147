pub mod client;
pub mod error;
pub mod models;

pub use client::YahooClient;
pub use error::ApiError;

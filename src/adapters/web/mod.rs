//! Web dashboard adapter.
//!
//! Axum server with an HTMX frontend: a parameter form, the rendered backtest
//! report and the lessons.

mod error;
mod handlers;
mod templates;

pub use error::{status_from_error, WebError};
pub use handlers::*;
pub use templates::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::error::TradelogicError;
use crate::domain::runner::BacktestRequest;
use crate::ports::price_port::PriceSource;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

pub struct AppState {
    pub price_source: Arc<dyn PriceSource + Send + Sync>,
    /// Prefilled form values.
    pub defaults: BacktestRequest,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/backtest/run", post(handlers::run_backtest))
        .route("/lessons", get(handlers::lessons))
        .route("/lessons/{slug}", get(handlers::lesson))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

pub async fn serve(state: AppState, listen: &str) -> Result<(), TradelogicError> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(address = %listen, "dashboard listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

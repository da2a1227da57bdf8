//! Fetch-then-run orchestration for a single ticker.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::backtest::{run_backtest, validate_windows, BacktestResult};
use crate::domain::error::TradelogicError;
use crate::ports::price_port::PriceSource;

pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_SHORT_WINDOW: usize = 20;
pub const DEFAULT_LONG_WINDOW: usize = 50;

/// Parameters collected from the user for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestRequest {
    pub ticker: String,
    pub short_window: usize,
    pub long_window: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BacktestRequest {
    pub fn default_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default()
    }

    pub fn default_end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
    }
}

impl Default for BacktestRequest {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            start_date: Self::default_start_date(),
            end_date: Self::default_end_date(),
        }
    }
}

/// Trim and upper-case a user-entered ticker.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn invalid_ticker(reason: impl Into<String>) -> TradelogicError {
    TradelogicError::ConfigInvalid {
        section: "backtest".into(),
        key: "ticker".into(),
        reason: reason.into(),
    }
}

/// Tickers name files and URL segments, so only symbol characters
/// (`A-Z 0-9 . ^ = -`) are accepted.
pub fn validate_ticker(ticker: &str) -> Result<(), TradelogicError> {
    if ticker.is_empty() {
        return Err(invalid_ticker("ticker must not be empty"));
    }
    if let Some(c) = ticker
        .chars()
        .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-')))
    {
        return Err(invalid_ticker(format!("ticker contains invalid character '{}'", c)));
    }
    if ticker.contains("..") {
        return Err(invalid_ticker("ticker must not contain '..'"));
    }
    Ok(())
}

/// Normalize then validate a user-entered ticker.
pub fn parse_ticker(raw: &str) -> Result<String, TradelogicError> {
    let ticker = normalize_ticker(raw);
    validate_ticker(&ticker)?;
    Ok(ticker)
}

/// Windows and the ticker are checked before the source is queried, so a bad parameter never
/// costs a fetch.
pub fn run_for_request(
    source: &dyn PriceSource,
    request: &BacktestRequest,
) -> Result<BacktestResult, TradelogicError> {
    validate_windows(request.short_window, request.long_window)?;
    validate_ticker(&request.ticker)?;

    info!(
        ticker = %request.ticker,
        start = %request.start_date,
        end = %request.end_date,
        "fetching prices"
    );
    let prices = source.fetch_prices(&request.ticker, request.start_date, request.end_date)?;
    debug!(ticker = %request.ticker, observations = prices.len(), "prices fetched");

    let result = run_backtest(&prices, request.short_window, request.long_window)?;
    info!(
        ticker = %result.ticker,
        short_window = result.short_window,
        long_window = result.long_window,
        final_strategy_return = result.final_strategy_return,
        "backtest complete"
    );
    Ok(result)
}

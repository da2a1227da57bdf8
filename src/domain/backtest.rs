//! Moving-average crossover backtest engine.
//!
//! Pure transformation from a price series and two window lengths to the
//! aligned derived series. No I/O; identical inputs give identical output.

use chrono::NaiveDate;

use crate::domain::error::TradelogicError;
use crate::domain::price::PriceSeries;
use crate::domain::returns::{cumulative_sum, log_returns, strategy_returns};
use crate::domain::signal::{derive_positions, derive_signals, Signal};
use crate::domain::sma::{calculate_sma, SmaSeries};

/// Fewest observations that yield at least one period return.
pub const MIN_OBSERVATIONS: usize = 2;

/// Every series is aligned 1:1 with `dates`.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ticker: String,
    pub short_window: usize,
    pub long_window: usize,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub short_ma: SmaSeries,
    pub long_ma: SmaSeries,
    pub signals: Vec<Signal>,
    pub positions: Vec<Option<Signal>>,
    pub log_returns: Vec<Option<f64>>,
    pub strategy_returns: Vec<Option<f64>>,
    pub cumulative_strategy: Vec<Option<f64>>,
    pub cumulative_market: Vec<Option<f64>>,
    /// Last cumulative strategy entry as a fraction.
    pub final_strategy_return: f64,
    /// Last cumulative market entry as a fraction.
    pub final_market_return: f64,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

pub fn validate_window(name: &str, value: i64) -> Result<usize, TradelogicError> {
    if value < 1 {
        return Err(TradelogicError::InvalidWindow {
            name: name.to_string(),
            value,
        });
    }
    usize::try_from(value).map_err(|_| TradelogicError::InvalidWindow {
        name: name.to_string(),
        value,
    })
}

pub fn validate_windows(short_window: usize, long_window: usize) -> Result<(), TradelogicError> {
    if short_window == 0 {
        return Err(TradelogicError::InvalidWindow {
            name: "short_window".into(),
            value: 0,
        });
    }
    if long_window == 0 {
        return Err(TradelogicError::InvalidWindow {
            name: "long_window".into(),
            value: 0,
        });
    }
    Ok(())
}

pub fn run_backtest(
    prices: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<BacktestResult, TradelogicError> {
    validate_windows(short_window, long_window)?;

    if prices.len() < MIN_OBSERVATIONS {
        return Err(TradelogicError::InsufficientData {
            ticker: prices.ticker().to_string(),
            observations: prices.len(),
            minimum: MIN_OBSERVATIONS,
        });
    }

    let closes = prices.closes();

    let short_ma = calculate_sma(&closes, short_window);
    let long_ma = calculate_sma(&closes, long_window);
    let signals = derive_signals(&short_ma, &long_ma);
    let positions = derive_positions(&signals);

    let log_returns = log_returns(&closes);
    let strategy_returns = strategy_returns(&log_returns, &positions);
    let cumulative_strategy = cumulative_sum(&strategy_returns);
    let cumulative_market = cumulative_sum(&log_returns);

    let final_strategy_return = cumulative_strategy.last().copied().flatten().unwrap_or(0.0);
    let final_market_return = cumulative_market.last().copied().flatten().unwrap_or(0.0);

    Ok(BacktestResult {
        ticker: prices.ticker().to_string(),
        short_window,
        long_window,
        dates: prices.dates(),
        closes,
        short_ma,
        long_ma,
        signals,
        positions,
        log_returns,
        strategy_returns,
        cumulative_strategy,
        cumulative_market,
        final_strategy_return,
        final_market_return,
    })
}

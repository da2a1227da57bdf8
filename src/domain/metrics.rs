//! Summary statistics for a backtest run.

use super::backtest::BacktestResult;
use super::signal::Signal;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Cumulative log return of the strategy.
    pub strategy_return: f64,
    /// Cumulative log return of buy-and-hold.
    pub market_return: f64,
    pub excess_return: f64,
    /// exp(strategy_return) - 1
    pub strategy_simple_return: f64,
    /// exp(market_return) - 1
    pub market_simple_return: f64,
    pub annualized_strategy_return: f64,
    pub annualized_market_return: f64,
    pub max_drawdown: f64,
    pub position_changes: usize,
    pub days_long: usize,
    pub days_short: usize,
    pub days_flat: usize,
    pub trading_days: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let strategy_return = result.final_strategy_return;
        let market_return = result.final_market_return;

        let periods = result.len().saturating_sub(1) as f64;
        let annualize = |log_return: f64| {
            if periods > 0.0 {
                log_return * TRADING_DAYS_PER_YEAR / periods
            } else {
                0.0
            }
        };

        let mut days_long = 0usize;
        let mut days_short = 0usize;
        let mut days_flat = 0usize;
        for position in result.positions.iter().flatten() {
            match position {
                Signal::Long => days_long += 1,
                Signal::Short => days_short += 1,
                Signal::Flat => days_flat += 1,
            }
        }

        let held: Vec<Signal> = result.positions.iter().flatten().copied().collect();
        let position_changes = held.windows(2).filter(|w| w[0] != w[1]).count();

        Metrics {
            strategy_return,
            market_return,
            excess_return: strategy_return - market_return,
            strategy_simple_return: strategy_return.exp() - 1.0,
            market_simple_return: market_return.exp() - 1.0,
            annualized_strategy_return: annualize(strategy_return),
            annualized_market_return: annualize(market_return),
            max_drawdown: compute_drawdown(&result.cumulative_strategy),
            position_changes,
            days_long,
            days_short,
            days_flat,
            trading_days: result.len(),
        }
    }
}

/// Largest peak-to-trough fall of exp(cumulative log return), as a fraction
/// of the peak. Absent entries count as the starting equity of 1.0.
fn compute_drawdown(cumulative: &[Option<f64>]) -> f64 {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;

    for value in cumulative {
        let equity = value.unwrap_or(0.0).exp();
        if equity > peak {
            peak = equity;
        } else {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Fraction as a percentage with two decimals: `0.1234` becomes `"12.34%"`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

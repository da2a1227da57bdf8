//! Log returns and their cumulation.

use crate::domain::signal::Signal;

/// ln(C[t] / C[t-1]); absent at t = 0.
pub fn log_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            returns.push(None);
        } else {
            returns.push(Some((closes[i] / closes[i - 1]).ln()));
        }
    }
    returns
}

/// Period return scaled by the position held over that period. Absent where
/// either input is absent.
pub fn strategy_returns(log_returns: &[Option<f64>], positions: &[Option<Signal>]) -> Vec<Option<f64>> {
    log_returns
        .iter()
        .zip(positions.iter())
        .map(|(r, p)| match (r, p) {
            (Some(r), Some(p)) => Some(r * p.as_f64()),
            _ => None,
        })
        .collect()
}

/// Running sum. Entries before the first defined input stay absent; after
/// that every entry is defined and absent inputs add zero.
pub fn cumulative_sum(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut total: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            total = match (total, v) {
                (None, None) => None,
                (None, Some(v)) => Some(*v),
                (Some(t), None) => Some(t),
                (Some(t), Some(v)) => Some(t + v),
            };
            total
        })
        .collect()
}

//! Simple Moving Average over closing prices.
//!
//! O(n) sliding window: each step adds the newest close and drops the one
//! that left the window.
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) entries are absent. A period longer than the series
//! leaves every entry absent.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SmaSeries {
    pub period: usize,
    pub values: Vec<Option<f64>>,
}

impl SmaSeries {
    /// First index carrying a value, if any.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for SmaSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA {}", self.period)
    }
}

pub fn calculate_sma(closes: &[f64], period: usize) -> SmaSeries {
    let mut values = Vec::with_capacity(closes.len());
    if period == 0 {
        values.resize(closes.len(), None);
        return SmaSeries { period, values };
    }

    let mut window_sum: f64 = 0.0;
    for (i, &close) in closes.iter().enumerate() {
        window_sum += close;
        if i >= period {
            window_sum -= closes[i - period];
        }

        let valid = i + 1 >= period;
        values.push(valid.then(|| window_sum / period as f64));
    }

    SmaSeries { period, values }
}

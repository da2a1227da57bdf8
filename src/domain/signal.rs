//! Crossover signal and lagged position.

use std::fmt;

use crate::domain::sma::SmaSeries;

/// Directional stance derived from the ordering of the two averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    /// +1, -1 or 0.
    pub fn value(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Flat => 0,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    /// Compare short against long average. Flat when equal or when either
    /// average is absent.
    pub fn from_averages(short: Option<f64>, long: Option<f64>) -> Self {
        match (short, long) {
            (Some(s), Some(l)) if s > l => Signal::Long,
            (Some(s), Some(l)) if s < l => Signal::Short,
            _ => Signal::Flat,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "long"),
            Signal::Short => write!(f, "short"),
            Signal::Flat => write!(f, "flat"),
        }
    }
}

pub fn derive_signals(short: &SmaSeries, long: &SmaSeries) -> Vec<Signal> {
    short
        .values
        .iter()
        .zip(long.values.iter())
        .map(|(&s, &l)| Signal::from_averages(s, l))
        .collect()
}

/// position[t] = signal[t-1]; position[0] is absent.
pub fn derive_positions(signals: &[Signal]) -> Vec<Option<Signal>> {
    if signals.is_empty() {
        return Vec::new();
    }

    let mut positions = Vec::with_capacity(signals.len());
    positions.push(None);
    positions.extend(signals[..signals.len() - 1].iter().copied().map(Some));
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sma(values: Vec<Option<f64>>) -> SmaSeries {
        SmaSeries { period: 1, values }
    }

    #[test]
    fn signal_values() {
        assert_eq!(Signal::Long.value(), 1);
        assert_eq!(Signal::Short.value(), -1);
        assert_eq!(Signal::Flat.value(), 0);
        assert_eq!(Signal::Short.as_f64(), -1.0);
    }

    #[test]
    fn from_averages_ordering() {
        assert_eq!(Signal::from_averages(Some(2.0), Some(1.0)), Signal::Long);
        assert_eq!(Signal::from_averages(Some(1.0), Some(2.0)), Signal::Short);
        assert_eq!(Signal::from_averages(Some(1.0), Some(1.0)), Signal::Flat);
    }

    #[test]
    fn from_averages_absent_is_flat() {
        assert_eq!(Signal::from_averages(None, Some(1.0)), Signal::Flat);
        assert_eq!(Signal::from_averages(Some(1.0), None), Signal::Flat);
        assert_eq!(Signal::from_averages(None, None), Signal::Flat);
    }

    #[test]
    fn derive_signals_aligned() {
        let short = sma(vec![None, Some(3.0), Some(1.0), Some(2.0)]);
        let long = sma(vec![None, None, Some(2.0), Some(2.0)]);
        assert_eq!(
            derive_signals(&short, &long),
            vec![Signal::Flat, Signal::Flat, Signal::Short, Signal::Flat]
        );
    }

    #[test]
    fn positions_lag_signals_by_one() {
        let signals = vec![Signal::Flat, Signal::Long, Signal::Short];
        assert_eq!(
            derive_positions(&signals),
            vec![None, Some(Signal::Flat), Some(Signal::Long)]
        );
    }

    #[test]
    fn positions_empty() {
        assert!(derive_positions(&[]).is_empty());
    }
}

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tradelogic::domain::error::TradelogicError;
use tradelogic::domain::price::{PricePoint, PriceSeries};
use tradelogic::ports::price_port::PriceSource;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn make_series(ticker: &str, start: &str, closes: &[f64]) -> PriceSeries {
    let start = date(start);
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + Duration::days(i as i64), close))
        .collect();
    PriceSeries::new(ticker, points).unwrap()
}

/// A gentle uptrend with a dip in the middle, so crossovers happen.
pub fn wave_closes(count: usize, base: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + i as f64 * 0.5 + 8.0 * ((i as f64) / 6.0).sin())
        .collect()
}

/// CSV content with the columns a typical daily export carries.
pub fn csv_content(start: &str, closes: &[f64]) -> String {
    let start = date(start);
    let mut out = String::from("Date,Open,High,Low,Close,Volume\n");
    for (i, close) in closes.iter().enumerate() {
        let d = start + Duration::days(i as i64);
        out.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},1000\n",
            d,
            close,
            close + 1.0,
            close - 1.0,
            close
        ));
    }
    out
}

pub struct MockPriceSource {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.ticker().to_string(), series);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TradelogicError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TradelogicError::DataSource {
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(ticker)
            .map(|s| {
                s.points()
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(ticker, points)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradelogicError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelogicError> {
        Ok(self.data.get(ticker).and_then(|s| {
            match (s.first_date(), s.last_date()) {
                (Some(first), Some(last)) => Some((first, last, s.len())),
                _ => None,
            }
        }))
    }
}

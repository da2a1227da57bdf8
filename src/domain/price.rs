//! Daily closing price series.

use chrono::NaiveDate;

use crate::domain::error::TradelogicError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Closing prices for one ticker, strictly ascending by date.
///
/// The constructor rejects duplicate or out-of-order dates and non-positive
/// or non-finite prices. An empty series is valid: unknown tickers produce one.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, TradelogicError> {
        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(TradelogicError::InvalidPriceSeries {
                    reason: format!("close on {} must be positive, got {}", point.date, point.close),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(TradelogicError::InvalidPriceSeries {
                    reason: format!(
                        "dates must be strictly increasing: {} follows {}",
                        point.date,
                        points[i - 1].date
                    ),
                });
            }
        }

        Ok(Self {
            ticker: ticker.into(),
            points,
        })
    }

    /// Sort by date before validating. Adapters whose storage order is not
    /// guaranteed go through here.
    pub fn from_unsorted(
        ticker: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, TradelogicError> {
        points.sort_by_key(|p| p.date);
        Self::new(ticker, points)
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            points: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

//! Yahoo Finance chart API price source.
//!
//! Blocking client: callers on an async runtime must run it on a blocking
//! thread.

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::error::TradelogicError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceSource;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TradelogicError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(timeout)
            .build()
            .map_err(|e| TradelogicError::data_source(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradelogicError> {
        let base_url = config
            .get_string("yahoo", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = config.get_int("yahoo", "timeout_secs", 30).max(1) as u64;
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    /// `{base_url}/v8/finance/chart/{ticker}` with the ticker percent-encoded
    /// as a single path segment.
    fn chart_url(&self, ticker: &str) -> Result<reqwest::Url, TradelogicError> {
        let invalid = || {
            TradelogicError::data_source(format!("invalid yahoo base_url '{}'", self.base_url))
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        Ok(url)
    }

    fn unsupported(&self, what: &str) -> TradelogicError {
        TradelogicError::data_source(format!("{} is not supported by the yahoo source", what))
    }
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Query bounds in seconds: midnight of `start_date` up to the midnight after
/// `end_date`, or midnight of `end_date` itself on the last representable day.
fn chart_period(start_date: NaiveDate, end_date: NaiveDate) -> (i64, i64) {
    let after_end = end_date.succ_opt().unwrap_or(end_date);
    (midnight_timestamp(start_date), midnight_timestamp(after_end))
}

/// Turn a chart API body into a series restricted to `[start_date, end_date]`.
/// A "Not Found" chart error means the ticker is unknown and yields an empty
/// series.
pub fn parse_chart_response(
    ticker: &str,
    body: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceSeries, TradelogicError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| TradelogicError::data_source(format!("invalid chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(PriceSeries::empty(ticker));
        }
        return Err(TradelogicError::data_source(format!(
            "yahoo error: {} - {}",
            error.code, error.description
        )));
    }

    let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(data) => data,
        None => return Ok(PriceSeries::empty(ticker)),
    };

    let offset = data.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut points: Vec<PricePoint> = Vec::with_capacity(data.timestamp.len());
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let close = match closes.get(i).copied().flatten() {
            Some(c) => c,
            None => continue,
        };
        let date = match DateTime::from_timestamp(ts + offset, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        if date < start_date || date > end_date {
            continue;
        }
        // A live bar can repeat the last session's date; keep the later one.
        match points.last_mut() {
            Some(last) if last.date == date => last.close = close,
            _ => points.push(PricePoint::new(date, close)),
        }
    }

    PriceSeries::from_unsorted(ticker, points)
}

impl PriceSource for YahooAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TradelogicError> {
        if start_date > end_date {
            return Ok(PriceSeries::empty(ticker));
        }

        let url = self.chart_url(ticker)?;
        let (period1, period2) = chart_period(start_date, end_date);
        debug!(%url, period1, period2, "requesting chart");

        let response = self
            .client
            .get(url.clone())
            .query(&[
                ("interval", "1d".to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
            ])
            .send()
            .map_err(|e| TradelogicError::data_source(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TradelogicError::data_source(format!("failed to read response: {}", e)))?;

        match parse_chart_response(ticker, &body, start_date, end_date) {
            Ok(series) => Ok(series),
            Err(e) if !status.is_success() => {
                warn!(%status, ticker, "chart request failed");
                Err(TradelogicError::data_source(format!("HTTP {} for {}: {}", status, ticker, e)))
            }
            Err(e) => Err(e),
        }
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradelogicError> {
        Err(self.unsupported("listing tickers"))
    }

    fn get_data_range(
        &self,
        _ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelogicError> {
        Err(self.unsupported("querying data ranges"))
    }
}

//! CSV directory price source.
//!
//! One `<TICKER>.csv` per ticker with a header row. The `date` and `close`
//! columns are found by name, so full OHLCV exports load unchanged.

use crate::domain::error::TradelogicError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::runner::validate_ticker;
use crate::ports::config_port::DATE_FORMAT;
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// The ticker must stay a bare file stem inside `base_path`.
    fn csv_path(&self, ticker: &str) -> Result<PathBuf, TradelogicError> {
        validate_ticker(ticker)?;
        Ok(self.base_path.join(format!("{}.csv", ticker)))
    }

    /// Every row of the file; `None` when the file does not exist.
    fn read_points(&self, ticker: &str) -> Result<Option<Vec<PricePoint>>, TradelogicError> {
        let path = self.csv_path(ticker)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no price file");
                return Ok(None);
            }
            Err(e) => {
                return Err(TradelogicError::data_source(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        parse_price_csv(&content, &path).map(Some)
    }

    /// Load a single CSV export outside the price directory, e.g. for import.
    pub fn load_file(ticker: &str, path: &Path) -> Result<PriceSeries, TradelogicError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TradelogicError::data_source(format!("failed to read {}: {}", path.display(), e))
        })?;
        PriceSeries::from_unsorted(ticker, parse_price_csv(&content, path)?)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn parse_price_csv(content: &str, path: &Path) -> Result<Vec<PricePoint>, TradelogicError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| TradelogicError::data_source(format!("CSV parse error in {}: {}", path.display(), e)))?
        .clone();

    let date_col = column_index(&headers, "date").ok_or_else(|| {
        TradelogicError::data_source(format!("missing date column in {}", path.display()))
    })?;
    let close_col = column_index(&headers, "close").ok_or_else(|| {
        TradelogicError::data_source(format!("missing close column in {}", path.display()))
    })?;

    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| TradelogicError::data_source(format!("CSV parse error: {}", e)))?;

        let date_str = record.get(date_col).unwrap_or("").trim();
        // Timestamped exports carry a time after the date.
        let date_part = date_str.split([' ', 'T']).next().unwrap_or(date_str);
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|e| {
            TradelogicError::data_source(format!("invalid date '{}': {}", date_str, e))
        })?;

        let close_str = record.get(close_col).unwrap_or("").trim();
        if close_str.is_empty() || close_str.eq_ignore_ascii_case("null") {
            continue;
        }
        let close: f64 = close_str.parse().map_err(|e| {
            TradelogicError::data_source(format!("invalid close value '{}': {}", close_str, e))
        })?;

        points.push(PricePoint::new(date, close));
    }

    Ok(points)
}

impl PriceSource for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TradelogicError> {
        let points = match self.read_points(ticker)? {
            Some(points) => points,
            None => return Ok(PriceSeries::empty(ticker)),
        };

        let in_range = points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect();

        PriceSeries::from_unsorted(ticker, in_range)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradelogicError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            TradelogicError::data_source(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| TradelogicError::data_source(format!("directory entry error: {}", e)))?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelogicError> {
        let points = match self.read_points(ticker)? {
            Some(points) if !points.is_empty() => points,
            _ => return Ok(None),
        };

        let series = PriceSeries::from_unsorted(ticker, points)?;
        match (series.first_date(), series.last_date()) {
            (Some(min), Some(max)) => Ok(Some((min, max, series.len()))),
            _ => Ok(None),
        }
    }
}

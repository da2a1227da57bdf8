//! SQLite price source.

use crate::domain::error::TradelogicError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::{ConfigPort, DATE_FORMAT};
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> TradelogicError {
    TradelogicError::data_source(e.to_string())
}

fn query_error(e: rusqlite::Error) -> TradelogicError {
    TradelogicError::data_source(format!("query failed: {}", e))
}

fn parse_date(value: &str) -> Result<NaiveDate, TradelogicError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| TradelogicError::data_source(format!("invalid stored date '{}': {}", value, e)))
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradelogicError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TradelogicError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, TradelogicError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TradelogicError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), TradelogicError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close REAL NOT NULL,
                    PRIMARY KEY (ticker, date)
                );
                CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);",
            )
            .map_err(query_error)
    }

    /// Upsert every point of the series; returns the number of rows written.
    pub fn insert_prices(&self, series: &PriceSeries) -> Result<usize, TradelogicError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for point in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO prices (ticker, date, close) VALUES (?1, ?2, ?3)",
                params![
                    series.ticker(),
                    point.date.format(DATE_FORMAT).to_string(),
                    point.close
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        debug!(ticker = series.ticker(), rows = series.len(), "prices stored");
        Ok(series.len())
    }
}

impl PriceSource for SqliteAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TradelogicError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT date, close FROM prices
                 WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    ticker,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )
            .map_err(query_error)?;

        let mut points = Vec::new();
        for row in rows {
            let (date_str, close) = row.map_err(query_error)?;
            points.push(PricePoint::new(parse_date(&date_str)?, close));
        }

        PriceSeries::new(ticker, points)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradelogicError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM prices ORDER BY ticker")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_error)?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row.map_err(query_error)?);
        }
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelogicError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM prices WHERE ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                Ok(Some((parse_date(&min)?, parse_date(&max)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

//! Price source port trait.

use crate::domain::error::TradelogicError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Daily closes for `ticker` over `[start_date, end_date]`, ascending.
    /// An unknown ticker yields an empty series rather than an error.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TradelogicError>;

    fn list_tickers(&self) -> Result<Vec<String>, TradelogicError>;

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TradelogicError>;
}

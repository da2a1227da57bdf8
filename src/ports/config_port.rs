//! Configuration access port trait.

use chrono::NaiveDate;

use crate::domain::error::TradelogicError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// `YYYY-MM-DD` value, `None` when the key is absent or blank.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, TradelogicError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map(Some)
                .map_err(|_| TradelogicError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: "invalid date format (expected YYYY-MM-DD)".into(),
                }),
            _ => Ok(None),
        }
    }
}

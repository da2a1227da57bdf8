//! Domain error types.

/// Top-level error type for tradelogic.
#[derive(Debug, thiserror::Error)]
pub enum TradelogicError {
    #[error("invalid window: {name} must be at least 1, got {value}")]
    InvalidWindow { name: String, value: i64 },

    #[error("insufficient data for {ticker}: have {observations} prices, need {minimum}")]
    InsufficientData {
        ticker: String,
        observations: usize,
        minimum: usize,
    },

    #[error("invalid price series: {reason}")]
    InvalidPriceSeries { reason: String },

    #[error("price source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown lesson topic: {topic}")]
    UnknownLesson { topic: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradelogicError {
    pub(crate) fn data_source(reason: impl Into<String>) -> Self {
        TradelogicError::DataSource {
            reason: reason.into(),
        }
    }
}

impl From<&TradelogicError> for std::process::ExitCode {
    fn from(err: &TradelogicError) -> Self {
        let code: u8 = match err {
            TradelogicError::Io(_) => 1,
            TradelogicError::ConfigParse { .. }
            | TradelogicError::ConfigMissing { .. }
            | TradelogicError::ConfigInvalid { .. } => 2,
            TradelogicError::DataSource { .. } => 3,
            TradelogicError::InvalidWindow { .. } | TradelogicError::UnknownLesson { .. } => 4,
            TradelogicError::InsufficientData { .. }
            | TradelogicError::InvalidPriceSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

//! Domain error types.

/// Top-level error type for tradesys.
#[derive(Debug, thiserror::Error)]
pub enum TradesysError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("unknown system: {0}")]
    UnknownSystem(String),

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("market series {symbol} is required but was not loaded")]
    MissingMarketSeries { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesysError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TradesysError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TradesysError> for std::process::ExitCode {
    fn from(err: &TradesysError) -> Self {
        let code: u8 = match err {
            TradesysError::Io(_) => 1,
            TradesysError::ConfigParse { .. }
            | TradesysError::ConfigMissing { .. }
            | TradesysError::ConfigInvalid { .. } => 2,
            TradesysError::Data { .. } | TradesysError::Csv(_) => 3,
            TradesysError::UnknownSystem(_) => 4,
            TradesysError::NoData { .. } | TradesysError::MissingMarketSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

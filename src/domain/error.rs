//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for biframe.
///
/// Only hard failures live here. Invalid setups, insufficient capital,
/// insufficient history and zero-variance metrics are ordinary branches of
/// the engine and never surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum BiframeError {
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

    #[error("failed to load data: {reason}")]
    DataLoad { reason: String },

    #[error("no data: {what}")]
    NoData { what: String },

    #[error("missing indicator or price data at {timestamp}")]
    MissingIndicatorData { timestamp: NaiveDateTime },

    #[error("bars out of order at {timestamp}")]
    UnorderedBars { timestamp: NaiveDateTime },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BiframeError> for std::process::ExitCode {
    fn from(err: &BiframeError) -> Self {
        let code: u8 = match err {
            BiframeError::Io(_) => 1,
            BiframeError::ConfigParse { .. }
            | BiframeError::ConfigMissing { .. }
            | BiframeError::ConfigInvalid { .. } => 2,
            BiframeError::DataLoad { .. } | BiframeError::Csv(_) => 3,
            BiframeError::NoData { .. }
            | BiframeError::MissingIndicatorData { .. }
            | BiframeError::UnorderedBars { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

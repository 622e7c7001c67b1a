//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for divtrader.
#[derive(Debug, thiserror::Error)]
pub enum DivtraderError {
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

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("candle series is empty")]
    EmptySeries,

    #[error("candle {index} at {timestamp} is not after its predecessor")]
    UnsortedSeries {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("malformed candle {index}: {reason}")]
    MalformedCandle { index: usize, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DivtraderError> for std::process::ExitCode {
    fn from(err: &DivtraderError) -> Self {
        let code: u8 = match err {
            DivtraderError::Io(_) | DivtraderError::Csv(_) | DivtraderError::Json(_) => 1,
            DivtraderError::ConfigParse { .. }
            | DivtraderError::ConfigMissing { .. }
            | DivtraderError::ConfigInvalid { .. } => 2,
            DivtraderError::Data { .. } => 3,
            DivtraderError::EmptySeries
            | DivtraderError::UnsortedSeries { .. }
            | DivtraderError::MalformedCandle { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_message() {
        let err = DivtraderError::ConfigMissing {
            section: "capital".into(),
            key: "per_trade".into(),
        };
        assert_eq!(err.to_string(), "missing config key [capital] per_trade");
    }

    #[test]
    fn malformed_candle_message() {
        let err = DivtraderError::MalformedCandle {
            index: 7,
            reason: "non-finite value".into(),
        };
        assert_eq!(err.to_string(), "malformed candle 7: non-finite value");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DivtraderError = io.into();
        assert!(matches!(err, DivtraderError::Io(_)));
    }
}

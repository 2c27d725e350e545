//! Domain error types.

/// Top-level error type for madtrader.
#[derive(Debug, thiserror::Error)]
pub enum MadError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error("insufficient data for {code} on {exchange}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        exchange: String,
        bars: usize,
        minimum: usize,
    },

    #[error("weight sink error: {reason}")]
    Sink { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MadError {
    /// Process exit status reported by the CLI for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            MadError::Io(_) => 1,
            MadError::ConfigParse { .. }
            | MadError::ConfigMissing { .. }
            | MadError::ConfigInvalid { .. } => 2,
            MadError::Data { .. } => 3,
            MadError::Sink { .. } => 4,
            MadError::NoData { .. } | MadError::InsufficientData { .. } => 5,
        }
    }
}

impl From<&MadError> for std::process::ExitCode {
    fn from(err: &MadError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_share_exit_code() {
        let missing = MadError::ConfigMissing {
            section: "backtest".into(),
            key: "start_date".into(),
        };
        let invalid = MadError::ConfigInvalid {
            section: "strategy".into(),
            key: "long_period".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(missing.exit_status(), 2);
        assert_eq!(invalid.exit_status(), 2);
    }

    #[test]
    fn insufficient_data_message() {
        let err = MadError::InsufficientData {
            code: "AAPL".into(),
            exchange: "NAS".into(),
            bars: 12,
            minimum: 200,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for AAPL on NAS: have 12 bars, need 200"
        );
        assert_eq!(err.exit_status(), 5);
    }

    #[test]
    fn io_error_converts() {
        let err: MadError = std::io::Error::other("boom").into();
        assert!(matches!(err, MadError::Io(_)));
        assert_eq!(err.exit_status(), 1);
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Invalid aggregation pipeline: {message}")]
    InvalidPipeline { message: String },

    #[error("Malformed query: {message}")]
    MalformedQuery { message: String },

    #[error("Result mapping failed: field '{field}' is missing or has the wrong type")]
    Mapping { field: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Transaction aborted: {message}")]
    Transaction { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StatsError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn invalid_pipeline(message: impl Into<String>) -> Self {
        Self::InvalidPipeline {
            message: message.into(),
        }
    }

    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::MalformedQuery {
            message: message.into(),
        }
    }

    pub fn mapping(field: impl Into<String>) -> Self {
        Self::Mapping {
            field: field.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Soft errors leave the store untouched and can be reported back to the caller as-is.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MalformedQuery { .. } | Self::InvalidArgument { .. } => ErrorSeverity::Low,
            Self::Config { .. } | Self::InvalidConfigValue { .. } => ErrorSeverity::Medium,
            Self::InvalidPipeline { .. }
            | Self::Mapping { .. }
            | Self::Serialization(_)
            | Self::Csv(_) => ErrorSeverity::High,
            Self::Store { .. } | Self::Transaction { .. } | Self::Io(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MalformedQuery { .. } => "Check the filter document is a valid JSON object",
            Self::InvalidArgument { .. } => "Check the command arguments",
            Self::Config { .. } | Self::InvalidConfigValue { .. } => {
                "Check the configuration file values"
            }
            Self::InvalidPipeline { .. } => {
                "Use a smaller distribution interval so at least one bucket is produced"
            }
            Self::Mapping { .. } => "The stored documents do not have the expected shape",
            Self::Transaction { .. } => "No students were removed; run the removal again",
            Self::Store { .. } | Self::Io(_) => "Check the data file exists and is readable",
            Self::Serialization(_) => "Check the data file is valid JSON",
            Self::Csv(_) => "Try a different output format",
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_errors_are_critical() {
        let err = StatsError::transaction("delete failed");
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.to_string(), "Transaction aborted: delete failed");
    }

    #[test]
    fn test_malformed_query_is_soft() {
        let err = StatsError::malformed_query("expected object");
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }
}

use crate::domain::model::SourceFailure;
use thiserror::Error;

/// 單一查詢來源的失敗原因，會被包進 `LookupOutcome` 而不是往上拋
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum CepError {
    #[error("postal code not provided")]
    MissingPostalCode,

    #[error("no source answered within {deadline_ms}ms")]
    Timeout { deadline_ms: u64 },

    #[error("no source could resolve this postal code ({} failure(s))", .failures.len())]
    Unresolved { failures: Vec<SourceFailure> },

    #[error("race stopped on the first response, which failed ({failure})")]
    FirstResponseFailed { failure: SourceFailure },

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Upstream,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CepError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CepError::MissingPostalCode => ErrorCategory::Input,
            CepError::Timeout { .. }
            | CepError::Unresolved { .. }
            | CepError::FirstResponseFailed { .. } => ErrorCategory::Upstream,
            CepError::HttpClientError(_) => ErrorCategory::Upstream,
            CepError::ConfigError { .. }
            | CepError::ConfigValidationError { .. }
            | CepError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CepError::IoError(_) | CepError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 對應到 HTTP 回應狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            CepError::MissingPostalCode => 400,
            CepError::Timeout { .. } => 504,
            CepError::Unresolved { .. }
            | CepError::FirstResponseFailed { .. }
            | CepError::HttpClientError(_) => 502,
            _ => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CepError::MissingPostalCode => "Postal code not provided".to_string(),
            CepError::Timeout { .. } => "Timed out: no lookup service responded in time".to_string(),
            CepError::Unresolved { .. } => {
                "No lookup service could resolve this postal code".to_string()
            }
            CepError::FirstResponseFailed { failure } => format!(
                "Lookup stopped: the first service to answer ({}) failed",
                failure.source
            ),
            CepError::HttpClientError(_) => "Could not initialise the HTTP client".to_string(),
            CepError::ConfigError { .. }
            | CepError::ConfigValidationError { .. }
            | CepError::InvalidConfigValueError { .. } => format!("Invalid configuration: {}", self),
            CepError::IoError(_) | CepError::SerializationError(_) => {
                format!("Internal error: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CepError::MissingPostalCode => "Pass the postal code in the 'cep' query parameter",
            CepError::Timeout { .. } => "Retry later or raise the race timeout",
            CepError::Unresolved { .. } => "Check that the postal code exists and is well formed",
            CepError::FirstResponseFailed { .. } => {
                "Retry, or use the wait-for-success policy to wait for the other services"
            }
            CepError::HttpClientError(_) => "Check the TLS setup of the host",
            CepError::ConfigError { .. }
            | CepError::ConfigValidationError { .. }
            | CepError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags"
            }
            CepError::IoError(_) => "Check that the listen address is free and reachable",
            CepError::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, CepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_unresolved_are_distinct() {
        let timeout = CepError::Timeout { deadline_ms: 1000 };
        let unresolved = CepError::Unresolved { failures: vec![] };

        assert_ne!(timeout.status_code(), unresolved.status_code());
        assert_ne!(
            timeout.user_friendly_message(),
            unresolved.user_friendly_message()
        );
        assert_eq!(timeout.category(), ErrorCategory::Upstream);
    }

    #[test]
    fn test_first_response_failure_names_the_source() {
        let err = CepError::FirstResponseFailed {
            failure: SourceFailure {
                source: "ViaCEP".to_string(),
                error: LookupError::Transport("refused".to_string()),
            },
        };
        let unresolved = CepError::Unresolved { failures: vec![] };

        assert_eq!(err.status_code(), 502);
        assert!(err.user_friendly_message().contains("ViaCEP"));
        assert!(err.user_friendly_message().contains("first"));
        assert_ne!(err.user_friendly_message(), unresolved.user_friendly_message());
    }

    #[test]
    fn test_missing_postal_code_is_client_error() {
        let err = CepError::MissingPostalCode;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_lookup_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(LookupError::from(err), LookupError::Decode(_)));
    }
}

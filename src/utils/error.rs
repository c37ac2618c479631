use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{feature} is unavailable: {variable} is not set")]
    MissingCredential { feature: String, variable: String },

    #[error("{service} returned {status}: {message}")]
    UpstreamError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Could not find coordinates for '{query}'")]
    LocationNotFound { query: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Vector index error: {message}")]
    IndexError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Wizard step error: {message}")]
    WorkflowError { message: String },
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Input,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdvisorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdvisorError::ApiError(_) => ErrorCategory::Network,
            AdvisorError::UpstreamError { .. } => ErrorCategory::Upstream,
            AdvisorError::ConfigError { .. }
            | AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. }
            | AdvisorError::MissingCredential { .. } => ErrorCategory::Configuration,
            AdvisorError::LocationNotFound { .. }
            | AdvisorError::InvalidRequest { .. }
            | AdvisorError::WorkflowError { .. } => ErrorCategory::Input,
            AdvisorError::CsvError(_)
            | AdvisorError::SerializationError(_)
            | AdvisorError::IndexError { .. }
            | AdvisorError::ProcessingError { .. } => ErrorCategory::Data,
            AdvisorError::ZipError(_) | AdvisorError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            AdvisorError::ApiError(e) if e.is_timeout() => {
                "An external service took too long to respond".to_string()
            }
            AdvisorError::ApiError(_) => "Could not reach an external service".to_string(),
            AdvisorError::UpstreamError {
                service, status, ..
            } => match status {
                401 | 403 => format!("{} rejected the API key", service),
                429 => format!("{} rate limit exceeded", service),
                _ => format!("{} returned an error ({})", service, status),
            },
            AdvisorError::MissingCredential { feature, variable } => {
                format!("{} needs {} to be configured", feature, variable)
            }
            AdvisorError::LocationNotFound { query } => {
                format!("Could not find coordinates for '{}'", query)
            }
            AdvisorError::IndexError { .. } => "The grant search index is unavailable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AdvisorError::ApiError(_) => "Check your network connection and try again",
            AdvisorError::UpstreamError { status: 401, .. }
            | AdvisorError::UpstreamError { status: 403, .. } => {
                "Verify the API key in your configuration or environment"
            }
            AdvisorError::UpstreamError { status: 429, .. } => {
                "Wait for the provider quota to reset before retrying"
            }
            AdvisorError::UpstreamError { .. } => "The provider may be degraded; retry later",
            AdvisorError::MissingCredential { .. } => {
                "Export the API key or add it to advisor.toml"
            }
            AdvisorError::ConfigError { .. }
            | AdvisorError::ConfigValidationError { .. }
            | AdvisorError::InvalidConfigValueError { .. } => {
                "Review advisor.toml against the documented sections"
            }
            AdvisorError::LocationNotFound { .. } => {
                "Try a more specific place name (e.g. 'Ames, Iowa') or pass coordinates"
            }
            AdvisorError::InvalidRequest { .. } => "Correct the request fields and resubmit",
            AdvisorError::WorkflowError { .. } => "Complete the previous wizard step first",
            AdvisorError::IndexError { .. } => {
                "Run `farm-advisor grants build-index` to rebuild the grant index"
            }
            AdvisorError::CsvError(_)
            | AdvisorError::SerializationError(_)
            | AdvisorError::ProcessingError { .. } => "Inspect the input data for malformed records",
            AdvisorError::ZipError(_) | AdvisorError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_not_found_is_a_client_error() {
        let err = AdvisorError::LocationNotFound {
            query: "Atlantis".to_string(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().contains("Atlantis"));
    }

    #[test]
    fn missing_credential_is_configuration() {
        let err = AdvisorError::MissingCredential {
            feature: "Market prediction".to_string(),
            variable: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Market prediction is unavailable: OPENAI_API_KEY is not set"
        );
    }

    #[test]
    fn rate_limit_has_specific_advice() {
        let err = AdvisorError::UpstreamError {
            service: "Brave Search".to_string(),
            status: 429,
            message: "quota".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Brave Search rate limit exceeded");
        assert!(err.recovery_suggestion().contains("quota"));
    }
}

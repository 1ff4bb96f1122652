use crate::adapters::browser::BrowserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    BrowserError(#[from] BrowserError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
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

impl CaptureError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptureError::ConfigError { .. }
            | CaptureError::InvalidConfigValueError { .. }
            | CaptureError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CaptureError::HttpError(_) | CaptureError::BrowserError(_) => ErrorCategory::Network,
            CaptureError::SerializationError(_) | CaptureError::ValidationError { .. } => {
                ErrorCategory::Data
            }
            CaptureError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CaptureError::HttpError(_) => {
                "Check that the browser was started with --remote-debugging-port and the DevTools URL is reachable"
            }
            CaptureError::BrowserError(_) => {
                "Make sure a page target is open in the browser and retry"
            }
            CaptureError::IoError(_) => "Check that the input file exists and the output path is writable",
            CaptureError::SerializationError(_) => {
                "Check that the capture record is valid JSON"
            }
            CaptureError::ConfigError { .. }
            | CaptureError::InvalidConfigValueError { .. }
            | CaptureError::MissingConfigError { .. } => {
                "Review the configuration file and command line flags"
            }
            CaptureError::ValidationError { .. } => "Fix the reported value and run again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not talk to the browser: {}", self),
            ErrorCategory::Data => format!("Capture data problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = CaptureError::MissingConfigError {
            field: "capture.input".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("capture.input"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = CaptureError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}

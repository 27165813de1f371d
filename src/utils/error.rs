use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Remote service returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Spreadsheet '{name}' not found")]
    SpreadsheetNotFound { name: String },

    #[error("Worksheet '{worksheet}' not found")]
    WorksheetNotFound { worksheet: String },

    #[error("Worksheet '{worksheet}' has no rows")]
    EmptyWorksheet { worksheet: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Token signing failed: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Row in worksheet '{worksheet}' has {found} values, expected {expected}")]
    RecordShape {
        worksheet: String,
        expected: usize,
        found: usize,
    },

    #[error("Cell '{value}' in worksheet '{worksheet}' is not an integer")]
    InvalidCell { worksheet: String, value: String },

    #[error("Surplus for item {item} overflows: stock {stock} minus sales {sales}")]
    SurplusOverflow { item: usize, stock: i64, sales: i64 },

    #[error("Input closed before valid sales data was entered")]
    InputClosed,

    #[error("No valid sales data after {attempts} attempts")]
    AttemptsExhausted { attempts: usize },
}

/// Reasons operator input is rejected. These never leave the prompt loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid literal for int: '{value}'")]
    NotAnInteger { value: String },

    #[error("Exactly {expected} values must be entered. You provided {found}")]
    WrongCount { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Data,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SheetsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SheetsError::ApiError(_)
            | SheetsError::RemoteStatus { .. }
            | SheetsError::SpreadsheetNotFound { .. }
            | SheetsError::WorksheetNotFound { .. } => ErrorCategory::Network,
            SheetsError::AuthError { .. } | SheetsError::TokenError(_) => {
                ErrorCategory::Authentication
            }
            SheetsError::ConfigError { .. }
            | SheetsError::ConfigValidationError { .. }
            | SheetsError::InvalidConfigValueError { .. }
            | SheetsError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SheetsError::EmptyWorksheet { .. }
            | SheetsError::RecordShape { .. }
            | SheetsError::InvalidCell { .. }
            | SheetsError::SurplusOverflow { .. }
            | SheetsError::CsvError(_)
            | SheetsError::SerializationError(_) => ErrorCategory::Data,
            SheetsError::InputClosed | SheetsError::AttemptsExhausted { .. } => {
                ErrorCategory::Input
            }
            SheetsError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Authentication
            | ErrorCategory::Configuration
            | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SheetsError::ApiError(_) | SheetsError::RemoteStatus { .. } => {
                "Could not talk to the spreadsheet service".to_string()
            }
            SheetsError::SpreadsheetNotFound { name } => {
                format!("The spreadsheet '{}' could not be found", name)
            }
            SheetsError::WorksheetNotFound { worksheet } => {
                format!("The worksheet '{}' does not exist", worksheet)
            }
            SheetsError::AuthError { .. } | SheetsError::TokenError(_) => {
                "Could not sign in to the spreadsheet service".to_string()
            }
            SheetsError::InputClosed | SheetsError::AttemptsExhausted { .. } => {
                "No sales data was recorded".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check the network connection and that the spreadsheet and worksheets exist and are shared with the service account"
            }
            ErrorCategory::Authentication => {
                "Check the service account key file or access token and the configured scopes"
            }
            ErrorCategory::Configuration => "Review the configuration file and fix the reported field",
            ErrorCategory::Data => {
                "Check that the latest stock row holds six whole numbers; the sales row may need manual reconciliation"
            }
            ErrorCategory::Input => "Run the command again and enter six comma-separated numbers",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_messages() {
        let err = InputError::WrongCount {
            expected: 6,
            found: 5,
        };
        assert_eq!(
            err.to_string(),
            "Exactly 6 values must be entered. You provided 5"
        );

        let err = InputError::NotAnInteger {
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "invalid literal for int: 'abc'");
    }

    #[test]
    fn test_severity_drives_exit_code() {
        let remote = SheetsError::RemoteStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(remote.category(), ErrorCategory::Network);
        assert_eq!(remote.exit_code(), 2);

        let config = SheetsError::MissingConfigError {
            field: "spreadsheet.id".to_string(),
        };
        assert_eq!(config.severity(), ErrorSeverity::Critical);
        assert_eq!(config.exit_code(), 3);

        let shape = SheetsError::RecordShape {
            worksheet: "stock".to_string(),
            expected: 6,
            found: 5,
        };
        assert_eq!(shape.category(), ErrorCategory::Data);
        assert_eq!(shape.exit_code(), 1);
    }

    #[test]
    fn test_user_friendly_message_names_worksheet() {
        let err = SheetsError::WorksheetNotFound {
            worksheet: "surplus".to_string(),
        };
        assert!(err.user_friendly_message().contains("surplus"));
    }
}

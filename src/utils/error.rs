use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to read file '{file}': {message}")]
    FileReadError { file: String, message: String },

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

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::FileReadError { .. } | EtlError::CsvError(_) => ErrorCategory::Input,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ProcessingError { .. } | EtlError::SerializationError(_) => {
                ErrorCategory::Processing
            }
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一檔案讀取失敗只跳過該檔案
            EtlError::FileReadError { .. } => ErrorSeverity::Low,
            EtlError::CsvError(_) => ErrorSeverity::Medium,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FileReadError { .. } | EtlError::CsvError(_) => {
                "Check that the file is a Latin-1 CSV separated by ',' or ';' with a header row"
            }
            EtlError::IoError(_) => "Check that the paths exist and are readable/writable",
            EtlError::SerializationError(_) => "Check the run summary contents",
            EtlError::ConfigError { .. } | EtlError::ConfigValidationError { .. } => {
                "Check the configuration file syntax and sections"
            }
            EtlError::InvalidConfigValueError { .. } => {
                "Fix the highlighted parameter and run again"
            }
            EtlError::MissingConfigError { .. } => "Provide the missing parameter",
            EtlError::ProcessingError { .. } => "Inspect the input data for unexpected values",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::FileReadError { file, .. } => format!("Could not read file {}", file),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid parameter {}: {}", field, reason)
            }
            EtlError::MissingConfigError { field } => format!("Missing parameter: {}", field),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
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

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Dataset error: {message}")]
    DatasetError { message: String },

    #[error("Column '{column}' not found in the dataset (available: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("Column '{column}' is not numerical")]
    ColumnNotNumeric { column: String },

    #[error("LLM API returned {status}: {message}")]
    LlmApiError { status: u16, message: String },

    #[error("Unexpected LLM response: {message}")]
    LlmResponseError { message: String },

    #[error("Agent error: {message}")]
    AgentError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Network,
    Llm,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnalyticsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalyticsError::ConfigError { .. }
            | AnalyticsError::MissingConfigError { .. }
            | AnalyticsError::InvalidConfigValueError { .. }
            | AnalyticsError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            AnalyticsError::CsvError(_)
            | AnalyticsError::DatasetError { .. }
            | AnalyticsError::ColumnNotFound { .. }
            | AnalyticsError::ColumnNotNumeric { .. }
            | AnalyticsError::ValidationError { .. }
            | AnalyticsError::ProcessingError { .. } => ErrorCategory::Data,
            AnalyticsError::ApiError(_) => ErrorCategory::Network,
            AnalyticsError::LlmApiError { .. }
            | AnalyticsError::LlmResponseError { .. }
            | AnalyticsError::AgentError { .. } => ErrorCategory::Llm,
            AnalyticsError::ZipError(_)
            | AnalyticsError::IoError(_)
            | AnalyticsError::SerializationError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 使用者輸入錯誤，修正後重跑即可
            AnalyticsError::ColumnNotFound { .. }
            | AnalyticsError::ColumnNotNumeric { .. }
            | AnalyticsError::ValidationError { .. } => ErrorSeverity::High,
            AnalyticsError::ApiError(_) | AnalyticsError::LlmResponseError { .. } => {
                ErrorSeverity::Medium
            }
            AnalyticsError::LlmApiError { status, .. } => {
                if *status == 429 || *status >= 500 {
                    ErrorSeverity::Medium
                } else {
                    ErrorSeverity::High
                }
            }
            AnalyticsError::AgentError { .. } => ErrorSeverity::Medium,
            AnalyticsError::CsvError(_)
            | AnalyticsError::DatasetError { .. }
            | AnalyticsError::ProcessingError { .. } => ErrorSeverity::High,
            AnalyticsError::ConfigError { .. }
            | AnalyticsError::MissingConfigError { .. }
            | AnalyticsError::InvalidConfigValueError { .. }
            | AnalyticsError::ConfigValidationError { .. } => ErrorSeverity::High,
            AnalyticsError::ZipError(_)
            | AnalyticsError::IoError(_)
            | AnalyticsError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// 可重試的錯誤：網路問題、限流與伺服器端錯誤
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalyticsError::ApiError(e) => e.is_timeout() || e.is_connect(),
            AnalyticsError::LlmApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AnalyticsError::MissingConfigError { field } if field == "GOOGLE_API_KEY" => {
                "Add GOOGLE_API_KEY=\"...\" to a .env file, export it, or pass --api-key"
                    .to_string()
            }
            AnalyticsError::MissingConfigError { field } => {
                format!("Provide a value for '{}' in the config file or on the command line", field)
            }
            AnalyticsError::InvalidConfigValueError { field, .. }
            | AnalyticsError::ConfigValidationError { field, .. } => {
                format!("Check the '{}' setting in your configuration", field)
            }
            AnalyticsError::ConfigError { .. } => {
                "Check that the configuration file exists and is valid TOML".to_string()
            }
            AnalyticsError::CsvError(_) | AnalyticsError::DatasetError { .. } => {
                "Make sure the input is a well-formed CSV file with a header row".to_string()
            }
            AnalyticsError::ColumnNotFound { available, .. } => {
                format!("Pick one of the available columns: {}", available.join(", "))
            }
            AnalyticsError::ColumnNotNumeric { .. } => {
                "What-if scenarios and numeric charts require a numerical column".to_string()
            }
            AnalyticsError::ValidationError { .. } => {
                "Adjust the command arguments and try again".to_string()
            }
            AnalyticsError::ProcessingError { .. } => {
                "Inspect the affected column; it may contain no usable values".to_string()
            }
            AnalyticsError::ApiError(_) => {
                "Check your network connection and the LLM base URL, then retry".to_string()
            }
            AnalyticsError::LlmApiError { status, .. } => match status {
                400 => "The request was rejected; check the model name".to_string(),
                401 | 403 => "Verify that GOOGLE_API_KEY is valid".to_string(),
                429 => "Rate limited by the provider; wait a moment and retry".to_string(),
                _ => "The provider reported an error; retry later".to_string(),
            },
            AnalyticsError::LlmResponseError { .. } | AnalyticsError::AgentError { .. } => {
                "Retry the request, or rephrase the prompt".to_string()
            }
            AnalyticsError::ZipError(_) | AnalyticsError::IoError(_) => {
                "Check that the output directory is writable".to_string()
            }
            AnalyticsError::SerializationError(_) => {
                "This is likely a bug; run with --verbose and report it".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Llm => format!("AI provider problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
        }
    }

    /// 依嚴重程度決定 CLI 退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

use thiserror::Error;

/// Main error type for the explorer address API
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Must include address")]
    MissingAddress,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Missing parameters (expected \"address\", \"signature\" and \"message\")")]
    MissingParameter,

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Unexpected error: {0}")]
    VerificationError(String),

    #[error("{0}")]
    IndexQueryFailed(#[from] IndexError),

    #[error("Transaction {txid} could not be transformed: {message}")]
    TransformationFailed { txid: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reported by the indexing service or the transport in front of it
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Index error code for "no information available about address or transaction".
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

impl IndexError {
    /// Code reported by the index, if the failure came from the index itself
    pub fn code(&self) -> Option<i64> {
        match self {
            IndexError::Method { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the index answered with its "entity not found" sentinel
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(RPC_INVALID_ADDRESS_OR_KEY)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that require immediate attention
    Critical,
    /// High priority errors that affect functionality
    High,
    /// Medium priority errors, usually a bad upstream answer
    Medium,
    /// Caller mistakes, mostly informational
    Low,
}

impl ExplorerError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ExplorerError::Config(_) => ErrorSeverity::Critical,

            ExplorerError::IndexQueryFailed(IndexError::Connection(_)) => ErrorSeverity::High,
            ExplorerError::IndexQueryFailed(IndexError::Http(_)) => ErrorSeverity::High,
            ExplorerError::IndexQueryFailed(IndexError::Timeout { .. }) => ErrorSeverity::High,

            ExplorerError::IndexQueryFailed(_) => ErrorSeverity::Medium,
            ExplorerError::TransformationFailed { .. } => ErrorSeverity::Medium,

            ExplorerError::MissingAddress
            | ExplorerError::InvalidAddress(_)
            | ExplorerError::MissingParameter
            | ExplorerError::InvalidParameter { .. }
            | ExplorerError::VerificationError(_) => ErrorSeverity::Low,
        }
    }

    /// Code exposed in the error body; validation failures use 1, index failures keep their own
    pub fn code(&self) -> Option<i64> {
        match self {
            ExplorerError::MissingAddress
            | ExplorerError::InvalidAddress(_)
            | ExplorerError::MissingParameter
            | ExplorerError::InvalidParameter { .. }
            | ExplorerError::VerificationError(_) => Some(1),
            ExplorerError::IndexQueryFailed(e) => e.code(),
            ExplorerError::TransformationFailed { .. } | ExplorerError::Config(_) => None,
        }
    }

    pub fn invalid_parameter(name: &str, value: &str) -> Self {
        ExplorerError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

//! Dispatch Error Types
//!
//! Error hierarchy for request dispatch and credential handling. Every failure
//! of a dispatched request reaches the caller through its listener, so these
//! types are what a listener sees in `TaskOutcome::Failure`.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the dispatch layer.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DispatchError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "DISPATCH_CONFIG",
            Self::Credential(_) => "DISPATCH_CREDENTIAL",
            Self::Signing(_) => "DISPATCH_SIGNING",
            Self::Network(_) => "DISPATCH_NETWORK",
            Self::Protocol(_) => "DISPATCH_PROTOCOL",
            Self::Storage(_) => "DISPATCH_STORAGE",
        }
    }

    /// Check whether the server produced an answer for this failure.
    ///
    /// Signing and network failures mean the request never reached the
    /// server; protocol failures mean it responded unexpectedly.
    pub fn reached_server(&self) -> bool {
        match self {
            Self::Protocol(e) => e.reached_server(),
            _ => false,
        }
    }

    /// Check if error is retryable.
    ///
    /// The dispatch layer never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Protocol(ProtocolError::ErrorStatus { status, .. }) => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    /// Check if the caller has to provision a new credential.
    pub fn needs_reprovisioning(&self) -> bool {
        match self {
            Self::Credential(_) => true,
            Self::Signing(SigningError::InvalidCredential { .. }) => true,
            Self::Protocol(ProtocolError::ErrorStatus { status: 401, .. }) => true,
            _ => false,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("No async runtime available: {message}")]
    RuntimeUnavailable { message: String },
}

/// Malformed or unusable credential.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential data is invalid for token: {name}")]
    InvalidData { name: String },
}

/// Signing step error. The request was never transmitted.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Credential for token '{name}' is not valid for signing")]
    InvalidCredential { name: String },

    #[error("Signature could not be computed: {message}")]
    SignatureFailed { message: String },

    #[error("Missing signing factor: {factor}")]
    MissingFactor { factor: String },
}

/// Network/transport error. No response was received.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS error: {message}")]
    TlsError { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TlsError { .. } | Self::InvalidRequest { .. })
    }
}

/// Protocol error: request encoding or response mapping failed.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Request payload could not be encoded: {message}")]
    RequestEncoding { message: String },

    #[error("Server responded with HTTP {status}")]
    ErrorStatus {
        status: u16,
        error: Option<ErrorResponse>,
    },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },
}

impl ProtocolError {
    /// Check whether this error carries an answer from the server.
    pub fn reached_server(&self) -> bool {
        !matches!(self, Self::RequestEncoding { .. })
    }
}

/// Credential storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Error body returned by the authentication server.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &[u8]) -> Option<ErrorResponse> {
    serde_json::from_slice(body).ok()
}

/// Create error from a non-success HTTP response.
pub fn create_error_from_response(status: u16, body: &[u8]) -> DispatchError {
    DispatchError::Protocol(ProtocolError::ErrorStatus {
        status,
        error: parse_error_response(body),
    })
}

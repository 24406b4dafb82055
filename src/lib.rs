//! Auth Dispatch
//!
//! Client-side request dispatch and access-token persistence for a mobile
//! authentication SDK.
//!
//! # Features
//!
//! - Asynchronous, cancelable requests with exactly one outcome per request
//! - Serial lane for endpoints that must not overlap, concurrent lane for the rest
//! - Optional request signing through a pluggable crypto helper
//! - Validated access-token data with a compact storage encoding
//! - Token cache with atomic replacement backed by pluggable credential storage
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auth_dispatch::{client_configuration, Endpoint, HttpClient, TaskOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = client_configuration()
//!         .base_url("https://auth.example.com/enrollment-server")
//!         .build()?;
//!     let client = HttpClient::new(config)?;
//!
//!     let endpoint: Endpoint<serde_json::Value> =
//!         Endpoint::new("/pa/v3/activation/status").synchronized();
//!
//!     let handle = client.post_unsigned(
//!         Some(&serde_json::json!({ "activationId": "..." })),
//!         endpoint,
//!         crypto_helper(),
//!         |outcome: TaskOutcome<serde_json::Value>| match outcome {
//!             TaskOutcome::Success(status) => println!("status: {}", status),
//!             TaskOutcome::Failure(error) => eprintln!("failed: {}", error),
//!             TaskOutcome::Canceled => {}
//!         },
//!     );
//!
//!     // Later, if the result is no longer needed:
//!     handle.cancel();
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: Endpoint, authentication and configuration types
//! - `error`: Error hierarchy
//! - `core`: Collaborators (HTTP transport, crypto helper)
//! - `token`: Token data and its persistence
//! - `dispatch`: Lanes, request helper and request task
//! - `builders`: Fluent builders for configuration
//! - `client`: Dispatch facade

pub mod builders;
pub mod client;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod token;
pub mod types;

// Re-export main client
pub use client::HttpClient;

// Re-export builders
pub use builders::{client_configuration, ClientConfigurationBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, parse_error_response, ConfigurationError, CredentialError,
    DispatchError, DispatchResult, ErrorResponse, NetworkError, ProtocolError, SigningError,
    StorageError,
};

// Re-export types
pub use types::{
    // Auth
    Authentication, SignatureFactors,
    // Config
    ClientConfiguration,
    // Endpoint
    Endpoint, EndpointDefinition,
};

// Re-export core components
pub use crate::core::{
    // Crypto
    AuthorizationHeader, CryptoHelper, SignatureRequest,
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
};

// Re-export token management
pub use token::{
    CredentialStorage, InMemoryCredentialStorage, MockCredentialStorage, PrivateTokenData,
    TokenStore, SECRET_LENGTH,
};

// Re-export dispatch
pub use dispatch::{
    listener_channel, CancelHandle, ExecutionLane, Lanes, ResponseListener, TaskOutcome,
    TaskState,
};

//! Token Management
//!
//! Access token data and its persistence.
//!
//! This module provides:
//!
//! - **Token Data**: Validated private token data and its storage encoding
//! - **Token Store**: Credential storage backends and the in-memory token cache

pub mod data;
pub mod store;

// Token Data
pub use data::{PrivateTokenData, SECRET_LENGTH};

// Token Store
pub use store::{
    CredentialStorage, InMemoryCredentialStorage, MockCredentialStorage, TokenStore,
    DEFAULT_KEY_PREFIX,
};

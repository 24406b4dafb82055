//! Dispatch Types
//!
//! Type definitions for endpoints, authentication and configuration.

pub mod auth;
pub mod config;
pub mod endpoint;

pub use auth::*;
pub use config::*;
pub use endpoint::*;

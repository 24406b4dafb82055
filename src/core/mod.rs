//! Core Components
//!
//! Collaborators the dispatch layer talks to: the HTTP transport and the
//! crypto helper that signs requests.

pub mod crypto;
pub mod transport;

pub use crypto::*;
pub use transport::*;

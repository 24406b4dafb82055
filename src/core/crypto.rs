//! Crypto Helper
//!
//! Signing capability consumed by the dispatch layer. The signature algorithm
//! lives behind this trait; requests only ever see the resulting header.

use async_trait::async_trait;

use crate::core::HttpMethod;
use crate::error::DispatchError;
use crate::types::Authentication;

/// Data covered by a request signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRequest {
    /// HTTP method of the request.
    pub method: HttpMethod,
    /// URI identifier of the endpoint.
    pub uri_id: String,
    /// Exact request body bytes.
    pub body: Vec<u8>,
}

/// Authorization header produced by signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationHeader {
    /// Header name.
    pub key: String,
    /// Header value.
    pub value: String,
}

impl AuthorizationHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Produces signed envelopes for outgoing requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CryptoHelper: Send + Sync {
    /// Compute the authorization header for a request.
    async fn authorization_header(
        &self,
        request: &SignatureRequest,
        authentication: &Authentication,
    ) -> Result<AuthorizationHeader, DispatchError>;
}

//! Endpoint Types
//!
//! Definitions of REST endpoints served by the authentication server.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::core::HttpMethod;

/// Definition of a server endpoint.
///
/// The associated `Response` is the typed object a successful response body
/// is decoded into.
pub trait EndpointDefinition: Send + Sync + 'static {
    /// Typed response produced by this endpoint.
    type Response: DeserializeOwned + Send + 'static;

    /// Path appended to the configured base URL.
    fn relative_path(&self) -> &str;

    /// HTTP method used for the request.
    fn http_method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    /// URI identifier covered by the request signature.
    ///
    /// Endpoints that do not provide one are signed with their relative path.
    fn authorization_uri_id(&self) -> Option<&str> {
        None
    }

    /// Whether calls to this endpoint must not overlap with other
    /// synchronized calls.
    fn is_synchronized(&self) -> bool {
        false
    }
}

/// Generic endpoint definition.
pub struct Endpoint<R> {
    relative_path: String,
    method: HttpMethod,
    authorization_uri_id: Option<String>,
    synchronized: bool,
    _response: PhantomData<fn() -> R>,
}

impl<R> Endpoint<R> {
    /// Create a POST endpoint for a relative path.
    pub fn new(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            method: HttpMethod::Post,
            authorization_uri_id: None,
            synchronized: false,
            _response: PhantomData,
        }
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the URI identifier used for signing.
    pub fn authorization_uri_id(mut self, uri_id: impl Into<String>) -> Self {
        self.authorization_uri_id = Some(uri_id.into());
        self
    }

    /// Require calls to run on the serial lane.
    pub fn synchronized(mut self) -> Self {
        self.synchronized = true;
        self
    }
}

impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            relative_path: self.relative_path.clone(),
            method: self.method,
            authorization_uri_id: self.authorization_uri_id.clone(),
            synchronized: self.synchronized,
            _response: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("relative_path", &self.relative_path)
            .field("method", &self.method)
            .field("authorization_uri_id", &self.authorization_uri_id)
            .field("synchronized", &self.synchronized)
            .finish()
    }
}

impl<R> EndpointDefinition for Endpoint<R>
where
    R: DeserializeOwned + Send + 'static,
{
    type Response = R;

    fn relative_path(&self) -> &str {
        &self.relative_path
    }

    fn http_method(&self) -> HttpMethod {
        self.method
    }

    fn authorization_uri_id(&self) -> Option<&str> {
        self.authorization_uri_id.as_deref()
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized
    }
}

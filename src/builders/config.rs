//! Configuration Builder
//!
//! Fluent builder for HTTP client configuration.

use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::dispatch::validate_max_concurrent;
use crate::error::{ConfigurationError, DispatchError};
use crate::types::{ClientConfiguration, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT};

/// Client configuration builder.
#[derive(Default)]
pub struct ClientConfigurationBuilder {
    base_url: Option<String>,
    timeout: Duration,
    max_response_size: usize,
    user_agent: Option<String>,
    custom_headers: HashMap<String, String>,
    max_concurrent_requests: Option<usize>,
    allow_unsecured_connection: bool,
}

impl ClientConfigurationBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            ..Default::default()
        }
    }

    /// Set base URL of the server REST API.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum response body size.
    pub fn max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Set user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn add_custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers
            .insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Bound the number of requests running at once on the concurrent lane.
    pub fn max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = Some(limit);
        self
    }

    /// Allow or refuse plain `http` base URLs.
    pub fn allow_unsecured_connection(mut self, allow: bool) -> Self {
        self.allow_unsecured_connection = allow;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> Result<ClientConfiguration, DispatchError> {
        let base_url = self.base_url.ok_or_else(|| {
            DispatchError::Configuration(ConfigurationError::MissingRequired {
                field: "base_url".to_string(),
            })
        })?;

        let parsed = Url::parse(&base_url).map_err(|_| {
            DispatchError::Configuration(ConfigurationError::InvalidBaseUrl {
                url: base_url.clone(),
            })
        })?;

        match parsed.scheme() {
            "https" => {}
            "http" if self.allow_unsecured_connection => {}
            _ => {
                return Err(DispatchError::Configuration(
                    ConfigurationError::InvalidBaseUrl { url: base_url },
                ))
            }
        }

        if self.timeout.is_zero() {
            return Err(DispatchError::Configuration(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }));
        }

        validate_max_concurrent(self.max_concurrent_requests)?;

        Ok(ClientConfiguration {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
            max_response_size: self.max_response_size,
            user_agent: self.user_agent,
            custom_headers: self.custom_headers,
            max_concurrent_requests: self.max_concurrent_requests,
            allow_unsecured_connection: self.allow_unsecured_connection,
        })
    }
}

/// Create a new client configuration builder.
pub fn client_configuration() -> ClientConfigurationBuilder {
    ClientConfigurationBuilder::new()
}

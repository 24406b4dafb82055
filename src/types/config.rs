//! Configuration Types
//!
//! HTTP client configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default limit of a response body, in bytes.
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// HTTP client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfiguration {
    /// Base URL of the authentication server REST API, without trailing `/`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum accepted response body size.
    pub max_response_size: usize,
    /// Value of the `user-agent` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Headers added to every request.
    pub custom_headers: HashMap<String, String>,
    /// Upper bound of requests running at once on the concurrent lane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<usize>,
    /// Allow plain `http` base URLs.
    pub allow_unsecured_connection: bool,
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            user_agent: None,
            custom_headers: HashMap::new(),
            max_concurrent_requests: None,
            allow_unsecured_connection: false,
        }
    }
}

impl ClientConfiguration {
    /// Full URL of an endpoint path.
    pub fn endpoint_url(&self, relative_path: &str) -> String {
        if relative_path.starts_with('/') {
            format!("{}{}", self.base_url, relative_path)
        } else {
            format!("{}/{}", self.base_url, relative_path)
        }
    }
}

//! Request Helper
//!
//! Turns a payload, an endpoint and an optional authentication descriptor
//! into an HTTP request, and a raw response back into the typed response.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::core::{CryptoHelper, HttpRequest, HttpResponse, SignatureRequest};
use crate::error::{create_error_from_response, DispatchError, ProtocolError, SigningError};
use crate::types::{Authentication, ClientConfiguration, EndpointDefinition};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Request data prepared at dispatch time.
pub struct RequestHelper<E: EndpointDefinition> {
    body: Result<Vec<u8>, String>,
    endpoint: E,
    authentication: Option<Authentication>,
}

impl<E: EndpointDefinition> RequestHelper<E> {
    /// Encode the payload and keep the inputs for later.
    ///
    /// Encoding failures are kept and reported when the request is built.
    pub fn new<Q: Serialize>(
        payload: Option<&Q>,
        endpoint: E,
        authentication: Option<Authentication>,
    ) -> Self {
        let body = match payload {
            Some(payload) => serde_json::to_vec(payload).map_err(|e| e.to_string()),
            None => Ok(Vec::new()),
        };
        Self {
            body,
            endpoint,
            authentication,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.authentication.is_some()
    }

    fn body(&self) -> Result<&[u8], DispatchError> {
        self.body.as_deref().map_err(|message| {
            DispatchError::Protocol(ProtocolError::RequestEncoding {
                message: message.clone(),
            })
        })
    }

    fn base_headers(&self, config: &ClientConfiguration) -> HashMap<String, String> {
        let mut headers = config.custom_headers.clone();
        headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        headers.insert("accept".to_string(), JSON_CONTENT_TYPE.to_string());
        if let Some(user_agent) = &config.user_agent {
            headers.insert("user-agent".to_string(), user_agent.clone());
        }
        headers
    }

    /// Build the HTTP request, signing it when authentication is present.
    pub async fn build_request(
        &self,
        config: &ClientConfiguration,
        helper: &dyn CryptoHelper,
    ) -> Result<HttpRequest, DispatchError> {
        let body = self.body()?;
        let mut headers = self.base_headers(config);

        if let Some(authentication) = &self.authentication {
            if let Some(token) = &authentication.credential {
                if !token.is_valid() {
                    return Err(DispatchError::Signing(SigningError::InvalidCredential {
                        name: token.name().to_string(),
                    }));
                }
            }

            let uri_id = self
                .endpoint
                .authorization_uri_id()
                .unwrap_or_else(|| self.endpoint.relative_path())
                .to_string();
            let signature_request = SignatureRequest {
                method: self.endpoint.http_method(),
                uri_id,
                body: body.to_vec(),
            };

            let header = helper
                .authorization_header(&signature_request, authentication)
                .await?;
            debug!(
                factors = %authentication.factors.label(),
                header = %header.key,
                "Request signed"
            );
            headers.insert(header.key.to_lowercase(), header.value);
        }

        Ok(HttpRequest {
            method: self.endpoint.http_method(),
            url: config.endpoint_url(self.endpoint.relative_path()),
            headers,
            body: (!body.is_empty()).then(|| body.to_vec()),
            timeout: Some(config.timeout),
        })
    }

    /// Map a raw response into the endpoint's typed response.
    pub fn map_response(&self, response: HttpResponse) -> Result<E::Response, DispatchError> {
        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &response.body
        };

        serde_json::from_slice(body).map_err(|e| {
            DispatchError::Protocol(ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })
    }
}

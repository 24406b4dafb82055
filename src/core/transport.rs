//! HTTP Transport
//!
//! HTTP client interface and implementations used to reach the server.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{DispatchError, NetworkError, ProtocolError};
use crate::types::DEFAULT_MAX_RESPONSE_SIZE;

/// HTTP request definition.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// HTTP response definition.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError>;
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
    max_response_size: usize,
}

impl ReqwestHttpTransport {
    /// Create new transport with default settings.
    pub fn new() -> Result<Self, DispatchError> {
        Self::with_options(crate::types::DEFAULT_TIMEOUT, DEFAULT_MAX_RESPONSE_SIZE)
    }

    /// Create transport with custom options.
    pub fn with_options(timeout: Duration, max_response_size: usize) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                DispatchError::Network(NetworkError::TlsError {
                    message: e.to_string(),
                })
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
            max_response_size,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        req_builder = req_builder.timeout(timeout);

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Network(NetworkError::Timeout { timeout })
            } else if e.is_builder() {
                DispatchError::Network(NetworkError::InvalidRequest {
                    message: e.to_string(),
                })
            } else {
                DispatchError::Network(NetworkError::ConnectionFailed {
                    message: e.to_string(),
                })
            }
        })?;

        let status = response.status().as_u16();

        if (300..400).contains(&status) {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            return Err(DispatchError::Protocol(ProtocolError::UnexpectedRedirect {
                location,
            }));
        }

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string().to_lowercase(), v.to_string());
            }
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_response_size {
                return Err(DispatchError::Protocol(ProtocolError::ResponseTooLarge {
                    size: len as usize,
                }));
            }
        }

        let body = response.bytes().await.map_err(|e| {
            DispatchError::Network(NetworkError::ConnectionFailed {
                message: e.to_string(),
            })
        })?;

        if body.len() > self.max_response_size {
            return Err(DispatchError::Protocol(ProtocolError::ResponseTooLarge {
                size: body.len(),
            }));
        }

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Mock HTTP transport for testing.
///
/// Queued results are returned in FIFO order.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, DispatchError>>>,
    request_history: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<HttpResponse>>,
    delay: Mutex<Option<Duration>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response<T: serde::Serialize>(&self, status: u16, body: &T) -> &Self {
        let response = HttpResponse {
            status,
            headers: [("content-type".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            body: serde_json::to_vec(body).unwrap_or_default(),
        };
        self.queue_response(response)
    }

    /// Queue an error to return.
    pub fn queue_error(&self, error: DispatchError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Set default response when queue is empty.
    pub fn set_default_response(&self, response: HttpResponse) -> &Self {
        *self.default_response.lock().unwrap() = Some(response);
        self
    }

    /// Delay every send by the given duration.
    pub fn set_delay(&self, delay: Duration) -> &Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.request_history.lock().unwrap().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        self.request_history.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        self.request_history.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.responses.lock().unwrap().pop_front();
        match queued {
            Some(result) => result,
            None => self.default_response.lock().unwrap().clone().ok_or_else(|| {
                DispatchError::Network(NetworkError::ConnectionFailed {
                    message: "No mock response available".to_string(),
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post_request(url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: [("x-test".to_string(), "1".to_string())].into_iter().collect(),
            body: Some(b"{\"a\":1}".to_vec()),
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_mock_transport_fifo() {
        let transport = MockHttpTransport::new();
        transport.queue_json_response(200, &serde_json::json!({"n": 1}));
        transport.queue_json_response(200, &serde_json::json!({"n": 2}));

        let first = transport
            .send(post_request("https://example.com/a".to_string()))
            .await
            .unwrap();
        let second = transport
            .send(post_request("https://example.com/b".to_string()))
            .await
            .unwrap();
        assert_eq!(first.body, br#"{"n":1}"#.to_vec());
        assert_eq!(second.body, br#"{"n":2}"#.to_vec());

        let history = transport.get_requests();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_mock_transport_without_response() {
        let transport = MockHttpTransport::new();
        let result = transport
            .send(post_request("https://example.com".to_string()))
            .await;
        assert!(matches!(result, Err(DispatchError::Network(_))));
    }

    #[tokio::test]
    async fn test_reqwest_transport_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pa/v3/token/create"))
            .and(header("x-test", "1"))
            .and(body_bytes(b"{\"a\":1}".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestHttpTransport::new().unwrap();
        let response = transport
            .send(post_request(format!("{}/pa/v3/token/create", server.uri())))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, b"{\"ok\":true}".to_vec());
    }

    #[tokio::test]
    async fn test_reqwest_transport_response_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let transport = ReqwestHttpTransport::with_options(Duration::from_secs(5), 16).unwrap();
        let result = transport.send(post_request(server.uri())).await;
        assert!(matches!(
            result,
            Err(DispatchError::Protocol(ProtocolError::ResponseTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_refused() {
        let transport = ReqwestHttpTransport::new().unwrap();
        let result = transport
            .send(post_request("http://127.0.0.1:1/unreachable".to_string()))
            .await;
        assert!(matches!(result, Err(DispatchError::Network(_))));
    }

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}

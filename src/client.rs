//! HTTP Client
//!
//! Single entry point for sending requests to the authentication server.

use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, debug_span, Instrument};

use crate::core::{CryptoHelper, HttpTransport, ReqwestHttpTransport};
use crate::dispatch::{CancelHandle, ExecutionLane, Lanes, RequestHelper, RequestTask, ResponseListener};
use crate::error::DispatchError;
use crate::types::{Authentication, ClientConfiguration, EndpointDefinition};

/// High level networking client with optional request signing.
///
/// Requests to synchronized endpoints run one at a time in submission order;
/// all others run concurrently. Every call returns immediately with a
/// [`CancelHandle`]; the outcome arrives later through the listener.
pub struct HttpClient<T: HttpTransport + ?Sized = ReqwestHttpTransport> {
    config: Arc<ClientConfiguration>,
    transport: Arc<T>,
    lanes: Lanes,
}

impl HttpClient<ReqwestHttpTransport> {
    /// Create a client with the reqwest transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ClientConfiguration) -> Result<Self, DispatchError> {
        let transport = Arc::new(ReqwestHttpTransport::with_options(
            config.timeout,
            config.max_response_size,
        )?);
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport + ?Sized + 'static> HttpClient<T> {
    /// Create a client with a custom transport on the current runtime.
    pub fn with_transport(config: ClientConfiguration, transport: Arc<T>) -> Result<Self, DispatchError> {
        let lanes = Lanes::new(config.max_concurrent_requests)?;
        Ok(Self::with_components(config, transport, lanes))
    }

    /// Create a client from explicit components.
    pub fn with_components(config: ClientConfiguration, transport: Arc<T>, lanes: Lanes) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            lanes,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfiguration {
        &self.config
    }

    /// Get the base URL of the server REST API.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the lanes requests are executed on.
    pub fn lanes(&self) -> &Lanes {
        &self.lanes
    }

    /// Post a request to an endpoint.
    ///
    /// When `authentication` is present the request is signed by `helper`
    /// before it is transmitted. Failures of any stage are delivered to the
    /// listener, never returned from this call.
    pub fn post<Q, E, L>(
        &self,
        payload: Option<&Q>,
        endpoint: E,
        helper: Arc<dyn CryptoHelper>,
        authentication: Option<Authentication>,
        listener: L,
    ) -> CancelHandle
    where
        Q: Serialize,
        E: EndpointDefinition,
        L: ResponseListener<E::Response>,
    {
        let lane = ExecutionLane::for_endpoint(endpoint.is_synchronized());
        let path = endpoint.relative_path().to_string();
        let signed = authentication.is_some();

        let request = RequestHelper::new(payload, endpoint, authentication);
        let task = RequestTask::new(
            request,
            self.config.clone(),
            self.transport.clone(),
            helper,
            listener,
        );
        let handle = task.cancel_handle();

        let span = debug_span!("request_task", path = %path, lane = lane.as_str(), signed);
        self.lanes
            .submit_cancelable(lane, task.run().instrument(span).boxed(), handle.clone());
        debug!(path = %path, lane = lane.as_str(), signed, "Request submitted");

        handle
    }

    /// Post a request that is not signed.
    pub fn post_unsigned<Q, E, L>(
        &self,
        payload: Option<&Q>,
        endpoint: E,
        helper: Arc<dyn CryptoHelper>,
        listener: L,
    ) -> CancelHandle
    where
        Q: Serialize,
        E: EndpointDefinition,
        L: ResponseListener<E::Response>,
    {
        self.post(payload, endpoint, helper, None, listener)
    }
}

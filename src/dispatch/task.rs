//! Request Task
//!
//! A cancelable unit of work delivering exactly one outcome to its listener.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, trace};

use crate::core::{CryptoHelper, HttpTransport};
use crate::dispatch::RequestHelper;
use crate::error::DispatchError;
use crate::types::{ClientConfiguration, EndpointDefinition};

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELED: u8 = 3;

/// Lifecycle state of a request task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting on its lane.
    Created,
    /// Signing or waiting for the server.
    Running,
    /// Delivered a success or failure.
    Completed,
    /// Cancel was observed before completion.
    Canceled,
}

impl TaskState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            CREATED => Self::Created,
            RUNNING => Self::Running,
            COMPLETED => Self::Completed,
            _ => Self::Canceled,
        }
    }

    /// Returns true for `Completed` and `Canceled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

/// The single outcome a listener receives.
#[derive(Debug)]
pub enum TaskOutcome<R> {
    /// The server answered and the response was mapped.
    Success(R),
    /// Signing, transport or response mapping failed.
    Failure(DispatchError),
    /// The task was canceled before it completed.
    Canceled,
}

impl<R> TaskOutcome<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Convert into a result; `None` when canceled.
    pub fn into_result(self) -> Option<Result<R, DispatchError>> {
        match self {
            Self::Success(response) => Some(Ok(response)),
            Self::Failure(error) => Some(Err(error)),
            Self::Canceled => None,
        }
    }
}

/// Receives the outcome of a request task.
///
/// The listener is consumed by the call, so it runs at most once.
pub trait ResponseListener<R>: Send + 'static {
    fn on_outcome(self, outcome: TaskOutcome<R>);
}

impl<R, F> ResponseListener<R> for F
where
    F: FnOnce(TaskOutcome<R>) + Send + 'static,
{
    fn on_outcome(self, outcome: TaskOutcome<R>) {
        self(outcome)
    }
}

/// Create a listener that forwards the outcome into a channel.
pub fn listener_channel<R: Send + 'static>(
) -> (impl ResponseListener<R>, oneshot::Receiver<TaskOutcome<R>>) {
    let (tx, rx) = oneshot::channel();
    let listener = move |outcome: TaskOutcome<R>| {
        let _ = tx.send(outcome);
    };
    (listener, rx)
}

/// State shared between a task and its cancel handles.
struct TaskControl {
    state: AtomicU8,
    cancel_signal: Notify,
}

impl TaskControl {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(CREATED),
            cancel_signal: Notify::new(),
        }
    }

    fn state(&self) -> TaskState {
        TaskState::from_raw(self.state.load(Ordering::SeqCst))
    }

    fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELED
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn cancel(&self) -> bool {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if current == COMPLETED || current == CANCELED {
                return false;
            }
            match self.state.compare_exchange(
                current,
                CANCELED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    self.cancel_signal.notify_one();
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            self.cancel_signal.notified().await;
        }
    }
}

/// Handle allowing the caller to cancel a dispatched request.
#[derive(Clone)]
pub struct CancelHandle {
    control: Arc<TaskControl>,
}

impl CancelHandle {
    /// Request cancellation.
    ///
    /// Returns true if this call canceled the task. Once the task delivered
    /// its outcome this is a no-op returning false.
    pub fn cancel(&self) -> bool {
        let canceled = self.control.cancel();
        if canceled {
            debug!("Request task canceled");
        }
        canceled
    }

    /// Returns true if the task was canceled.
    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// Current state of the task.
    pub fn state(&self) -> TaskState {
        self.control.state()
    }

    /// Wait until the task is canceled.
    pub async fn cancelled(&self) {
        self.control.cancelled().await
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// One outgoing request: sign, send, map, notify.
pub struct RequestTask<E, L, T>
where
    E: EndpointDefinition,
    L: ResponseListener<E::Response>,
    T: HttpTransport + ?Sized,
{
    request: RequestHelper<E>,
    config: Arc<ClientConfiguration>,
    transport: Arc<T>,
    helper: Arc<dyn CryptoHelper>,
    listener: L,
    control: Arc<TaskControl>,
}

impl<E, L, T> RequestTask<E, L, T>
where
    E: EndpointDefinition,
    L: ResponseListener<E::Response>,
    T: HttpTransport + ?Sized,
{
    pub fn new(
        request: RequestHelper<E>,
        config: Arc<ClientConfiguration>,
        transport: Arc<T>,
        helper: Arc<dyn CryptoHelper>,
        listener: L,
    ) -> Self {
        Self {
            request,
            config,
            transport,
            helper,
            listener,
            control: Arc::new(TaskControl::new()),
        }
    }

    /// Handle for canceling this task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            control: self.control.clone(),
        }
    }

    /// Run the task to its terminal state and notify the listener.
    pub async fn run(self) {
        let Self {
            request,
            config,
            transport,
            helper,
            listener,
            control,
        } = self;

        let outcome = if control.transition(CREATED, RUNNING) {
            let result = tokio::select! {
                biased;
                _ = control.cancelled() => None,
                result = execute(&request, &config, transport.as_ref(), helper.as_ref(), &control) => result,
            };
            match result {
                Some(result) if control.transition(RUNNING, COMPLETED) => match result {
                    Ok(response) => TaskOutcome::Success(response),
                    Err(error) => {
                        debug!(code = error.error_code(), error = %error, "Request failed");
                        TaskOutcome::Failure(error)
                    }
                },
                _ => TaskOutcome::Canceled,
            }
        } else {
            TaskOutcome::Canceled
        };

        if outcome.is_canceled() {
            debug!("Cancel observed, request abandoned");
        }
        listener.on_outcome(outcome);
    }
}

/// Returns `None` when cancellation is observed at a checkpoint.
async fn execute<E, T>(
    request: &RequestHelper<E>,
    config: &ClientConfiguration,
    transport: &T,
    helper: &dyn CryptoHelper,
    control: &TaskControl,
) -> Option<Result<E::Response, DispatchError>>
where
    E: EndpointDefinition,
    T: HttpTransport + ?Sized,
{
    if control.is_cancelled() {
        return None;
    }

    let http_request = match request.build_request(config, helper).await {
        Ok(http_request) => http_request,
        Err(error) => return Some(Err(error)),
    };

    if control.is_cancelled() {
        return None;
    }

    trace!(url = %http_request.url, "Sending request");
    let response = transport.send(http_request).await;

    if control.is_cancelled() {
        return None;
    }

    Some(response.and_then(|response| {
        debug!(status = response.status, "Response received");
        request.map_response(response)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuthorizationHeader, MockCryptoHelper, MockHttpTransport};
    use crate::error::{NetworkError, SigningError};
    use crate::types::{Authentication, Endpoint, SignatureFactors};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn config() -> Arc<ClientConfiguration> {
        Arc::new(ClientConfiguration {
            base_url: "https://auth.example.com".to_string(),
            ..Default::default()
        })
    }

    fn unsigned(path: &str) -> RequestHelper<Endpoint<serde_json::Value>> {
        RequestHelper::new(None::<&()>, Endpoint::new(path), None)
    }

    #[tokio::test]
    async fn test_success_outcome() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &serde_json::json!({"status": "OK"}));
        let (listener, rx) = listener_channel::<serde_json::Value>();

        let task = RequestTask::new(
            unsigned("/pa/v3/activation/status"),
            config(),
            transport.clone(),
            Arc::new(MockCryptoHelper::new()),
            listener,
        );
        let handle = task.cancel_handle();
        assert_eq!(handle.state(), TaskState::Created);

        task.run().await;

        match rx.await.unwrap() {
            TaskOutcome::Success(value) => assert_eq!(value["status"], "OK"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(handle.state(), TaskState::Completed);
        assert!(!handle.cancel());
        assert_eq!(handle.state(), TaskState::Completed);
    }

    #[tokio::test]
    async fn test_transport_failure_outcome() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_error(DispatchError::Network(NetworkError::ConnectionFailed {
            message: "refused".to_string(),
        }));
        let (listener, rx) = listener_channel::<serde_json::Value>();

        RequestTask::new(
            unsigned("/pa/v3/activation/status"),
            config(),
            transport,
            Arc::new(MockCryptoHelper::new()),
            listener,
        )
        .run()
        .await;

        match rx.await.unwrap() {
            TaskOutcome::Failure(error) => assert!(!error.reached_server()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signing_failure_skips_transport() {
        let transport = Arc::new(MockHttpTransport::new());
        let mut helper = MockCryptoHelper::new();
        helper.expect_authorization_header().returning(|_, _| {
            Err(DispatchError::Signing(SigningError::SignatureFailed {
                message: "device key missing".to_string(),
            }))
        });
        let (listener, rx) = listener_channel::<serde_json::Value>();

        RequestTask::new(
            RequestHelper::new(
                None::<&()>,
                Endpoint::new("/pa/v3/token/create"),
                Some(Authentication::new(SignatureFactors::possession())),
            ),
            config(),
            transport.clone(),
            Arc::new(helper),
            listener,
        )
        .run()
        .await;

        assert!(matches!(
            rx.await.unwrap(),
            TaskOutcome::Failure(DispatchError::Signing(_))
        ));
        assert!(transport.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let transport = Arc::new(MockHttpTransport::new());
        let (listener, rx) = listener_channel::<serde_json::Value>();

        let task = RequestTask::new(
            unsigned("/pa/v3/activation/status"),
            config(),
            transport.clone(),
            Arc::new(MockCryptoHelper::new()),
            listener,
        );
        let handle = task.cancel_handle();
        assert!(handle.cancel());
        assert!(!handle.cancel());

        task.run().await;

        assert!(rx.await.unwrap().is_canceled());
        assert!(transport.get_requests().is_empty());
        assert_eq!(handle.state(), TaskState::Canceled);
        assert!(handle.state().is_terminal());
    }

    #[tokio::test]
    async fn test_cancel_during_transport() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.set_delay(Duration::from_secs(30));
        transport.queue_json_response(200, &serde_json::json!({}));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (tx, rx) = oneshot::channel();
        let listener = move |outcome: TaskOutcome<serde_json::Value>| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        };

        let task = RequestTask::new(
            unsigned("/pa/v3/activation/status"),
            config(),
            transport.clone(),
            Arc::new(MockCryptoHelper::new()),
            listener,
        );
        let handle = task.cancel_handle();
        let running = tokio::spawn(task.run());

        while transport.get_requests().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.state(), TaskState::Running);
        assert!(handle.cancel());

        tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .unwrap()
            .unwrap();
        assert!(rx.await.unwrap().is_canceled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_signed_task_sends_header() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &serde_json::json!({}));
        let mut helper = MockCryptoHelper::new();
        helper
            .expect_authorization_header()
            .times(1)
            .returning(|_, _| Ok(AuthorizationHeader::new("X-Auth", "v")));
        let (listener, rx) = listener_channel::<serde_json::Value>();

        RequestTask::new(
            RequestHelper::new(
                Some(&serde_json::json!({"k": "v"})),
                Endpoint::new("/pa/v3/token/create"),
                Some(Authentication::new(SignatureFactors::possession())),
            ),
            config(),
            transport.clone(),
            Arc::new(helper),
            listener,
        )
        .run()
        .await;

        assert!(rx.await.unwrap().is_success());
        let sent = transport.get_last_request().unwrap();
        assert_eq!(sent.headers.get("x-auth"), Some(&"v".to_string()));
    }

    #[test]
    fn test_outcome_into_result() {
        assert!(!TaskState::Running.is_terminal());
        assert!(matches!(TaskOutcome::Success(1).into_result(), Some(Ok(1))));
        assert!(TaskOutcome::<u8>::Canceled.into_result().is_none());
    }
}

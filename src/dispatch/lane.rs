//! Execution Lanes
//!
//! The two scheduling disciplines a request can run on.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::dispatch::CancelHandle;
use crate::error::{ConfigurationError, DispatchError};

/// Unit of work submitted to a lane.
pub type Job = BoxFuture<'static, ()>;

/// Scheduling discipline of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionLane {
    /// Strict FIFO, one request in flight at a time.
    Serial,
    /// Parallel execution without ordering between requests.
    Concurrent,
}

impl ExecutionLane {
    /// Select the lane for an endpoint's synchronization requirement.
    pub fn for_endpoint(synchronized: bool) -> Self {
        if synchronized {
            Self::Serial
        } else {
            Self::Concurrent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Concurrent => "concurrent",
        }
    }
}

/// Executors backing both lanes.
///
/// The serial lane is a single worker draining a queue; jobs run to
/// completion one after another in submission order. Concurrent jobs are
/// spawned on the runtime, optionally bounded by a semaphore.
pub struct Lanes {
    runtime: Handle,
    serial: mpsc::UnboundedSender<Job>,
    concurrency: Option<Arc<Semaphore>>,
}

impl Lanes {
    /// Create lanes on the current tokio runtime.
    pub fn new(max_concurrent: Option<usize>) -> Result<Self, DispatchError> {
        let runtime = Handle::try_current().map_err(|e| {
            DispatchError::Configuration(ConfigurationError::RuntimeUnavailable {
                message: e.to_string(),
            })
        })?;
        Self::with_runtime(runtime, max_concurrent)
    }

    /// Create lanes on a given runtime.
    pub fn with_runtime(
        runtime: Handle,
        max_concurrent: Option<usize>,
    ) -> Result<Self, DispatchError> {
        validate_max_concurrent(max_concurrent)?;
        let (serial, mut queue) = mpsc::unbounded_channel::<Job>();

        runtime.spawn(async move {
            while let Some(job) = queue.recv().await {
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    warn!(lane = "serial", "Job panicked");
                }
            }
        });

        Ok(Self {
            runtime,
            serial,
            concurrency: max_concurrent.map(|limit| Arc::new(Semaphore::new(limit))),
        })
    }

    /// Submit a job to a lane. Never blocks.
    pub fn submit(&self, lane: ExecutionLane, job: Job) {
        self.enqueue(lane, job, None);
    }

    /// Submit the job of a request task.
    ///
    /// On a saturated concurrent lane a canceled task does not wait for a
    /// permit; it runs at once and reports its cancellation.
    pub fn submit_cancelable(&self, lane: ExecutionLane, job: Job, cancel: CancelHandle) {
        self.enqueue(lane, job, Some(cancel));
    }

    fn enqueue(&self, lane: ExecutionLane, job: Job, cancel: Option<CancelHandle>) {
        match lane {
            ExecutionLane::Serial => {
                if self.serial.send(job).is_err() {
                    warn!(lane = lane.as_str(), "Serial worker is gone, job dropped");
                }
            }
            ExecutionLane::Concurrent => {
                let permits = self.concurrency.clone();
                self.runtime.spawn(async move {
                    let _permit = match permits {
                        Some(semaphore) => acquire_permit(semaphore, cancel.as_ref()).await,
                        None => None,
                    };
                    job.await;
                });
            }
        }
    }
}

/// Check a concurrent lane bound.
pub fn validate_max_concurrent(max_concurrent: Option<usize>) -> Result<(), DispatchError> {
    match max_concurrent {
        Some(0) => Err(DispatchError::Configuration(ConfigurationError::InvalidConfig {
            message: "max_concurrent_requests must be greater than zero".to_string(),
        })),
        Some(limit) if limit > Semaphore::MAX_PERMITS => {
            Err(DispatchError::Configuration(ConfigurationError::InvalidConfig {
                message: format!(
                    "max_concurrent_requests must not exceed {}",
                    Semaphore::MAX_PERMITS
                ),
            }))
        }
        _ => Ok(()),
    }
}

async fn acquire_permit(
    semaphore: Arc<Semaphore>,
    cancel: Option<&CancelHandle>,
) -> Option<OwnedSemaphorePermit> {
    match cancel {
        Some(handle) => tokio::select! {
            biased;
            _ = handle.cancelled() => None,
            permit = semaphore.acquire_owned() => permit.ok(),
        },
        None => semaphore.acquire_owned().await.ok(),
    }
}

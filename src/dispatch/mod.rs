//! Request Dispatch
//!
//! Building, scheduling and canceling outgoing requests.
//!
//! This module provides:
//!
//! - **Lanes**: Serial and concurrent execution of request tasks
//! - **Request Helper**: Request encoding, signing and response mapping
//! - **Request Task**: Cancelable task delivering one outcome to a listener

pub mod lane;
pub mod request;
pub mod task;

// Lanes
pub use lane::{validate_max_concurrent, ExecutionLane, Job, Lanes};

// Request Helper
pub use request::RequestHelper;

// Request Task
pub use task::{
    listener_channel, CancelHandle, RequestTask, ResponseListener, TaskOutcome, TaskState,
};

//! # Task abstractions and per-task records.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async units of work
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskId`] - identifier issued by the pool at dispatch time
//! - [`TaskStatus`] - completion record kept in the pool history

mod queued;
mod status;
mod task;
mod task_fn;

pub(crate) use queued::QueuedTask;
pub use queued::TaskId;
pub(crate) use status::executor_label;
pub use status::TaskStatus;
pub use task::{Task, TaskOutput, TaskRef};
pub use task_fn::TaskFn;

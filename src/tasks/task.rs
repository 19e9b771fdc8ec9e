//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, run once per dispatch). The common handle
//! type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing across the runtime.
//!
//! A task receives the number of the worker executing it. The number is a hint only
//! (useful for logs or per-worker resources); tasks must not rely on a particular worker.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// Untyped result payload produced by a successful run.
pub type TaskOutput = serde_json::Value;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous unit of work.
///
/// A `Task` has a [`name`](Task::name) and an async [`run`](Task::run) method that receives
/// the executing worker's number. The pool calls `run` exactly once per dispatch.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use taskpool::{Task, TaskError, TaskOutput};
///
/// struct Printer {
///     line: String,
/// }
///
/// #[async_trait]
/// impl Task for Printer {
///     fn name(&self) -> &str { "printer" }
///
///     async fn run(&self, worker: usize) -> Result<TaskOutput, TaskError> {
///         println!("[worker {worker}] {}", self.line);
///         Ok(TaskOutput::Null)
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a human-readable task name (not required to be unique).
    fn name(&self) -> &str;

    /// Executes the task to completion on worker `worker`.
    ///
    /// Errors are recorded on the task status; they are never retried.
    async fn run(&self, worker: usize) -> Result<TaskOutput, TaskError>;
}

//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(usize) -> Fut`, producing a fresh future per run.
//! Captured state is shared across dispatches of the same `TaskRef`; wrap it in `Arc<...>`
//! explicitly when the closure needs mutation.
//!
//! ## Example
//! ```rust
//! use taskpool::{TaskError, TaskFn, TaskOutput, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("double", |worker: usize| async move {
//!     Ok::<_, TaskError>(TaskOutput::from(worker * 2))
//! });
//!
//! assert_eq!(t.name(), "double");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::task::{Task, TaskOutput};

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per run.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TaskOutput, TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, worker: usize) -> Result<TaskOutput, TaskError> {
        (self.f)(worker).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskRef;

    #[tokio::test]
    async fn test_fresh_future_per_run() {
        let t: TaskRef = TaskFn::arc("echo-worker", |worker: usize| async move {
            if worker == 0 {
                return Err(TaskError::fail("worker numbers start at 1"));
            }
            Ok(TaskOutput::from(worker))
        });

        assert_eq!(t.run(3).await, Ok(TaskOutput::from(3)));
        assert_eq!(t.run(7).await, Ok(TaskOutput::from(7)));
        assert_eq!(
            t.run(0).await,
            Err(TaskError::fail("worker numbers start at 1"))
        );
    }
}

//! Detached task execution

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use crate::{CacheError, Result};

/// A unit of detached work
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs work without blocking the submitter
///
/// `submit` must return promptly. An error means the task was refused and
/// will never run; it never reports the outcome of the task itself.
pub trait TaskScheduler: Send + Sync + 'static {
    /// Hand a task over for background execution
    fn submit(&self, task: Task) -> Result<()>;
}

impl<S: TaskScheduler + ?Sized> TaskScheduler for Arc<S> {
    fn submit(&self, task: Task) -> Result<()> {
        (**self).submit(task)
    }
}

/// Spawns every task onto the ambient tokio runtime (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TaskScheduler for TokioScheduler {
    fn submit(&self, task: Task) -> Result<()> {
        let handle = Handle::try_current().map_err(|e| CacheError::Scheduling(e.to_string()))?;
        handle.spawn(task);
        Ok(())
    }
}

/// Spawns tasks while fewer than `max_in_flight` are outstanding
///
/// Once saturated, further submissions are rejected instead of queued.
#[derive(Debug, Clone)]
pub struct BoundedScheduler {
    permits: Arc<Semaphore>,
    handle: Option<Handle>,
}

impl BoundedScheduler {
    /// Create a scheduler that spawns onto the runtime current at submit time
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            handle: None,
        }
    }

    /// Pin the scheduler to a specific runtime
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Number of tasks that can still be accepted
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl TaskScheduler for BoundedScheduler {
    fn submit(&self, task: Task) -> Result<()> {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|e| CacheError::Scheduling(e.to_string()))?,
        };

        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| CacheError::Scheduling("too many outstanding tasks".to_string()))?;

        handle.spawn(async move {
            task.await;
            drop(permit);
        });
        Ok(())
    }
}

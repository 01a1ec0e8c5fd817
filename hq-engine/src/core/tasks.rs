//! Background task management
//!
//! One place to register, start and shut down a session's tasks.
//!
//! # Task kinds
//!
//! - [`TaskKind::Listener`] - one live subscription feed
//! - [`TaskKind::Worker`] - long-running consumer (the coordinator)

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Long-running consumer
    Worker,
    /// Subscription feed
    Listener,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Listener => write!(f, "Listener"),
        }
    }
}

struct RegisteredTask {
    name: String,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// Background task manager
///
/// Every task shares one cancellation token; [`BackgroundTasks::shutdown`]
/// cancels it and waits for all of them.
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// let token = tasks.shutdown_token();
/// tasks.spawn("orders", TaskKind::Listener, async move {
///     token.cancelled().await;
/// });
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Use an existing token, so tasks also stop when it is cancelled elsewhere
    pub fn with_token(shutdown: CancellationToken) -> Self {
        Self {
            tasks: Vec::new(),
            shutdown,
        }
    }

    /// Token tasks listen on for the shutdown signal
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register and start a task
    ///
    /// Panics are caught and logged. A task that returns before shutdown
    /// was requested is logged as unexpected.
    pub fn spawn<F>(&mut self, name: impl Into<String>, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let shutdown = self.shutdown.clone();
        let wrapped_future = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) => {
                    if !shutdown.is_cancelled() {
                        tracing::warn!(task = %task_name, kind = %kind, "Background task completed before shutdown");
                    }
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %task_name,
                        kind = %kind,
                        panic = %panic_msg,
                        "Background task panicked! This is a bug that should be reported."
                    );
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// (worker, listener)
    pub fn count_by_kind(&self) -> (usize, usize) {
        let workers = self.tasks.iter().filter(|t| t.kind == TaskKind::Worker).count();
        (workers, self.tasks.len() - workers)
    }

    pub fn log_summary(&self) {
        let (worker, listener) = self.count_by_kind();
        tracing::info!(
            "Background tasks registered: {} total (Worker: {}, Listener: {})",
            self.tasks.len(),
            worker,
            listener
        );
    }

    /// Number of tasks that already finished
    pub fn finished(&self) -> usize {
        self.tasks.iter().filter(|t| t.handle.is_finished()).count()
    }

    /// Cancel every task and wait for all of them
    pub async fn shutdown(self) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());
        self.shutdown.cancel();

        for task in self.tasks {
            match task.handle.await {
                Ok(()) => {
                    tracing::debug!(task = %task.name, "Task completed");
                }
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(task = %task.name, "Task cancelled");
                }
                Err(e) => {
                    tracing::error!(task = %task.name, error = ?e, "Task panicked");
                }
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

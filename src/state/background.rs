//! Background task handling for long-running operations
//!
//! A job runs on its own thread with the providers it needs moved in; they
//! come back in the final [`TaskResult`] so the caller can put them back
//! into their panels.

use std::sync::mpsc::{Receiver, channel};
use std::thread::{self, JoinHandle};

use crate::errors::AppResult;
use crate::ops::{FileOperation, JobProgress, TransferJob, run_job};
use crate::providers::PanelProvider;

/// Result of a background task
pub enum TaskResult {
    /// Connectivity probe finished
    Probed {
        provider: Box<dyn PanelProvider>,
        connected: bool,
    },
    /// Copy, move or delete job finished, successfully or not
    JobFinished {
        operation: FileOperation,
        source: Box<dyn PanelProvider>,
        target: Option<Box<dyn PanelProvider>>,
        /// Items processed, or the error that stopped the job
        result: AppResult<usize>,
    },
}

impl std::fmt::Debug for TaskResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskResult::Probed { provider, connected } => f
                .debug_struct("Probed")
                .field("kind", &provider.kind())
                .field("connected", connected)
                .finish(),
            TaskResult::JobFinished { operation, result, .. } => f
                .debug_struct("JobFinished")
                .field("operation", operation)
                .field("result", result)
                .finish(),
        }
    }
}

/// A background task with its communication channel
pub struct BackgroundTask {
    /// Receiver for task completion
    pub receiver: Receiver<TaskResult>,
    /// Progress receiver for jobs
    pub progress_rx: Option<Receiver<JobProgress>>,
    /// Thread handle (for cleanup)
    _handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Check whether `provider`'s backend is reachable without blocking the caller
    pub fn probe(mut provider: Box<dyn PanelProvider>) -> Self {
        let (tx, rx) = channel::<TaskResult>();

        let handle = thread::spawn(move || {
            let connected = provider.is_connected();
            let _ = tx.send(TaskResult::Probed { provider, connected });
        });

        BackgroundTask {
            receiver: rx,
            progress_rx: None,
            _handle: handle,
        }
    }

    /// Run a transfer job on a worker thread.
    /// Progress events arrive on `progress_rx` in the order they were emitted.
    pub fn transfer(
        job: TransferJob,
        mut source: Box<dyn PanelProvider>,
        mut target: Option<Box<dyn PanelProvider>>,
    ) -> Self {
        let (tx, rx) = channel::<TaskResult>();
        let (progress_tx, progress_rx) = channel::<JobProgress>();

        let handle = thread::spawn(move || {
            let result = run_job(
                &job,
                source.as_mut(),
                target.as_mut().map(|t| &mut **t as &mut dyn PanelProvider),
                &mut |progress| {
                    let _ = progress_tx.send(progress.clone());
                },
            );

            let _ = tx.send(TaskResult::JobFinished {
                operation: job.operation,
                source,
                target,
                result,
            });
        });

        BackgroundTask {
            receiver: rx,
            progress_rx: Some(progress_rx),
            _handle: handle,
        }
    }

    /// Check if the task has completed (non-blocking)
    pub fn try_recv(&self) -> Option<TaskResult> {
        self.receiver.try_recv().ok()
    }

    /// Drain pending progress events (non-blocking)
    pub fn poll_progress(&self) -> Vec<JobProgress> {
        self.progress_rx
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }

    /// Block until the task finishes
    pub fn wait(self) -> Option<TaskResult> {
        self.receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::TransferItem;
    use crate::providers::{BackendKind, LocalProvider};
    use std::fs;

    #[test]
    fn test_probe_local() {
        let task = BackgroundTask::probe(Box::new(LocalProvider::new()));
        match task.wait() {
            Some(TaskResult::Probed { provider, connected }) => {
                assert!(connected);
                assert_eq!(provider.kind(), BackendKind::Local);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_transfer_returns_providers_and_progress() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("out");
        fs::write(&src, b"hello").unwrap();
        fs::create_dir(&dst).unwrap();

        let job = TransferJob::copy(
            vec![TransferItem {
                path: src.to_string_lossy().into_owned(),
                is_dir: false,
            }],
            BackendKind::Local,
            dst.to_string_lossy(),
            BackendKind::Local,
        );
        let task = BackgroundTask::transfer(
            job,
            Box::new(LocalProvider::new()),
            Some(Box::new(LocalProvider::new())),
        );

        let BackgroundTask { receiver, progress_rx, .. } = task;
        let progress_rx = progress_rx.unwrap();
        let finished = receiver.recv().unwrap();
        let events: Vec<JobProgress> = progress_rx.try_iter().collect();

        match finished {
            TaskResult::JobFinished { operation, target, result, .. } => {
                assert_eq!(operation, FileOperation::Copy);
                assert!(target.is_some());
                assert_eq!(result.unwrap(), 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        let fractions: Vec<f64> = events
            .iter()
            .filter(|p| p.item_fraction.is_none())
            .map(|p| p.fraction)
            .collect();
        assert_eq!(fractions, vec![0.5, 1.0]);
        assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"hello");
    }
}

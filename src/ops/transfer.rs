//! Copy / move / delete jobs across the local and device backends
//!
//! Items run strictly one after another. The first failure stops the job;
//! items already done stay done.

use std::path::Path;

use crate::errors::{AppError, AppResult};
use crate::providers::{BackendKind, PanelProvider, ProviderResult};

/// Kind of job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOperation {
    Copy,
    Move,
    Delete,
}

impl FileOperation {
    /// Past-tense verb for status messages
    pub fn past_tense(self) -> &'static str {
        match self {
            FileOperation::Copy => "Copied",
            FileOperation::Move => "Moved",
            FileOperation::Delete => "Deleted",
        }
    }
}

/// One source path of a job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferItem {
    pub path: String,
    pub is_dir: bool,
}

/// Destination directory of a copy or move
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobTarget {
    pub path: String,
    pub kind: BackendKind,
}

/// Description of one orchestrated operation
#[derive(Clone, Debug)]
pub struct TransferJob {
    pub items: Vec<TransferItem>,
    pub source_kind: BackendKind,
    pub operation: FileOperation,
    /// None exactly when `operation` is Delete
    target: Option<JobTarget>,
}

impl TransferJob {
    pub fn copy(
        items: Vec<TransferItem>,
        source_kind: BackendKind,
        target_path: impl Into<String>,
        target_kind: BackendKind,
    ) -> Self {
        Self::with_target(FileOperation::Copy, items, source_kind, target_path.into(), target_kind)
    }

    pub fn move_to(
        items: Vec<TransferItem>,
        source_kind: BackendKind,
        target_path: impl Into<String>,
        target_kind: BackendKind,
    ) -> Self {
        Self::with_target(FileOperation::Move, items, source_kind, target_path.into(), target_kind)
    }

    pub fn delete(items: Vec<TransferItem>, source_kind: BackendKind) -> Self {
        Self {
            items,
            source_kind,
            operation: FileOperation::Delete,
            target: None,
        }
    }

    fn with_target(
        operation: FileOperation,
        items: Vec<TransferItem>,
        source_kind: BackendKind,
        path: String,
        kind: BackendKind,
    ) -> Self {
        Self {
            items,
            source_kind,
            operation,
            target: Some(JobTarget { path, kind }),
        }
    }

    pub fn target(&self) -> Option<&JobTarget> {
        self.target.as_ref()
    }
}

/// Progress update for a running job
#[derive(Clone, Debug, PartialEq)]
pub struct JobProgress {
    /// Job-level fraction: (i + 0.5) / n while item i runs, (i + 1) / n after it
    pub fraction: f64,
    pub current_item: String,
    pub items_done: usize,
    pub items_total: usize,
    /// Fraction reported by the transfer command for the current item, if any
    pub item_fraction: Option<f64>,
}

/// Execute `job`. `source` must be the backend the items live on; `target` is
/// the destination backend and is required for copy and move.
///
/// Returns the number of items processed.
pub fn run_job(
    job: &TransferJob,
    source: &mut dyn PanelProvider,
    mut target: Option<&mut dyn PanelProvider>,
    on_progress: &mut dyn FnMut(&JobProgress),
) -> AppResult<usize> {
    if source.kind() != job.source_kind {
        return Err(AppError::InvalidJob(format!(
            "job source is {} but the provider is {}",
            job.source_kind.label(),
            source.kind().label()
        )));
    }
    if let Some(job_target) = &job.target {
        match target.as_deref() {
            Some(provider) if provider.kind() == job_target.kind => {}
            Some(provider) => {
                return Err(AppError::InvalidJob(format!(
                    "job target is {} but the provider is {}",
                    job_target.kind.label(),
                    provider.kind().label()
                )));
            }
            None => {
                return Err(AppError::InvalidJob(
                    "copy and move need a target provider".to_string(),
                ));
            }
        }
    }

    let total = job.items.len();
    log::info!(
        "{:?} of {} item(s) from {}{}",
        job.operation,
        total,
        job.source_kind.label(),
        job.target
            .as_ref()
            .map(|t| format!(" to {} {}", t.kind.label(), t.path))
            .unwrap_or_default()
    );

    for (i, item) in job.items.iter().enumerate() {
        let name = source.base_name(&item.path);
        let started = (i as f64 + 0.5) / total as f64;

        on_progress(&JobProgress {
            fraction: started,
            current_item: name.clone(),
            items_done: i,
            items_total: total,
            item_fraction: None,
        });

        let result = {
            let mut item_progress = |f: f64| {
                on_progress(&JobProgress {
                    fraction: started,
                    current_item: name.clone(),
                    items_done: i,
                    items_total: total,
                    item_fraction: Some(f),
                })
            };
            match (&job.target, target.as_deref_mut()) {
                (Some(job_target), Some(dest_provider)) => {
                    let dest = dest_provider.join_path(&job_target.path, &name);
                    log::debug!("{:?} {} -> {}", job.operation, item.path, dest);
                    transfer_item(
                        job.operation,
                        source,
                        dest_provider,
                        &item.path,
                        &dest,
                        &mut item_progress,
                    )
                }
                _ => source.delete_recursive(&item.path),
            }
        };

        if let Err(cause) = result {
            log::warn!("{:?} stopped at {} after {} item(s): {}", job.operation, name, i, cause);
            return Err(AppError::Job {
                item: name,
                completed: i,
                source: cause,
            });
        }

        on_progress(&JobProgress {
            fraction: (i + 1) as f64 / total as f64,
            current_item: name,
            items_done: i + 1,
            items_total: total,
            item_fraction: None,
        });
    }

    log::info!("{} {} item(s)", job.operation.past_tense(), total);
    Ok(total)
}

/// Dispatch one copy/move by (source, target) backend pair
fn transfer_item(
    operation: FileOperation,
    source: &mut dyn PanelProvider,
    target: &mut dyn PanelProvider,
    src: &str,
    dest: &str,
    progress: &mut dyn FnMut(f64),
) -> ProviderResult<()> {
    match (operation, source.kind(), target.kind()) {
        (FileOperation::Delete, _, _) => source.delete_recursive(src),

        // Same backend: native recursive copy / rename, or cp -r / mv on the device
        (FileOperation::Copy, s, t) if s == t => source.copy_recursive(src, dest),
        (FileOperation::Move, s, t) if s == t => source.rename(src, dest),

        // local -> device: push
        (FileOperation::Copy, BackendKind::Local, _) => {
            target.import_local(Path::new(src), dest, progress)
        }
        (FileOperation::Move, BackendKind::Local, _) => {
            target.import_local(Path::new(src), dest, progress)?;
            source.delete_recursive(src)
        }

        // device -> local: pull
        (FileOperation::Copy, _, _) => source.export_local(src, Path::new(dest), progress),
        (FileOperation::Move, _, _) => {
            source.export_local(src, Path::new(dest), progress)?;
            source.delete_recursive(src)
        }
    }
}

/// Create a directory on whichever backend `provider` is
pub fn create_directory(provider: &mut dyn PanelProvider, path: &str) -> AppResult<()> {
    provider.mkdir(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LocalProvider;
    use std::fs;

    fn item(path: &Path, is_dir: bool) -> TransferItem {
        TransferItem {
            path: path.to_string_lossy().into_owned(),
            is_dir,
        }
    }

    #[test]
    fn test_delete_job_has_no_target() {
        let job = TransferJob::delete(vec![], BackendKind::Adb);
        assert!(job.target().is_none());
        let job = TransferJob::copy(vec![], BackendKind::Local, "/sdcard", BackendKind::Adb);
        assert_eq!(job.target().unwrap().kind, BackendKind::Adb);
    }

    #[test]
    fn test_local_copy_reports_half_and_full_steps() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(src.join("folder")).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();
        fs::write(src.join("folder/b.txt"), b"b").unwrap();

        let job = TransferJob::copy(
            vec![item(&src.join("a.txt"), false), item(&src.join("folder"), true)],
            BackendKind::Local,
            dst.to_string_lossy(),
            BackendKind::Local,
        );

        let mut source = LocalProvider::new();
        let mut target = LocalProvider::new();
        let mut events = Vec::new();
        let done = run_job(&job, &mut source, Some(&mut target), &mut |p| {
            if p.item_fraction.is_none() {
                events.push((p.fraction, p.current_item.clone()));
            }
        })
        .unwrap();

        assert_eq!(done, 2);
        assert_eq!(
            events,
            vec![
                (0.25, "a.txt".to_string()),
                (0.5, "a.txt".to_string()),
                (0.75, "folder".to_string()),
                (1.0, "folder".to_string()),
            ]
        );
        assert!(dst.join("a.txt").exists());
        assert_eq!(fs::read(dst.join("folder/b.txt")).unwrap(), b"b");
        assert!(src.join("a.txt").exists());
    }

    #[test]
    fn test_local_move_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        let file = dir.path().join("m.txt");
        fs::write(&file, b"m").unwrap();

        let mut source = LocalProvider::new();
        let mut target = LocalProvider::new();
        let job = TransferJob::move_to(
            vec![item(&file, false)],
            BackendKind::Local,
            dst.to_string_lossy(),
            BackendKind::Local,
        );
        run_job(&job, &mut source, Some(&mut target), &mut |_| {}).unwrap();
        assert!(!file.exists());
        assert!(dst.join("m.txt").exists());

        let job = TransferJob::delete(vec![item(&dst, true)], BackendKind::Local);
        run_job(&job, &mut source, None, &mut |_| {}).unwrap();
        assert!(!dst.exists());
    }

    #[test]
    fn test_failure_stops_and_names_item() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("one.txt");
        let third = dir.path().join("three.txt");
        fs::write(&first, b"1").unwrap();
        fs::write(&third, b"3").unwrap();

        let job = TransferJob::delete(
            vec![
                item(&first, false),
                item(&dir.path().join("two.txt"), false),
                item(&third, false),
            ],
            BackendKind::Local,
        );
        let mut source = LocalProvider::new();
        let err = run_job(&job, &mut source, None, &mut |_| {}).unwrap_err();

        assert_eq!(err.failed_item(), Some("two.txt"));
        assert!(matches!(err, AppError::Job { completed: 1, .. }));
        assert!(!first.exists());
        assert!(third.exists());
    }

    #[test]
    fn test_rejects_mismatched_providers() {
        let job = TransferJob::copy(vec![], BackendKind::Adb, "/tmp", BackendKind::Local);
        let mut source = LocalProvider::new();
        let mut target = LocalProvider::new();
        let err = run_job(&job, &mut source, Some(&mut target), &mut |_| {}).unwrap_err();
        assert!(matches!(err, AppError::InvalidJob(_)));

        let job = TransferJob::copy(vec![], BackendKind::Local, "/tmp", BackendKind::Local);
        let err = run_job(&job, &mut source, None, &mut |_| {}).unwrap_err();
        assert!(matches!(err, AppError::InvalidJob(_)));
    }

    #[test]
    fn test_copy_into_own_directory_fails_without_data_loss() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        let tree = dir.path().join("tree");
        fs::write(&data, b"precious").unwrap();
        fs::create_dir_all(tree.join("inner")).unwrap();

        let mut source = LocalProvider::new();
        let mut target = LocalProvider::new();

        let job = TransferJob::copy(
            vec![item(&data, false)],
            BackendKind::Local,
            dir.path().to_string_lossy(),
            BackendKind::Local,
        );
        let err = run_job(&job, &mut source, Some(&mut target), &mut |_| {}).unwrap_err();
        assert_eq!(err.failed_item(), Some("data.txt"));
        assert_eq!(fs::read(&data).unwrap(), b"precious");

        let job = TransferJob::copy(
            vec![item(&tree, true)],
            BackendKind::Local,
            tree.to_string_lossy(),
            BackendKind::Local,
        );
        let err = run_job(&job, &mut source, Some(&mut target), &mut |_| {}).unwrap_err();
        assert!(matches!(err, AppError::Job { completed: 0, .. }));
        assert!(!tree.join("tree").exists());
    }
}

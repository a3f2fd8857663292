//! Panel providers for the two filesystem backends
//!
//! Providers abstract filesystem operations, allowing panels and the
//! transfer orchestrator to work with:
//! - the local filesystem
//! - the device filesystem, reached through the adb bridge

mod adb;
mod bridge;
mod local;

pub use adb::{AdbProvider, RemoteStat};
pub use bridge::{AdbBridge, Bridge, ProgressScanner, shell_quote};
pub use local::LocalProvider;

use std::path::Path;

use thiserror::Error;

use crate::fs::FileEntry;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Native filesystem error, or the bridge executable could not be started
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    /// The bridge ran but exited non-zero; `message` is its diagnostic output
    #[error("{message}")]
    Command { code: Option<i32>, message: String },
    #[error("Not connected: {0}")]
    NotConnected(String),
}

impl ProviderError {
    /// Whether this error means "the path does not exist"
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::NotFound(_) => true,
            ProviderError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            ProviderError::Command { message, .. } => message.contains("No such file or directory"),
            _ => false,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Which filesystem a provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Local filesystem
    Local,
    /// Device filesystem over adb
    Adb,
}

impl BackendKind {
    /// Label for panel headers and status messages
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Local => "LOCAL",
            BackendKind::Adb => "ADB",
        }
    }

    pub fn other(self) -> Self {
        match self {
            BackendKind::Local => BackendKind::Adb,
            BackendKind::Adb => BackendKind::Local,
        }
    }
}

/// Trait for panel filesystem providers
///
/// All paths are provider-relative strings ("/home/user" locally,
/// "/sdcard/DCIM" on the device).
pub trait PanelProvider: Send {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Check that the backend is reachable (a device is attached and ready)
    fn is_connected(&mut self) -> bool;

    /// List directory contents, without "." / "..".
    /// A path that does not exist lists as empty.
    fn list_directory(&mut self, path: &str) -> ProviderResult<Vec<FileEntry>>;

    /// Create a directory and any missing parents; existing directories are fine
    fn mkdir(&mut self, path: &str) -> ProviderResult<()>;

    /// Delete a file or a directory tree
    fn delete_recursive(&mut self, path: &str) -> ProviderResult<()>;

    /// Rename/move a file or directory within this backend
    fn rename(&mut self, from: &str, to: &str) -> ProviderResult<()>;

    /// Copy a file or directory tree within this backend
    fn copy_recursive(&mut self, from: &str, to: &str) -> ProviderResult<()>;

    /// Whether `path` exists
    fn exists(&mut self, path: &str) -> bool;

    /// Copy a local path into this backend at `dest`.
    /// `progress` receives fractions in 0..=1; they may repeat or go backwards.
    fn import_local(
        &mut self,
        local: &Path,
        dest: &str,
        progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()>;

    /// Copy `src` from this backend to a local path
    fn export_local(
        &mut self,
        src: &str,
        local: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()>;

    /// Default directory for new panels and "go home"
    fn home_path(&self) -> String;

    /// Filesystem root
    fn root_path(&self) -> String;

    /// Get parent path, None at the root
    fn parent_path(&self, path: &str) -> Option<String>;

    /// Join path components
    fn join_path(&self, base: &str, name: &str) -> String;

    /// Last component of a path
    fn base_name(&self, path: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let io = ProviderError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(io.is_not_found());

        let cmd = ProviderError::Command {
            code: Some(1),
            message: "ls: /sdcard/nope: No such file or directory".to_string(),
        };
        assert!(cmd.is_not_found());

        let denied = ProviderError::Command {
            code: Some(1),
            message: "ls: /data: Permission denied".to_string(),
        };
        assert!(!denied.is_not_found());
    }

    #[test]
    fn test_backend_kind_other() {
        assert_eq!(BackendKind::Local.other(), BackendKind::Adb);
        assert_eq!(BackendKind::Adb.other(), BackendKind::Local);
        assert_eq!(BackendKind::Adb.label(), "ADB");
    }
}

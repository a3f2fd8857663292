//! Local filesystem provider

use std::fs;
use std::path::Path;

use crate::fs::FileEntry;
use crate::fs::utils::{copy_path, delete_path, move_path};
use super::{BackendKind, PanelProvider, ProviderError, ProviderResult};

/// Provider for local filesystem operations
#[derive(Debug, Clone)]
pub struct LocalProvider {
    home: String,
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalProvider {
    /// Create a new local provider rooted at the user's home directory
    pub fn new() -> Self {
        Self { home: default_home() }
    }

    /// Create a local provider with an explicit home directory
    pub fn with_home(home: impl Into<String>) -> Self {
        Self { home: home.into() }
    }
}

fn default_home() -> String {
    #[cfg(unix)]
    {
        std::env::var("HOME").unwrap_or_else(|_| "/".to_string())
    }
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\".to_string())
    }
    #[cfg(not(any(unix, windows)))]
    {
        "/".to_string()
    }
}

impl PanelProvider for LocalProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn is_connected(&mut self) -> bool {
        true // Local filesystem is always "connected"
    }

    fn list_directory(&mut self, path: &str) -> ProviderResult<Vec<FileEntry>> {
        match crate::fs::read_directory(Path::new(path)) {
            Ok(entries) => Ok(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ProviderError::from(e)),
        }
    }

    fn mkdir(&mut self, path: &str) -> ProviderResult<()> {
        fs::create_dir_all(path).map_err(ProviderError::from)
    }

    fn delete_recursive(&mut self, path: &str) -> ProviderResult<()> {
        delete_path(Path::new(path)).map_err(ProviderError::from)
    }

    fn rename(&mut self, from: &str, to: &str) -> ProviderResult<()> {
        move_path(Path::new(from), Path::new(to)).map_err(ProviderError::from)
    }

    fn copy_recursive(&mut self, from: &str, to: &str) -> ProviderResult<()> {
        copy_path(Path::new(from), Path::new(to)).map_err(ProviderError::from)
    }

    fn exists(&mut self, path: &str) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn import_local(
        &mut self,
        local: &Path,
        dest: &str,
        progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        copy_path(local, Path::new(dest))?;
        progress(1.0);
        Ok(())
    }

    fn export_local(
        &mut self,
        src: &str,
        local: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        copy_path(Path::new(src), local)?;
        progress(1.0);
        Ok(())
    }

    fn home_path(&self) -> String {
        self.home.clone()
    }

    fn root_path(&self) -> String {
        Path::new(&self.home)
            .ancestors()
            .last()
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string())
    }

    fn parent_path(&self, path: &str) -> Option<String> {
        Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().into_owned())
    }

    fn join_path(&self, base: &str, name: &str) -> String {
        Path::new(base)
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn base_name(&self, path: &str) -> String {
        Path::new(path)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string())
    }
}

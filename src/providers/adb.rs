//! Device filesystem provider
//!
//! Every operation is a single bridge invocation; listings come back as
//! `ls -la` text and go through [`ListingParser`].

use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};

use crate::fs::{FileEntry, ListingParser, unix_path};
use super::bridge::{Bridge, shell_quote};
use super::{BackendKind, PanelProvider, ProviderResult};

/// Result of a best-effort `stat` on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStat {
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<NaiveDateTime>,
}

/// Provider for the device filesystem
pub struct AdbProvider {
    bridge: Box<dyn Bridge>,
    home: String,
    parser: ListingParser,
}

impl std::fmt::Debug for AdbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdbProvider")
            .field("home", &self.home)
            .finish()
    }
}

impl AdbProvider {
    /// Create a provider issuing its commands through `bridge`
    pub fn new(bridge: Box<dyn Bridge>, home: impl Into<String>) -> Self {
        Self {
            bridge,
            home: home.into(),
            parser: ListingParser::new(),
        }
    }

    /// Use a specific listing parser (tests pin the year this way)
    pub fn with_parser(mut self, parser: ListingParser) -> Self {
        self.parser = parser;
        self
    }

    /// True iff at least one attached device reports the "device" state
    pub fn check_connectivity(&self) -> bool {
        match self.bridge.execute(&["devices"]) {
            Ok(output) => output.lines().any(|line| line.contains("\tdevice")),
            Err(e) => {
                log::debug!("adb devices failed: {}", e);
                false
            }
        }
    }

    /// Run a command in the device shell
    fn shell(&self, args: &[&str]) -> ProviderResult<String> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("shell");
        argv.extend_from_slice(args);
        self.bridge.execute(&argv)
    }

    /// Copy a local file or directory onto the device
    pub fn push(
        &self,
        local: &Path,
        remote: &str,
        on_progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        let local = local.to_string_lossy();
        self.bridge
            .execute_with_progress(&["push", &*local, remote], on_progress)
    }

    /// Copy a device file or directory to the local disk
    pub fn pull(
        &self,
        remote: &str,
        local: &Path,
        on_progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        let local = local.to_string_lossy();
        self.bridge
            .execute_with_progress(&["pull", remote, &*local], on_progress)
    }

    /// `rm -rf` on the device
    pub fn delete(&self, path: &str) -> ProviderResult<()> {
        self.shell(&["rm", "-rf", &shell_quote(path)]).map(drop)
    }

    /// `mkdir -p` on the device
    pub fn make_dir(&self, path: &str) -> ProviderResult<()> {
        self.shell(&["mkdir", "-p", &shell_quote(path)]).map(drop)
    }

    /// Whether `ls <path>` succeeds
    pub fn path_exists(&self, path: &str) -> bool {
        self.shell(&["ls", &shell_quote(path)]).is_ok()
    }

    /// Type, size and mtime of `path`, or None if it can't be determined
    pub fn stat(&self, path: &str) -> Option<RemoteStat> {
        match self.shell(&["stat", "-c", "'%F %s %Y'", &shell_quote(path)]) {
            Ok(output) => parse_stat(&output),
            Err(e) => {
                log::debug!("stat {} failed: {}", path, e);
                None
            }
        }
    }
}

/// Parse `%F %s %Y` output. The file type may contain spaces ("regular file"),
/// so the numeric fields are taken from the right.
fn parse_stat(output: &str) -> Option<RemoteStat> {
    let line = output.lines().find(|l| !l.trim().is_empty())?.trim();
    let mut fields = line.rsplitn(3, ' ');
    let mtime = fields.next()?;
    let size = fields.next()?;
    let file_type = fields.next()?;

    let modified = mtime
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).naive_local());

    Some(RemoteStat {
        is_dir: file_type == "directory",
        size: size.parse().ok()?,
        modified,
    })
}

impl PanelProvider for AdbProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::Adb
    }

    fn is_connected(&mut self) -> bool {
        self.check_connectivity()
    }

    fn list_directory(&mut self, path: &str) -> ProviderResult<Vec<FileEntry>> {
        let path = if path.is_empty() { "/" } else { path };
        // Trailing slash so a symlinked directory lists its contents
        let dir = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        match self.shell(&["ls", "-la", &shell_quote(&dir)]) {
            Ok(output) => Ok(self.parser.parse(&output, path)),
            Err(e) if e.is_not_found() => {
                log::debug!("{} does not exist on device, listing as empty", path);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn mkdir(&mut self, path: &str) -> ProviderResult<()> {
        self.make_dir(path)
    }

    fn delete_recursive(&mut self, path: &str) -> ProviderResult<()> {
        self.delete(path)
    }

    fn rename(&mut self, from: &str, to: &str) -> ProviderResult<()> {
        self.shell(&["mv", &shell_quote(from), &shell_quote(to)]).map(drop)
    }

    fn copy_recursive(&mut self, from: &str, to: &str) -> ProviderResult<()> {
        self.shell(&["cp", "-r", &shell_quote(from), &shell_quote(to)]).map(drop)
    }

    fn exists(&mut self, path: &str) -> bool {
        self.path_exists(path)
    }

    fn import_local(
        &mut self,
        local: &Path,
        dest: &str,
        progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        self.push(local, dest, progress)
    }

    fn export_local(
        &mut self,
        src: &str,
        local: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> ProviderResult<()> {
        self.pull(src, local, progress)
    }

    fn home_path(&self) -> String {
        self.home.clone()
    }

    fn root_path(&self) -> String {
        "/".to_string()
    }

    fn parent_path(&self, path: &str) -> Option<String> {
        unix_path::parent(path)
    }

    fn join_path(&self, base: &str, name: &str) -> String {
        unix_path::join(base, name)
    }

    fn base_name(&self, path: &str) -> String {
        unix_path::base_name(path)
    }
}

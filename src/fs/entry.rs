//! File entry representation shared by the local and adb backends

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};

/// Represents a single file or directory entry in a listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Display name (not full path), symlink arrow already stripped
    pub name: String,
    /// Full path in the namespace of the backend that listed it
    pub path: String,
    /// Whether this entry can be entered like a directory
    pub is_dir: bool,
    /// Whether this is a symbolic link
    pub is_symlink: bool,
    /// Target of symlink, when the listing exposed it
    pub symlink_target: Option<String>,
    /// File size in bytes
    pub size: u64,
    /// Last modification time, absent when it could not be determined
    pub modified: Option<NaiveDateTime>,
    /// Whether this is a hidden file (starts with '.')
    pub is_hidden: bool,
    /// True only for the synthetic ".." row at the top of non-root listings
    pub is_parent: bool,
    /// Mode string as `ls -l` prints it (e.g. "drwxr-xr-x")
    pub permissions: String,
    /// Owner user name
    pub owner: String,
    /// Owner group name
    pub group: String,
}

impl FileEntry {
    /// Create a FileEntry from a local path
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let is_symlink = metadata.is_symlink();
        let symlink_target = if is_symlink {
            fs::read_link(path).ok().map(|t| t.to_string_lossy().into_owned())
        } else {
            None
        };

        // For symlinks, the target decides is_dir and size; a dangling link is a plain file
        let target_metadata = if is_symlink {
            fs::metadata(path).ok()
        } else {
            Some(metadata.clone())
        };

        let is_dir = target_metadata
            .as_ref()
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let size = if is_dir {
            0
        } else {
            target_metadata.as_ref().map(|m| m.len()).unwrap_or(0)
        };

        let modified = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Local>::from(t).naive_local());

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            mode_string(metadata.permissions().mode(), metadata.is_dir(), is_symlink)
        };
        #[cfg(not(unix))]
        let permissions = {
            let kind = if metadata.is_dir() { 'd' } else if is_symlink { 'l' } else { '-' };
            let write = if metadata.permissions().readonly() { '-' } else { 'w' };
            format!("{kind}r{write}-r{write}-r{write}-")
        };

        #[cfg(unix)]
        let (owner, group) = {
            use std::os::unix::fs::MetadataExt;
            (get_username(metadata.uid()), get_groupname(metadata.gid()))
        };
        #[cfg(not(unix))]
        let (owner, group) = (String::new(), String::new());

        Ok(Self {
            is_hidden: name.starts_with('.'),
            name,
            path: path.to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
            symlink_target,
            size,
            modified,
            is_parent: false,
            permissions,
            owner,
            group,
        })
    }

    /// Create the synthetic ".." entry pointing at `parent_path`
    pub fn parent_entry(parent_path: String) -> Self {
        Self {
            name: "..".to_string(),
            path: parent_path,
            is_dir: true,
            is_symlink: false,
            symlink_target: None,
            size: 0,
            modified: None,
            is_hidden: false,
            is_parent: true,
            permissions: String::new(),
            owner: String::new(),
            group: String::new(),
        }
    }

    /// Whether navigation may descend into this entry
    pub fn is_traversable(&self) -> bool {
        self.is_dir || self.is_symlink
    }
}

/// Render Unix mode bits the way `ls -l` does
#[cfg(unix)]
fn mode_string(mode: u32, is_dir: bool, is_symlink: bool) -> String {
    let kind = if is_symlink {
        'l'
    } else if is_dir {
        'd'
    } else {
        '-'
    };

    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Get username from uid (Unix only)
#[cfg(unix)]
fn get_username(uid: u32) -> String {
    use std::ffi::CStr;

    // SAFETY: getpwuid is safe to call with any uid value
    unsafe {
        let pw = libc::getpwuid(uid);
        if pw.is_null() {
            return uid.to_string();
        }
        let name = (*pw).pw_name;
        if name.is_null() {
            return uid.to_string();
        }
        CStr::from_ptr(name)
            .to_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|_| uid.to_string())
    }
}

/// Get group name from gid (Unix only)
#[cfg(unix)]
fn get_groupname(gid: u32) -> String {
    use std::ffi::CStr;

    // SAFETY: getgrgid is safe to call with any gid value
    unsafe {
        let gr = libc::getgrgid(gid);
        if gr.is_null() {
            return gid.to_string();
        }
        let name = (*gr).gr_name;
        if name.is_null() {
            return gid.to_string();
        }
        CStr::from_ptr(name)
            .to_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|_| gid.to_string())
    }
}

use std::io;
use std::path::{Path, PathBuf};

/// Preserve file attributes (permissions, modification time) from src to dest.
/// Best-effort: errors are ignored since the file data is already written.
fn preserve_attributes(src: &Path, dest: &Path) {
    if let Ok(meta) = std::fs::metadata(src) {
        if let Ok(mtime) = meta.modified() {
            let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
        }
        #[cfg(unix)]
        {
            let _ = std::fs::set_permissions(dest, meta.permissions());
        }
    }
}

/// Resolve symlinks and `..` in `path`, which need not exist yet: the
/// longest existing prefix is canonicalized and the rest appended
fn resolve(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        let probe = if existing.as_os_str().is_empty() {
            Path::new(".")
        } else {
            existing
        };
        if let Ok(canonical) = probe.canonicalize() {
            return rest.iter().rev().fold(canonical, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Fail if `dest` is `src` itself or lies inside it. A copy follows a
/// symlinked `src`; a move relocates the link itself.
fn ensure_outside(verb: &str, src: &Path, dest: &Path, follow: bool) -> io::Result<()> {
    let src_real = match (follow, src.parent(), src.file_name()) {
        (false, Some(parent), Some(name)) => resolve(parent).join(name),
        _ => src.canonicalize()?,
    };
    let dest_real = resolve(dest);
    if dest_real.starts_with(&src_real) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "cannot {} '{}' into itself ('{}')",
                verb,
                src.display(),
                dest.display()
            ),
        ));
    }
    Ok(())
}

/// Copy a file or directory recursively, preserving attributes.
/// Copying a path onto itself or into its own subtree is rejected.
pub fn copy_path(src: &Path, dest: &Path) -> std::io::Result<()> {
    ensure_outside("copy", src, dest, true)?;
    if src.is_dir() {
        copy_dir_recursive(src, dest)
    } else {
        std::fs::copy(src, dest)?;
        preserve_attributes(src, dest);
        Ok(())
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path)?;
            preserve_attributes(&src_path, &dest_path);
        }
    }

    // Done last so mtime isn't changed by creating children
    preserve_attributes(src, dest);

    Ok(())
}

/// Move a file or directory
pub fn move_path(src: &Path, dest: &Path) -> std::io::Result<()> {
    ensure_outside("move", src, dest, false)?;
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            copy_path(src, dest)?;
            delete_path(src)
        }
        Err(e) => Err(e),
    }
}

/// Delete a file or directory
pub fn delete_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

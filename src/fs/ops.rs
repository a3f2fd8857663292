//! Local filesystem enumeration

use std::fs;
use std::io;
use std::path::Path;

use super::entry::FileEntry;

/// Read directory contents and return a list of FileEntry.
/// The synthetic ".." entry is not included; the panel adds it.
pub fn read_directory(path: &Path) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        match FileEntry::from_path(&entry.path()) {
            Ok(file_entry) => entries.push(file_entry),
            Err(e) => {
                // Permission denied, vanished between readdir and stat, etc.
                log::warn!("Skipping {}: {}", entry.path().display(), e);
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_directory_lists_children_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut names: Vec<String> = read_directory(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[test]
    fn test_read_directory_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_directory(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

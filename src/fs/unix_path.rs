//! Path arithmetic for the device side, which is always '/'-separated
//! regardless of the host platform.

/// Collapse "." / ".." / duplicate separators into an absolute path
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Parent of `path`, or None at "/"
pub fn parent(path: &str) -> Option<String> {
    let normalized = normalize(path);
    if normalized == "/" {
        return None;
    }
    let mut parts: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    parts.pop();
    if parts.is_empty() {
        Some("/".to_string())
    } else {
        Some(format!("/{}", parts.join("/")))
    }
}

pub fn join(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Last path segment ("/" for the root itself)
pub fn base_name(path: &str) -> String {
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("/")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_clamps_at_root() {
        assert_eq!(parent("/sdcard/DCIM/Camera"), Some("/sdcard/DCIM".to_string()));
        assert_eq!(parent("/sdcard"), Some("/".to_string()));
        assert_eq!(parent("/sdcard/"), Some("/".to_string()));
        assert_eq!(parent("/"), None);
    }

    #[test]
    fn test_join_and_base_name() {
        assert_eq!(join("/", "sdcard"), "/sdcard");
        assert_eq!(join("/sdcard", "a.txt"), "/sdcard/a.txt");
        assert_eq!(base_name("/sdcard/Download/"), "Download");
        assert_eq!(base_name("/"), "/");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/sdcard/./DCIM/../Music//"), "/sdcard/Music");
        assert_eq!(normalize(""), "/");
    }
}

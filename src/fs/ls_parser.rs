//! Parser for the long-listing output of the device's `ls -la`
//!
//! Android ships different `ls` implementations depending on the release
//! (toybox, toolbox, busybox), and they disagree on the column layout:
//! - numeric or symbolic owner/group
//! - with or without a link-count column
//! - ISO dates (`2024-01-15 10:30`) or BSD dates (`Jan 15 10:30` / `Jan 15  2023`)
//!
//! Each row is tried against an ordered chain of patterns, most field-rich
//! first. Rows that match nothing (warnings, "Permission denied" noise) are
//! dropped without failing the listing.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};

use super::entry::FileEntry;
use super::unix_path;

const PERMS: &str = r"(?P<perms>[-a-zA-Z]{10}[.+@]?)";
const ISO_DATE: &str = r"(?P<iso>\d{4}-\d{2}-\d{2}\s+\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)";
const BSD_DATE: &str = r"(?P<bsd>[A-Za-z]{3}\s+\d{1,2}\s+(?:\d{1,2}:\d{2}|\d{4}))";

const SYMLINK_ARROW: &str = " -> ";

/// One row shape of the listing
struct LinePattern {
    name: &'static str,
    regex: Regex,
}

fn line_pattern(name: &'static str, with_links: bool, date: &str) -> Option<LinePattern> {
    let links = if with_links { r"\s+(?P<links>\d+)" } else { "" };
    let source = format!(
        r"^{PERMS}{links}\s+(?P<owner>\S+)\s+(?P<group>\S+)\s+(?P<size>\S+)\s+{date}\s+(?P<name>.+)$"
    );
    Regex::new(&source).ok().map(|regex| LinePattern { name, regex })
}

/// Try order matters: a line that fits several shapes takes the first one
static PATTERNS: LazyLock<Vec<LinePattern>> = LazyLock::new(|| {
    [
        line_pattern("links+iso", true, ISO_DATE),
        line_pattern("links+bsd", true, BSD_DATE),
        line_pattern("iso", false, ISO_DATE),
        line_pattern("bsd", false, BSD_DATE),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Converts raw `ls -la` text into entries
#[derive(Debug, Clone, Copy)]
pub struct ListingParser {
    /// Year assumed for BSD dates that only carry a time of day
    current_year: i32,
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingParser {
    pub fn new() -> Self {
        Self {
            current_year: Local::now().year(),
        }
    }

    /// Parser with a fixed "current year", for reproducible results
    pub fn with_year(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Parse the whole output of `ls -la <base_path>`.
    /// `.` and `..` are excluded; unrecognised rows are skipped.
    pub fn parse(&self, output: &str, base_path: &str) -> Vec<FileEntry> {
        output
            .lines()
            .filter_map(|line| self.parse_line(line, base_path))
            .collect()
    }

    /// Parse a single row, or None if it is not an entry row
    pub fn parse_line(&self, line: &str, base_path: &str) -> Option<FileEntry> {
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with("total ") {
            return None;
        }

        let Some((pattern, caps)) = PATTERNS
            .iter()
            .find_map(|p| p.regex.captures(line).map(|caps| (p, caps)))
        else {
            log::trace!("ls: dropping unrecognised line {:?}", line);
            return None;
        };
        log::trace!("ls: line matched {} pattern", pattern.name);

        self.entry_from_captures(&caps, base_path)
    }

    fn entry_from_captures(&self, caps: &Captures<'_>, base_path: &str) -> Option<FileEntry> {
        let permissions = caps.name("perms")?.as_str();
        let raw_name = caps.name("name")?.as_str();

        let is_symlink = permissions.starts_with('l');
        let is_dir = permissions.starts_with('d') || is_symlink;

        let (name, symlink_target) = match raw_name.split_once(SYMLINK_ARROW) {
            Some((name, target)) if is_symlink => (name, Some(target.to_string())),
            _ => (raw_name, None),
        };

        if name == "." || name == ".." {
            return None;
        }
        // `ls -la <link>` describes the link itself under its full path
        if name.contains('/') {
            log::trace!("ls: dropping row for path {:?}", name);
            return None;
        }

        let modified = if let Some(iso) = caps.name("iso") {
            parse_iso_date(iso.as_str())
        } else {
            caps.name("bsd")
                .and_then(|bsd| parse_bsd_date(bsd.as_str(), self.current_year))
        };

        Some(FileEntry {
            name: name.to_string(),
            path: unix_path::join(base_path, name),
            is_dir,
            is_symlink,
            symlink_target,
            size: parse_size(caps.name("size").map(|m| m.as_str()).unwrap_or("")),
            modified,
            is_hidden: name.starts_with('.'),
            is_parent: false,
            permissions: permissions.to_string(),
            owner: caps.name("owner").map(|m| m.as_str().to_string()).unwrap_or_default(),
            group: caps.name("group").map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
    }
}

/// Size column with digit-grouping separators stripped; 0 when not numeric
fn parse_size(raw: &str) -> u64 {
    let is_grouping = |c: char| matches!(c, ',' | '.' | '\'' | '_');
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit() || is_grouping(c)) {
        return 0;
    }
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Split on any run of whitespace and rejoin with single spaces
fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `YYYY-MM-DD HH:MM[:SS[.frac]]`
fn parse_iso_date(raw: &str) -> Option<NaiveDateTime> {
    let text = collapse_whitespace(raw);
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// `Mon DD HH:MM` (current year) or `Mon DD YYYY` (midnight)
fn parse_bsd_date(raw: &str, current_year: i32) -> Option<NaiveDateTime> {
    let text = collapse_whitespace(raw);
    let mut parts = text.split(' ');
    let month = parts.next()?;
    let day = parts.next()?;
    let last = parts.next()?;

    if let Some((hour, minute)) = last.split_once(':') {
        let date = NaiveDate::parse_from_str(&format!("{month} {day} {current_year}"), "%b %d %Y").ok()?;
        date.and_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
    } else {
        let date = NaiveDate::parse_from_str(&format!("{month} {day} {last}"), "%b %d %Y").ok()?;
        date.and_hms_opt(0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(PATTERNS.len(), 4);
    }

    #[test]
    fn test_gnu_style_directory() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("drwxr-xr-x 2 user user 4096 2024-01-15 10:30 Documents", "/sdcard")
            .unwrap();
        assert_eq!(entry.name, "Documents");
        assert_eq!(entry.path, "/sdcard/Documents");
        assert!(entry.is_dir);
        assert!(!entry.is_symlink);
        assert_eq!(entry.size, 4096);
        assert_eq!(entry.modified, Some(dt(2024, 1, 15, 10, 30)));
        assert_eq!(entry.owner, "user");
        assert_eq!(entry.permissions, "drwxr-xr-x");
    }

    #[test]
    fn test_bsd_style_symlink() {
        let parser = ListingParser::with_year(2025);
        let entry = parser
            .parse_line("lrwxrwxrwx 1 user user 11 Jan 15 10:30 link -> target", "/")
            .unwrap();
        assert_eq!(entry.name, "link");
        assert_eq!(entry.path, "/link");
        assert!(entry.is_symlink);
        assert!(entry.is_dir);
        assert_eq!(entry.symlink_target.as_deref(), Some("target"));
        assert_eq!(entry.modified, Some(dt(2025, 1, 15, 10, 30)));
    }

    #[test]
    fn test_bsd_date_with_year() {
        let parser = ListingParser::with_year(2025);
        let entry = parser
            .parse_line("-rw-r--r-- 1 root root 1,234,567 Mar  3  2021 old.bin", "/data")
            .unwrap();
        assert_eq!(entry.size, 1_234_567);
        assert_eq!(entry.modified, Some(dt(2021, 3, 3, 0, 0)));
        assert!(!entry.is_dir);
    }

    #[test]
    fn test_no_link_count_dialect() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("-rw-rw---- root sdcard_rw 52 2023-11-02 08:05 notes.txt", "/sdcard")
            .unwrap();
        assert_eq!(entry.name, "notes.txt");
        assert_eq!(entry.owner, "root");
        assert_eq!(entry.group, "sdcard_rw");
        assert_eq!(entry.size, 52);
        assert_eq!(entry.modified, Some(dt(2023, 11, 2, 8, 5)));
    }

    #[test]
    fn test_numeric_owner_without_link_count() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("drwxrwx--x 1000 1000 3452 2024-02-01 12:00 Android", "/sdcard")
            .unwrap();
        assert_eq!(entry.owner, "1000");
        assert_eq!(entry.group, "1000");
        assert_eq!(entry.size, 3452);
    }

    #[test]
    fn test_unparseable_date_keeps_row() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("-rw-r--r-- 1 u g 10 2024-13-45 10:30 weird", "/")
            .unwrap();
        assert_eq!(entry.name, "weird");
        assert_eq!(entry.modified, None);
    }

    #[test]
    fn test_non_numeric_size_is_zero() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("-rw-r--r-- 1 u g ? 2024-01-01 00:00 mystery", "/")
            .unwrap();
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_skips_total_dots_and_noise() {
        let output = "total 24\n\
            drwxr-xr-x 4 root root 4096 2024-01-15 10:30 .\n\
            drwxr-xr-x 20 root root 4096 2024-01-15 10:30 ..\n\
            ls: ./secret: Permission denied\n\
            \n\
            -rw-r--r-- 1 root root 7 2024-01-15 10:31 a.txt\r\n\
            drwxr-xr-x 2 root root 4096 2024-01-15 10:32 .config\n";
        let entries = ListingParser::with_year(2024).parse(output, "/data/local/tmp");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", ".config"]);
        assert!(entries[1].is_hidden);
        assert_eq!(entries[0].path, "/data/local/tmp/a.txt");
    }

    #[test]
    fn test_arrow_in_regular_file_name_is_kept() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("-rw-r--r-- 1 u g 3 2024-01-01 00:00 a -> b", "/")
            .unwrap();
        assert_eq!(entry.name, "a -> b");
        assert_eq!(entry.symlink_target, None);
    }

    #[test]
    fn test_name_with_spaces() {
        let parser = ListingParser::with_year(2024);
        let entry = parser
            .parse_line("-rw-r--r-- 1 u g 3 Feb  9 09:15 My Holiday Photo.jpg", "/sdcard/DCIM")
            .unwrap();
        assert_eq!(entry.name, "My Holiday Photo.jpg");
        assert_eq!(entry.path, "/sdcard/DCIM/My Holiday Photo.jpg");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let output = "total 8\n\
            drwxr-xr-x 2 user user 4096 2024-01-15 10:30 Documents\n\
            lrwxrwxrwx 1 user user 11 Jan 15 10:30 link -> target\n\
            -rw-r--r-- root root 12 Dec 31  2020 z.log\n";
        let parser = ListingParser::with_year(2024);
        let first = parser.parse(output, "/sdcard");
        let second = parser.parse(output, "/sdcard");
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096"), 4096);
        assert_eq!(parse_size("1,024"), 1024);
        assert_eq!(parse_size("1'024'000"), 1_024_000);
        assert_eq!(parse_size("12K"), 0);
        assert_eq!(parse_size(""), 0);
    }

    #[test]
    fn test_rows_naming_a_path_are_dropped() {
        let parser = ListingParser::with_year(2024);
        let line = "lrw-r--r-- 1 root root 21 2024-01-10 08:00 /sdcard -> /storage/self/primary";
        assert_eq!(parser.parse_line(line, "/sdcard"), None);
    }
}

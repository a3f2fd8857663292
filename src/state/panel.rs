//! Panel data structures and logic

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::fs::FileEntry;
use crate::ops::TransferItem;
use crate::providers::{BackendKind, LocalProvider, PanelProvider};
use crate::utils::format_size;

/// Receives status-line messages from a panel
pub trait StatusSink {
    fn notify(&mut self, message: &str);
}

impl<F: FnMut(&str)> StatusSink for F {
    fn notify(&mut self, message: &str) {
        self(message)
    }
}

/// Order a listing: directories by name, then files by name.
/// The parent pseudo-entry, if present, stays first.
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        if a.is_parent != b.is_parent {
            return if a.is_parent { Ordering::Less } else { Ordering::Greater };
        }
        if a.is_dir != b.is_dir {
            return if a.is_dir { Ordering::Less } else { Ordering::Greater };
        }
        a.name.cmp(&b.name)
    });
}

/// A single file panel
pub struct Panel {
    /// Current directory path in the bound backend's namespace
    pub path: String,
    /// Entries in display order; ".." first when not at the root
    pub entries: Vec<FileEntry>,
    /// Cursor position (index into entries)
    pub cursor: usize,
    /// Scroll offset for display
    pub scroll_offset: usize,
    /// Rows available for the listing, used to keep the cursor visible
    pub visible_height: usize,
    /// Selected entry paths, always a subset of the current entries
    selected: HashSet<String>,
    /// Show hidden files (starting with .)
    show_hidden: bool,
    /// Names unique to this panel while diff mode is on
    diff: Option<HashSet<String>>,
    provider: Box<dyn PanelProvider>,
    /// The other backend, swapped in by `switch_backend`
    standby: Option<Box<dyn PanelProvider>>,
    status: Box<dyn StatusSink>,
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("path", &self.path)
            .field("kind", &self.provider.kind())
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("selected", &self.selected.len())
            .finish()
    }
}

impl Panel {
    /// Create a panel at the provider's home directory and list it
    pub fn new(
        provider: Box<dyn PanelProvider>,
        standby: Option<Box<dyn PanelProvider>>,
        status: Box<dyn StatusSink>,
        show_hidden: bool,
    ) -> Self {
        let path = provider.home_path();
        Self::at_path(provider, standby, status, show_hidden, path)
    }

    /// Create a panel at an explicit path and list it
    pub fn at_path(
        provider: Box<dyn PanelProvider>,
        standby: Option<Box<dyn PanelProvider>>,
        status: Box<dyn StatusSink>,
        show_hidden: bool,
        path: impl Into<String>,
    ) -> Self {
        let mut panel = Self {
            path: path.into(),
            entries: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            visible_height: 20,
            selected: HashSet::new(),
            show_hidden,
            diff: None,
            provider,
            standby,
            status,
        };
        panel.refresh();
        panel
    }

    /// Which backend the panel is bound to
    pub fn kind(&self) -> BackendKind {
        self.provider.kind()
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    /// Temporarily extract the provider, replacing it with a dummy LocalProvider.
    /// Use `restore_provider()` to put the real provider back.
    pub fn take_provider(&mut self) -> Box<dyn PanelProvider> {
        std::mem::replace(&mut self.provider, Box::new(LocalProvider::new()))
    }

    /// Restore a previously taken provider.
    pub fn restore_provider(&mut self, provider: Box<dyn PanelProvider>) {
        self.provider = provider;
    }

    /// List `path` through the provider, filtered and sorted, with ".."
    /// prepended when the path has a parent
    fn load(&mut self, path: &str) -> crate::providers::ProviderResult<Vec<FileEntry>> {
        let mut entries: Vec<FileEntry> = self
            .provider
            .list_directory(path)?
            .into_iter()
            .filter(|e| self.show_hidden || !e.is_hidden)
            .collect();
        sort_entries(&mut entries);

        if let Some(parent) = self.provider.parent_path(path) {
            entries.insert(0, FileEntry::parent_entry(parent));
        }
        Ok(entries)
    }

    /// Re-list the current directory. On failure the previous entries stay
    /// and the error goes to the status sink. A successful re-list ends diff
    /// mode, since the unique names were computed against the old listing.
    pub fn refresh(&mut self) {
        let path = self.path.clone();
        match self.load(&path) {
            Ok(entries) => {
                self.entries = entries;
                if self.diff.take().is_some() {
                    log::debug!("diff mode ended by refresh of {}", path);
                }
                let present: HashSet<&str> = self.entries.iter().map(|e| e.path.as_str()).collect();
                self.selected.retain(|p| present.contains(p.as_str()));
                if self.cursor >= self.entries.len() {
                    self.cursor = self.entries.len().saturating_sub(1);
                }
                self.adjust_scroll();
            }
            Err(e) => {
                log::warn!("refresh of {} failed: {}", path, e);
                self.status.notify(&format!("Error: {}", e));
            }
        }
    }

    /// Change to a new directory
    /// Returns true if successful
    pub fn change_directory(&mut self, new_path: impl Into<String>) -> bool {
        let new_path = new_path.into();
        match self.load(&new_path) {
            Ok(entries) => {
                log::debug!("{} panel: {} -> {}", self.kind().label(), self.path, new_path);
                self.path = new_path;
                self.entries = entries;
                self.reset_view();
                true
            }
            Err(e) => {
                self.status
                    .notify(&format!("Error: cannot enter '{}': {}", new_path, e));
                false
            }
        }
    }

    fn reset_view(&mut self) {
        self.cursor = 0;
        self.scroll_offset = 0;
        self.selected.clear();
        self.diff = None;
    }

    /// Open `entry`: ".." goes up, directories and symlinks are entered,
    /// anything else is ignored. Returns true if the directory changed.
    pub fn navigate_into(&mut self, entry: &FileEntry) -> bool {
        if entry.is_parent {
            return self.navigate_up();
        }
        if !entry.is_traversable() {
            return false;
        }
        self.change_directory(entry.path.clone())
    }

    /// Enter the entry under the cursor
    pub fn enter_selected(&mut self) -> bool {
        match self.current().cloned() {
            Some(entry) => self.navigate_into(&entry),
            None => false,
        }
    }

    /// Go to parent directory
    /// Returns true if successful, false if already at root
    pub fn navigate_up(&mut self) -> bool {
        let Some(parent) = self.provider.parent_path(&self.path) else {
            return false;
        };
        let current_name = self.provider.base_name(&self.path);

        if !self.change_directory(parent) {
            return false;
        }

        // Position cursor on the directory we just left
        if let Some(i) = self
            .entries
            .iter()
            .position(|e| !e.is_parent && e.name == current_name)
        {
            self.cursor = i;
            self.adjust_scroll();
        }
        true
    }

    pub fn navigate_home(&mut self) -> bool {
        let home = self.provider.home_path();
        self.change_directory(home)
    }

    pub fn navigate_root(&mut self) -> bool {
        let root = self.provider.root_path();
        self.change_directory(root)
    }

    pub fn navigate_to(&mut self, path: &str) -> bool {
        self.change_directory(path)
    }

    /// Get the entry under the cursor
    pub fn current(&self) -> Option<&FileEntry> {
        self.entries.get(self.cursor)
    }

    /// Ensure scroll offset keeps cursor visible
    fn adjust_scroll(&mut self) {
        let visible = self.visible_height;
        if visible == 0 {
            return;
        }

        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible {
            self.scroll_offset = self.cursor - visible + 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.adjust_scroll();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            self.adjust_scroll();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
        self.adjust_scroll();
    }

    pub fn move_end(&mut self) {
        self.cursor = self.entries.len().saturating_sub(1);
        self.adjust_scroll();
    }

    /// Toggle selection of the current entry and move to the next
    pub fn toggle_selection(&mut self) {
        if let Some(entry) = self.current()
            && !entry.is_parent
        {
            let path = entry.path.clone();
            if !self.selected.remove(&path) {
                self.selected.insert(path);
            }
        }
        self.move_down();
    }

    pub fn select_all(&mut self) {
        self.selected = self
            .entries
            .iter()
            .filter(|e| !e.is_parent)
            .map(|e| e.path.clone())
            .collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    /// Selected entries in display order
    pub fn selected_entries(&self) -> Vec<&FileEntry> {
        self.entries
            .iter()
            .filter(|e| self.selected.contains(&e.path))
            .collect()
    }

    /// Items a copy/move/delete should act on: the selection, or the entry
    /// under the cursor when nothing is selected. Never includes "..".
    pub fn transfer_targets(&self) -> Vec<TransferItem> {
        let as_item = |e: &FileEntry| TransferItem {
            path: e.path.clone(),
            is_dir: e.is_dir,
        };

        if self.selected.is_empty() {
            self.current()
                .filter(|e| !e.is_parent)
                .map(as_item)
                .into_iter()
                .collect()
        } else {
            self.selected_entries().into_iter().map(as_item).collect()
        }
    }

    /// Toggle show hidden files
    pub fn toggle_hidden_files(&mut self) {
        self.show_hidden = !self.show_hidden;
        self.refresh();
        let state = if self.show_hidden { "shown" } else { "hidden" };
        self.status.notify(&format!("Hidden files: {}", state));
    }

    /// Swap in the standby backend at its home directory.
    /// Returns false when the panel has no second backend.
    pub fn switch_backend(&mut self) -> bool {
        let Some(next) = self.standby.take() else {
            self.status.notify("No other backend available");
            return false;
        };
        let previous = std::mem::replace(&mut self.provider, next);
        self.standby = Some(previous);

        self.path = self.provider.home_path();
        self.entries.clear();
        self.reset_view();
        self.refresh();
        self.status
            .notify(&format!("Switched to {} mode", self.kind().label()));
        true
    }

    /// Names of all real entries (no "..")
    pub fn file_names(&self) -> HashSet<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_parent)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Turn on diff mode against the other panel's names.
    /// Returns how many names are unique to this panel.
    pub fn enable_diff(&mut self, other_names: &HashSet<String>) -> usize {
        let unique: HashSet<String> = self
            .file_names()
            .into_iter()
            .filter(|name| !other_names.contains(name))
            .collect();
        let count = unique.len();
        self.diff = Some(unique);
        count
    }

    pub fn disable_diff(&mut self) {
        self.diff = None;
    }

    pub fn is_diff_mode(&self) -> bool {
        self.diff.is_some()
    }

    /// Names unique to this panel, if diff mode is on
    pub fn diff_unique(&self) -> Option<&HashSet<String>> {
        self.diff.as_ref()
    }

    /// Whether `entry` is highlighted as unique by diff mode
    pub fn is_diff_unique(&self, entry: &FileEntry) -> bool {
        self.diff.as_ref().is_some_and(|d| d.contains(&entry.name))
    }

    /// Replace the selection with exactly the diff-unique entries.
    /// Returns false when diff mode is off.
    pub fn select_diff_unique_only(&mut self) -> bool {
        let Some(unique) = &self.diff else {
            return false;
        };
        self.selected = self
            .entries
            .iter()
            .filter(|e| !e.is_parent && unique.contains(&e.name))
            .map(|e| e.path.clone())
            .collect();
        true
    }

    /// Total number of entries (including ..)
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Count of directories (excluding ..)
    pub fn dir_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_dir && !e.is_parent).count()
    }

    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_dir).count()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Total size of selected entries
    pub fn selected_size(&self) -> u64 {
        self.selected_entries().iter().map(|e| e.size).sum()
    }

    /// Footer line: "12 items" or "12 items | 3 selected (1.5K)"
    pub fn summary(&self) -> String {
        let mut line = format!("{} items", self.entry_count());
        if !self.selected.is_empty() {
            line.push_str(&format!(
                " | {} selected ({})",
                self.selected_count(),
                format_size(self.selected_size())
            ));
        }
        line
    }
}

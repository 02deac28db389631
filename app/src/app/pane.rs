use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::dir_list::DirectoryListing;
use super::entry::FileEntry;
use super::types::{FilterKind, SortKey, SortOrder, ViewStyle};

/// Selection lives at process scope so a set selected in tab A can be
/// pasted from tab B. Keys are absolute paths, never entry references.
static SELECTED: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Serialises tests that touch the process-global selection set; the test
/// harness runs modules in parallel.
#[cfg(test)]
pub(crate) static SELECTION_TEST_LOCK: Mutex<()> = Mutex::new(());

#[cfg(test)]
pub(crate) fn selection_test_guard() -> std::sync::MutexGuard<'static, ()> {
    SELECTION_TEST_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// One tab's view of the filesystem: a directory listing plus cursor,
/// scroll and view-style state.
///
/// Invariants: `0 <= cursor < max(1, count)`; an empty listing pins the
/// cursor at 0. The `recenter` bit tells the renderer whether to recompute
/// the top-of-screen row around the cursor or scroll incrementally.
pub struct PaneState {
    dir: DirectoryListing,
    path: PathBuf,
    last_path: PathBuf,
    cursor: usize,
    top: usize,
    recenter: bool,
    view: ViewStyle,
    height: usize,
}

impl PaneState {
    pub fn new(
        path: &Path,
        view: ViewStyle,
        sort_key: SortKey,
        sort_order: SortOrder,
        filter_kind: FilterKind,
    ) -> io::Result<Self> {
        let mut dir = DirectoryListing::new(sort_key, sort_order, filter_kind);
        dir.open(path, None)?;
        Ok(PaneState {
            dir,
            path: path.to_path_buf(),
            last_path: path.to_path_buf(),
            cursor: 0,
            top: 0,
            recenter: true,
            view,
            height: 25,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_path(&self) -> &Path {
        &self.last_path
    }

    pub fn count(&self) -> usize {
        self.dir.count()
    }

    pub fn is_empty(&self) -> bool {
        self.dir.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_height(&mut self, height: usize) {
        if self.height != height {
            self.height = height;
            self.recenter = true;
        }
    }

    pub fn view(&self) -> ViewStyle {
        self.view
    }

    pub fn set_view(&mut self, view: ViewStyle) {
        self.view = view;
    }

    pub fn entry(&self, i: usize) -> Arc<FileEntry> {
        self.dir.at(i)
    }

    /// Entry under the cursor, `None` when the listing is empty.
    pub fn current(&self) -> Option<Arc<FileEntry>> {
        self.dir.get(self.cursor)
    }

    pub fn current_name(&self) -> Option<String> {
        self.current().map(|e| e.name.clone())
    }

    // ------------------------------------------------------------------
    // Navigation

    /// Open `path`. On success the previous path is remembered, the filter
    /// is cleared and the cursor resets to 0.
    pub fn set_path(&mut self, path: &Path) -> io::Result<()> {
        self.dir.open(path, None)?;
        self.last_path = std::mem::replace(&mut self.path, path.to_path_buf());
        self.set_cursor(0);
        Ok(())
    }

    /// Walk one component up, continuing upward past unreadable parents
    /// until an open succeeds or root is reached. Restores the cursor on
    /// the directory that was left.
    pub fn up_dir(&mut self) -> io::Result<()> {
        let old = self.path.clone();
        let mut parent = match old.parent() {
            Some(p) => p.to_path_buf(),
            None => return Ok(()),
        };

        loop {
            match self.set_path(&parent.clone()) {
                Ok(()) => break,
                Err(e) => match parent.parent() {
                    Some(p) => parent = p.to_path_buf(),
                    None => return Err(e),
                },
            }
        }

        if let Some(name) = old.file_name().and_then(|n| n.to_str()) {
            if let Some(pos) = self.dir.position_of(name) {
                self.set_cursor(pos);
            }
        }
        Ok(())
    }

    /// Re-read the current directory, keeping the cursor on the focused
    /// filename and preserving its screen-relative row when possible.
    pub fn reload(&mut self) {
        if self.dir.is_empty() {
            let _ = self.set_path(&self.path.clone());
            self.set_cursor(0);
            return;
        }

        let name = self.current_name();
        let row = self.cursor.saturating_sub(self.top);

        if self.set_path(&self.path.clone()).is_err() {
            return;
        }

        match name.as_deref().and_then(|n| self.dir.position_of(n)) {
            Some(pos) => {
                self.cursor = pos;
                self.top = pos.saturating_sub(row);
                self.recenter = false;
            }
            None => self.set_cursor(0),
        }
    }

    /// Re-read without touching cursor bookkeeping beyond clamping.
    /// Used after synchronous operations (rename, chmod, create).
    pub fn refresh(&mut self) {
        let _ = self.dir.open(&self.path.clone(), None);
        self.clamp_cursor();
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos;
        self.recenter = true;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let count = self.dir.count();
        if count == 0 {
            self.cursor = 0;
        } else if self.cursor >= count {
            self.cursor = count - 1;
        }
    }

    pub fn cursor_next(&mut self) -> bool {
        if self.cursor + 1 < self.dir.count() {
            self.cursor += 1;
            self.recenter = false;
            true
        } else {
            false
        }
    }

    pub fn cursor_prev(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.recenter = false;
            true
        } else {
            false
        }
    }

    /// Half a screen down, clamped to the last entry.
    pub fn page_down(&mut self) -> bool {
        let count = self.dir.count();
        if count == 0 {
            return false;
        }
        let step = self.height / 2;
        if self.cursor + step < count - 1 {
            self.cursor += step;
        } else if self.cursor != count - 1 {
            self.cursor = count - 1;
        } else {
            return false;
        }
        self.recenter = true;
        true
    }

    pub fn page_up(&mut self) -> bool {
        let step = self.height / 2;
        if self.cursor > step {
            self.cursor -= step;
        } else if self.cursor != 0 {
            self.cursor = 0;
        } else {
            return false;
        }
        self.recenter = true;
        true
    }

    pub fn cursor_first(&mut self) {
        self.set_cursor(0);
    }

    pub fn cursor_last(&mut self) {
        let count = self.dir.count();
        self.set_cursor(count.saturating_sub(1));
    }

    /// `H`: move the cursor to the top row of the visible window.
    pub fn cursor_top_of_screen(&mut self) {
        if self.dir.is_empty() {
            return;
        }
        self.cursor = self.top;
        self.recenter = false;
        self.clamp_cursor();
    }

    /// `M`: middle of the visible window.
    pub fn cursor_middle_of_screen(&mut self) {
        let count = self.dir.count();
        if count == 0 {
            return;
        }
        let mut pos = self.top + self.height / 2;
        if self.top + self.height > count {
            pos = (count / 2).saturating_sub(1);
        }
        self.cursor = pos.min(count - 1);
        self.recenter = false;
    }

    /// `L`: bottom of the visible window.
    pub fn cursor_bottom_of_screen(&mut self) {
        let count = self.dir.count();
        if count == 0 {
            return;
        }
        let mut pos = self.top + self.height.saturating_sub(1);
        if self.top + self.height > count {
            pos = count - 1;
        }
        self.cursor = pos.min(count - 1);
        self.recenter = false;
    }

    /// Recompute the top-of-screen row for this frame. Called by the
    /// controller before rendering; the renderer itself only reads `top`.
    pub fn update_scroll(&mut self) {
        let count = self.dir.count();
        let height = self.height.max(1);

        if self.recenter {
            let top = if self.cursor > height / 2 {
                if self.cursor + height / 2 < count {
                    self.cursor - height / 2
                } else {
                    count.saturating_sub(height)
                }
            } else {
                0
            };
            self.top = top;
            self.recenter = false;
            return;
        }

        // Incremental: nudge the window until the cursor is visible.
        if self.top + height <= self.cursor {
            self.top = self.cursor + 1 - height;
        } else if self.top > self.cursor {
            self.top = self.cursor;
        }
        if count <= height {
            self.top = 0;
        }
    }

    // ------------------------------------------------------------------
    // Filter / sort / hidden, preserving the focused filename

    pub fn sort_key(&self) -> SortKey {
        self.dir.sort_key()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.dir.sort_order()
    }

    pub fn sort(&mut self, key: SortKey, order: SortOrder) {
        if self.dir.sort_key() == key && self.dir.sort_order() == order {
            return;
        }
        let name = self.current_name();
        self.dir.set_sort(key, order);
        self.restore_cursor(name.as_deref());
    }

    pub fn filter(&self) -> String {
        self.dir.filter().to_string()
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.dir.filter_kind()
    }

    pub fn set_filter(&mut self, filter: &str, kind: FilterKind) {
        self.dir.set_filter(filter, kind);
        self.set_cursor(0);
    }

    pub fn hidden(&self) -> bool {
        self.dir.hidden()
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if self.dir.hidden() == hidden {
            return;
        }
        let name = self.current_name();
        self.dir.set_hidden(hidden);
        self.restore_cursor(name.as_deref());
    }

    fn restore_cursor(&mut self, name: Option<&str>) {
        match name.and_then(|n| self.dir.position_of(n)) {
            Some(pos) => self.set_cursor(pos),
            None => self.set_cursor(0),
        }
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.dir.position_of(name)
    }

    // ------------------------------------------------------------------
    // Selection (process-wide)

    pub fn is_selected(entry: &FileEntry) -> bool {
        SELECTED.lock().unwrap().contains(&entry.path())
    }

    pub fn select(entry: &FileEntry) {
        SELECTED.lock().unwrap().insert(entry.path());
    }

    pub fn unselect(entry: &FileEntry) {
        SELECTED.lock().unwrap().remove(&entry.path());
    }

    pub fn toggle_select(entry: &FileEntry) {
        let mut set = SELECTED.lock().unwrap();
        let path = entry.path();
        if !set.remove(&path) {
            set.insert(path);
        }
    }

    /// Invert the selection over the entries currently listed.
    pub fn invert_selection(&self) {
        let mut set = SELECTED.lock().unwrap();
        for i in 0..self.dir.count() {
            let path = self.dir.at(i).path();
            if !set.remove(&path) {
                set.insert(path);
            }
        }
    }

    pub fn clear_selection() {
        SELECTED.lock().unwrap().clear();
    }

    pub fn selected_paths() -> Vec<PathBuf> {
        let mut v: Vec<PathBuf> = SELECTED.lock().unwrap().iter().cloned().collect();
        v.sort();
        v
    }

    pub fn selected_count() -> usize {
        SELECTED.lock().unwrap().len()
    }
}

//! The controller: owns the four panes, the preview engine, the task
//! queue and the clipboard, and interprets every key the event loop hands
//! it.

pub mod event_loop;
pub mod handlers;
pub mod picker;
pub mod plugins;
pub mod spawn;
pub mod terminal;

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app::pane::PaneState;
use crate::app::settings::{self, Config, Plugin};
use crate::app::types::{
    Clipboard, ClipboardOp, FilterKind, PickerMode, SortKey, SortOrder, ViewStyle,
};
use crate::highlight::SyntaxSet;
use crate::preview::PreviewEngine;
use crate::tasks::TaskQueue;

pub const TAB_MAX: usize = 4;
pub const TMP_FILENAME: &str = "/tmp/minase_tmp";
/// How long a status-line info message stays visible.
pub const INFO_TTL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Bookmarks,
    Plugins,
}

/// Single-keypress questions shown on the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharPromptKind {
    Quit,
    DeleteConfirm,
    SortKeySelect,
    SortOrderSelect { key: SortKey },
    CreateKind { name: String },
    ArchiveOpen,
    OpenWithMode { cmd: String },
    FilterKindSelect,
}

/// What the line editor's committed buffer means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Rename,
    CreateName,
    Filter,
    OpenWith,
    ArchiveName,
    PluginText { index: usize },
}

/// Line-editor state for the bottom input row.
#[derive(Debug, Clone)]
pub struct InputState {
    pub prompt: String,
    pub buffer: String,
    /// Byte offset into `buffer`, always on a char boundary.
    pub cursor: usize,
    pub kind: InputKind,
    /// Candidates for Tab completion.
    pub completions: Vec<String>,
    /// History ring served by Up/Down (oldest first).
    pub history: Vec<String>,
    pub hist_idx: Option<usize>,
}

impl InputState {
    pub fn new(prompt: &str, kind: InputKind) -> Self {
        InputState {
            prompt: prompt.to_string(),
            buffer: String::new(),
            cursor: 0,
            kind,
            completions: Vec::new(),
            history: Vec::new(),
            hist_idx: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.buffer = text.to_string();
        self.cursor = self.buffer.len();
        self
    }

    pub fn with_completions(mut self, completions: Vec<String>) -> Self {
        self.completions = completions;
        self
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub enum Mode {
    #[default]
    Normal,
    CharPrompt {
        prompt: String,
        kind: CharPromptKind,
    },
    Input(InputState),
    Menu {
        title: String,
        items: Vec<String>,
        cursor: usize,
        top: usize,
        kind: MenuKind,
        /// Per-menu extra cancel key, alongside `q`/`h`/Ctrl-C.
        extra_cancel: Option<char>,
    },
    LogView {
        line: usize,
        log: Vec<String>,
    },
}

pub struct InfoMessage {
    pub text: String,
    pub since: Instant,
}

pub struct Controller {
    pub panes: Vec<PaneState>,
    pub current: usize,
    pub preview: PreviewEngine,
    pub tasks: TaskQueue,
    pub clipboard: Clipboard,
    pub mode: Mode,
    pub config: Arc<Config>,
    pub plugins: Vec<Plugin>,
    pub bookmarks: Vec<String>,
    pub filter_history: Vec<String>,
    cmd_cache: Vec<String>,
    pub picker_mode: PickerMode,
    pub picker_output: Option<PathBuf>,
    pub tmp_file: PathBuf,
    pub info: Option<InfoMessage>,
    pub should_quit: bool,
    /// Whether the preview payload reached the screen this cycle.
    pub preview_drawn: bool,
    /// Ask the event loop for a full repaint before the next frame.
    pub force_clear: bool,
    last_task_count: usize,
}

impl Controller {
    pub fn new(
        start_path: &Path,
        picker_mode: PickerMode,
        picker_output: Option<PathBuf>,
        config: Arc<Config>,
        bookmarks: Vec<String>,
        plugins: Vec<Plugin>,
    ) -> Result<Controller> {
        let view = ViewStyle::from_config(config.file_view_type);
        let sort_key = SortKey::from_config(config.sort_type);
        let sort_order = SortOrder::from_config(config.sort_order);
        let filter_kind = FilterKind::from_config(config.filter_type);

        let mut panes = Vec::with_capacity(TAB_MAX);
        for _ in 0..TAB_MAX {
            panes.push(PaneState::new(
                start_path, view, sort_key, sort_order, filter_kind,
            )?);
        }

        let syntax = Arc::new(SyntaxSet::load_dir(Path::new(&config.nanorc_path)));
        let preview = PreviewEngine::new(Arc::clone(&config), syntax);
        let tasks = TaskQueue::new(config.log_max_lines, config.use_trash);

        Ok(Controller {
            panes,
            current: 0,
            preview,
            tasks,
            clipboard: Clipboard::default(),
            mode: Mode::Normal,
            config,
            plugins,
            bookmarks,
            filter_history: Vec::new(),
            cmd_cache: Vec::new(),
            picker_mode,
            picker_output,
            tmp_file: PathBuf::from(TMP_FILENAME),
            info: None,
            should_quit: false,
            preview_drawn: false,
            force_clear: false,
            last_task_count: 0,
        })
    }

    pub fn pane(&self) -> &PaneState {
        &self.panes[self.current]
    }

    pub fn pane_mut(&mut self) -> &mut PaneState {
        &mut self.panes[self.current]
    }

    /// Show `msg` on the status line for the next couple of seconds.
    pub fn show_info(&mut self, msg: impl Into<String>) {
        self.info = Some(InfoMessage {
            text: msg.into(),
            since: Instant::now(),
        });
    }

    pub fn info_text(&self) -> Option<&str> {
        match &self.info {
            Some(m) if m.since.elapsed() < INFO_TTL => Some(m.text.as_str()),
            _ => None,
        }
    }

    /// Recompute pane/preview geometry for a `width`x`height` terminal:
    /// each half-width minus the separator, height minus header, status
    /// and input rows.
    pub fn update_geometry(&mut self, width: u16, height: u16) {
        let pane_height = (height as usize).saturating_sub(3);
        for pane in &mut self.panes {
            pane.set_height(pane_height.max(1));
        }
        self.preview.set_position(width / 2 + 2, 1);
        self.preview
            .set_size((width / 2).saturating_sub(4), height.saturating_sub(3));
    }

    // ------------------------------------------------------------------
    // Tick-time duties

    /// Point the preview at the entry under the cursor when it changed;
    /// disable it over an empty listing.
    pub fn retarget_preview(&mut self) {
        let (current, empty) = {
            let pane = self.pane();
            (pane.current(), pane.is_empty())
        };
        if empty {
            if !self.preview.is_disabled() {
                self.preview.set_load_file(None);
                self.preview_drawn = false;
            }
            return;
        }
        if let Some(entry) = current {
            if self.preview.loaded_name() != entry.name {
                self.preview.set_load_file(Some((*entry).clone()));
                self.preview_drawn = false;
            }
        }
    }

    /// Reload every pane whose directory matches a queued notification.
    /// Returns whether the focused pane was among them.
    pub fn drain_reload_paths(&mut self) -> bool {
        let mut focused_reloaded = false;
        while let Some(path) = self.tasks.pop_reload_path() {
            for (i, pane) in self.panes.iter_mut().enumerate() {
                if pane.path() == path {
                    pane.reload();
                    if i == self.current {
                        focused_reloaded = true;
                    }
                }
            }
        }
        focused_reloaded
    }

    /// Did the `[N]` badge change since the last check?
    pub fn task_count_changed(&mut self) -> bool {
        let count = self.tasks.task_count();
        if count != self.last_task_count {
            self.last_task_count = count;
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Navigation actions

    /// Resolve `input` the way the jump commands do: tilde-expanded,
    /// relative paths anchored at the focused pane, canonicalised.
    pub fn goto_directory(&mut self, input: &str) -> bool {
        let input = input.trim_end_matches('\n');
        if input.is_empty() {
            return false;
        }
        let expanded = settings::tilde_expand(input);
        let anchored = if expanded.is_absolute() {
            expanded
        } else {
            self.pane().path().join(expanded)
        };
        match fs::canonicalize(&anchored) {
            Ok(real) => {
                if let Err(e) = self.pane_mut().set_path(&real) {
                    self.show_info(e.to_string());
                    return false;
                }
                true
            }
            Err(e) => {
                self.show_info(e.to_string());
                false
            }
        }
    }

    pub fn go_home(&mut self) {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/".to_string());
        if let Err(e) = self.pane_mut().set_path(Path::new(&home)) {
            self.show_info(e.to_string());
        }
    }

    pub fn up_dir(&mut self) {
        if let Err(e) = self.pane_mut().up_dir() {
            self.show_info(e.to_string());
        }
    }

    pub fn switch_tab(&mut self, index: usize) {
        if index < TAB_MAX {
            self.current = index;
            self.pane_mut().reload();
            self.force_clear = true;
            self.preview_drawn = false;
        }
    }

    // ------------------------------------------------------------------
    // Selection / clipboard

    pub fn toggle_select_and_advance(&mut self) {
        let pane = self.pane_mut();
        if let Some(entry) = pane.current() {
            PaneState::toggle_select(&entry);
            pane.cursor_next();
        }
    }

    pub fn invert_selection(&mut self) {
        if !self.pane().is_empty() {
            self.pane().invert_selection();
        }
    }

    /// Arm the clipboard from the selection; clears the selection on
    /// success so the pending set is visible only in the clipboard.
    pub fn yank_selection(&mut self, op: ClipboardOp) -> bool {
        let paths = PaneState::selected_paths();
        if paths.is_empty() {
            return false;
        }
        self.clipboard.op = op;
        self.clipboard.paths = paths;
        PaneState::clear_selection();
        true
    }

    /// Enqueue the clipboard into the focused directory. A move drains the
    /// clipboard; a copy keeps it for repeated pastes.
    pub fn paste_clipboard(&mut self) -> bool {
        if self.clipboard.is_empty() {
            return false;
        }
        let dst = self.pane().path().to_path_buf();
        self.tasks.start_task();
        for src in &self.clipboard.paths {
            match self.clipboard.op {
                ClipboardOp::Copy => self.tasks.copy_file(src, &dst),
                ClipboardOp::Move => self.tasks.move_file(src, &dst),
                ClipboardOp::None => {}
            }
        }
        self.tasks.reload_path(&dst);
        if self.clipboard.op == ClipboardOp::Move {
            self.clipboard.clear();
        }
        true
    }

    /// Confirmed delete: enqueue one task per selected path.
    pub fn delete_selection(&mut self) {
        let paths = PaneState::selected_paths();
        if paths.is_empty() {
            return;
        }
        PaneState::clear_selection();
        self.tasks.start_task();
        for path in &paths {
            self.tasks.delete_file(path);
        }
        let focus = self.pane().path().to_path_buf();
        self.tasks.reload_path(&focus);
    }

    // ------------------------------------------------------------------
    // Entry-level operations

    /// Flip user/group/other execute bits on the focused entry.
    pub fn toggle_execute_bits(&mut self) {
        let Some(entry) = self.pane().current() else {
            return;
        };
        let mode = entry.mode;
        let all_exec = (libc::S_IXUSR | libc::S_IXGRP | libc::S_IXOTH) as u32;
        let new_mode = if mode & libc::S_IXUSR as u32 != 0 {
            mode & !all_exec
        } else {
            mode | all_exec
        };
        if self.tasks.chmod_file(&entry.path(), new_mode) {
            self.pane_mut().refresh();
        } else {
            self.show_info("chmod failed");
        }
    }

    pub fn toggle_hidden(&mut self) {
        let show = !self.pane().hidden();
        self.pane_mut().set_hidden(show);
        self.show_info(if show {
            "Show dot files."
        } else {
            "Hide dot files."
        });
    }

    pub fn toggle_view_style(&mut self) {
        let style = self.pane().view().toggled();
        self.pane_mut().set_view(style);
    }

    pub fn toggle_image_preview(&mut self) {
        self.preview.toggle_image_preview();
        self.preview.reload();
        self.pane_mut().reload();
        self.force_clear = true;
        self.preview_drawn = false;
        self.show_info(if self.preview.image_preview() {
            "Enable Image Preview."
        } else {
            "Disable Image Preview."
        });
    }

    /// Apply a committed filter string: update the pane, then promote the
    /// filter to the back of the history ring (deduplicated).
    pub fn apply_filter(&mut self, filter: &str) {
        let kind = self.pane().filter_kind();
        if self.pane().filter() == filter {
            return;
        }
        self.pane_mut().set_filter(filter, kind);
        if !filter.is_empty() {
            self.filter_history.retain(|f| f != filter);
            self.filter_history.push(filter.to_string());
        }
    }

    pub fn set_filter_kind(&mut self, kind: FilterKind) {
        if self.pane().filter_kind() == kind {
            return;
        }
        let filter = self.pane().filter();
        self.pane_mut().set_filter(&filter, kind);
    }

    /// Rename the focused entry to `name`, keeping the cursor on it.
    pub fn rename_current(&mut self, name: &str) {
        let Some(entry) = self.pane().current() else {
            return;
        };
        if name.is_empty() || name == entry.name {
            return;
        }
        let dir = self.pane().path().to_path_buf();
        if self.tasks.rename_file(&dir, &entry.name, name) {
            self.pane_mut().refresh();
            match self.pane().position_of(name) {
                Some(pos) => self.pane_mut().set_cursor(pos),
                None => self.pane_mut().set_cursor(0),
            }
        } else {
            self.show_info("rename failed");
        }
    }

    /// Create a file or directory named `name` in the focused pane.
    pub fn create_entry(&mut self, name: &str, file: bool) {
        if name.is_empty() {
            return;
        }
        let dir = self.pane().path().to_path_buf();
        if self.tasks.create_entry(&dir, name, file) {
            self.pane_mut().refresh();
            match self.pane().position_of(name) {
                Some(pos) => self.pane_mut().set_cursor(pos),
                None => self.pane_mut().set_cursor(0),
            }
        } else {
            self.show_info("create failed");
        }
    }

    // ------------------------------------------------------------------
    // Prompt construction

    pub fn prompt_quit(&mut self) {
        self.mode = Mode::CharPrompt {
            prompt: "Quit? (y/N)".to_string(),
            kind: CharPromptKind::Quit,
        };
    }

    pub fn prompt_delete(&mut self) {
        if PaneState::selected_count() == 0 {
            return;
        }
        self.mode = Mode::CharPrompt {
            prompt: "delete?(y/N)".to_string(),
            kind: CharPromptKind::DeleteConfirm,
        };
    }

    pub fn prompt_sort(&mut self) {
        self.mode = Mode::CharPrompt {
            prompt: "Sort by 'n'(ame) / 's'(ize) / 't'(ime)".to_string(),
            kind: CharPromptKind::SortKeySelect,
        };
    }

    pub fn prompt_filter_kind(&mut self) {
        #[cfg(feature = "migemo")]
        let prompt = "'n'(ormal) 'r'(egexp) 'd'(ict)";
        #[cfg(not(feature = "migemo"))]
        let prompt = "'n'(ormal) 'r'(egexp)";
        self.mode = Mode::CharPrompt {
            prompt: prompt.to_string(),
            kind: CharPromptKind::FilterKindSelect,
        };
    }

    pub fn prompt_rename(&mut self) {
        let Some(entry) = self.pane().current() else {
            return;
        };
        self.mode = Mode::Input(
            InputState::new("Rename: ", InputKind::Rename).with_text(&entry.name),
        );
    }

    pub fn prompt_create(&mut self) {
        self.mode = Mode::Input(InputState::new("Create: ", InputKind::CreateName));
    }

    pub fn prompt_filter(&mut self) {
        let prompt = format!("Filter[{}]: ", self.pane().filter_kind().tag());
        let history = self.filter_history.clone();
        self.mode = Mode::Input(
            InputState::new(&prompt, InputKind::Filter).with_history(history),
        );
    }

    pub fn prompt_open_with(&mut self) {
        if self.pane().is_empty() {
            return;
        }
        if self.cmd_cache.is_empty() {
            self.cmd_cache = path_commands();
        }
        let completions = self.cmd_cache.clone();
        self.mode = Mode::Input(
            InputState::new("open with: ", InputKind::OpenWith).with_completions(completions),
        );
    }

    pub fn open_bookmarks(&mut self) {
        let items = self.bookmarks.clone();
        self.preview_drawn = false;
        self.force_clear = true;
        self.mode = Mode::Menu {
            title: "BookMark".to_string(),
            items,
            cursor: 0,
            top: 0,
            kind: MenuKind::Bookmarks,
            extra_cancel: Some('b'),
        };
    }

    pub fn open_plugin_menu(&mut self) {
        let items = self
            .plugins
            .iter()
            .map(|p| format!("[{}] : {}", p.key.unwrap_or(' '), p.name))
            .collect();
        self.preview_drawn = false;
        self.force_clear = true;
        self.mode = Mode::Menu {
            title: "Plugins".to_string(),
            items,
            cursor: 0,
            top: 0,
            kind: MenuKind::Plugins,
            extra_cancel: Some('x'),
        };
    }

    pub fn open_log_view(&mut self) {
        let log = self.tasks.log_snapshot();
        self.preview_drawn = false;
        self.force_clear = true;
        self.mode = Mode::LogView { line: 0, log };
    }

    /// Leave a modal mode; the file view needs a full repaint afterwards.
    pub fn leave_mode(&mut self) {
        self.mode = Mode::Normal;
        self.force_clear = true;
        self.preview_drawn = false;
    }

    // ------------------------------------------------------------------
    // Quit

    /// Write the focused directory for the next session and stop the loop.
    pub fn quit(&mut self) {
        self.write_lastdir();
        self.should_quit = true;
    }

    fn write_lastdir(&self) {
        let Some(dir) = settings::config_dir() else {
            return;
        };
        let _ = fs::create_dir_all(&dir);
        let path = self.pane().path().display().to_string();
        if let Err(e) = fs::write(dir.join("lastdir"), path) {
            tracing::warn!(error = %e, "failed to write lastdir");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.tmp_file);
    }
}

/// Basenames of everything executable-looking on `$PATH`, for the
/// open-with completion list.
fn path_commands() -> Vec<String> {
    let Some(path) = std::env::var_os("PATH") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for dir in std::env::split_paths(&path) {
        let Ok(read) = fs::read_dir(&dir) else {
            continue;
        };
        for dent in read.flatten() {
            if dent.file_type().map(|t| !t.is_dir()).unwrap_or(false) {
                out.push(dent.file_name().to_string_lossy().into_owned());
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

//! Plugin execution: external scripts that receive the current entry, a
//! temp file listing the selection, and an optional user-typed argument,
//! and may steer the pane through that same temp file afterwards.

use anyhow::Result;
use std::fs;
use std::path::Path;

use super::spawn;
use super::terminal::TerminalGuard;
use super::{Controller, InputKind, InputState, Mode};
use crate::app::pane::PaneState;
use crate::app::settings::{self, PluginOp};

/// Entry point from the plugin menu or an ALT shortcut. Plugins flagged
/// for a text argument detour through the line editor first.
pub fn execute(ctrl: &mut Controller, terminal: &mut TerminalGuard, index: usize) -> Result<()> {
    let Some(plugin) = ctrl.plugins.get(index).cloned() else {
        return Ok(());
    };

    if plugin.input_text && !plugin.file_path.is_empty() {
        let completions: Vec<String> = (0..ctrl.pane().count())
            .map(|i| ctrl.pane().entry(i).name.clone())
            .collect();
        let prompt = format!("{}: ", plugin.name);
        ctrl.mode = Mode::Input(
            InputState::new(&prompt, InputKind::PluginText { index })
                .with_completions(completions),
        );
        return Ok(());
    }

    run(ctrl, terminal, index, "")
}

/// Spawn the script and apply its requested directory/cursor changes.
pub fn run(
    ctrl: &mut Controller,
    terminal: &mut TerminalGuard,
    index: usize,
    text: &str,
) -> Result<()> {
    let Some(plugin) = ctrl.plugins.get(index).cloned() else {
        return Ok(());
    };
    let script = settings::tilde_expand(&plugin.file_path);
    write_selection_file(&ctrl.tmp_file)?;

    let pane_path = ctrl.pane().path().to_path_buf();
    let first_arg = match ctrl.pane().current() {
        Some(entry) => entry.display_name(),
        None => pane_path.display().to_string(),
    };
    let tmp = ctrl.tmp_file.display().to_string();
    let script_str = script.display().to_string();
    let args: Vec<&str> = [first_arg.as_str(), tmp.as_str(), text]
        .into_iter()
        .filter(|a| !a.is_empty())
        .collect();

    let spawn_result = if plugin.gui {
        spawn::gui_detached(&script_str, &args, Some(&pane_path)).map(|_| ())
    } else {
        spawn::foreground(terminal, &script_str, &args, Some(&pane_path), plugin.silent)
            .map(|_| ())
    };
    if let Err(e) = spawn_result {
        ctrl.show_info(format!("{}: {}", plugin.name, e));
    }

    match plugin.operation {
        PluginOp::ChangeDirectory => {
            if let Some(line) = first_tmp_line(&ctrl.tmp_file) {
                if !line.is_empty() {
                    ctrl.goto_directory(&line);
                }
            }
        }
        PluginOp::ChangeCurrentFile => change_current_file(ctrl),
        PluginOp::None => ctrl.pane_mut().reload(),
    }

    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

/// `operation = 2`: the temp file names an entry (optionally with a
/// directory part); move there and land the cursor on it, temporarily
/// revealing dotfiles when required.
fn change_current_file(ctrl: &mut Controller) {
    let Some(line) = first_tmp_line(&ctrl.tmp_file) else {
        ctrl.pane_mut().reload();
        return;
    };
    if line.is_empty() {
        ctrl.pane_mut().reload();
        return;
    }

    let (parent, file_name) = split_target(&line);
    match parent {
        None => ctrl.pane_mut().refresh(),
        Some(parent) => {
            if !ctrl.goto_directory(&parent) {
                return;
            }
        }
    }

    let mut revealed_hidden = false;
    if file_name.starts_with('.') && !ctrl.pane().hidden() {
        revealed_hidden = true;
        ctrl.pane_mut().set_hidden(true);
    }

    match ctrl.pane().position_of(&file_name) {
        Some(pos) => ctrl.pane_mut().set_cursor(pos),
        None => {
            ctrl.pane_mut().set_cursor(0);
            if revealed_hidden {
                ctrl.pane_mut().set_hidden(false);
            }
        }
    }
}

/// Split a plugin-supplied target into the directory to enter (if any)
/// and the entry name to land the cursor on.
fn split_target(line: &str) -> (Option<String>, String) {
    let trimmed = line.trim_end_matches('/');
    let target = Path::new(trimmed);
    match target.parent().filter(|p| !p.as_os_str().is_empty()) {
        None => (None, trimmed.to_string()),
        Some(parent) => (
            Some(parent.display().to_string()),
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    }
}

/// The selection set, one absolute path per line, handed to every plugin.
fn write_selection_file(tmp: &Path) -> Result<()> {
    let mut body = String::new();
    for path in PaneState::selected_paths() {
        body.push_str(&path.to_string_lossy());
        body.push('\n');
    }
    fs::write(tmp, body)?;
    Ok(())
}

fn first_tmp_line(tmp: &Path) -> Option<String> {
    let raw = fs::read_to_string(tmp).ok()?;
    raw.lines().next().map(|l| l.trim_end_matches('\r').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_target_separates_directory_and_name() {
        assert_eq!(
            split_target("/etc/hosts"),
            (Some("/etc".to_string()), "hosts".to_string())
        );
        assert_eq!(split_target("hosts"), (None, "hosts".to_string()));
        assert_eq!(
            split_target("/srv/www/"),
            (Some("/srv".to_string()), "www".to_string())
        );
        assert_eq!(
            split_target("sub/entry"),
            (Some("sub".to_string()), "entry".to_string())
        );
    }

    #[test]
    fn first_line_reads_and_trims() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("t");
        fs::write(&p, "/etc/hosts\r\nsecond\n").unwrap();
        assert_eq!(first_tmp_line(&p), Some("/etc/hosts".to_string()));
        assert_eq!(first_tmp_line(&tmp.path().join("missing")), None);
    }

    #[test]
    fn selection_file_lists_paths() {
        let _guard = crate::app::pane::selection_test_guard();
        PaneState::clear_selection();
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("sel");
        write_selection_file(&out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }
}

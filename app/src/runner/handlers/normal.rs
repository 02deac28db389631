//! The browsing-mode keymap.

use anyhow::Result;

use super::archive;
use crate::app::pane::PaneState;
use crate::app::settings;
use crate::app::types::{ClipboardOp, PickerMode};
use crate::input::Key;
use crate::preview::filetype;
use crate::runner::terminal::TerminalGuard;
use crate::runner::{picker, plugins, spawn, Controller};

pub fn handle(ctrl: &mut Controller, terminal: &mut TerminalGuard, key: Key) -> Result<()> {
    // ALT-prefixed keys dispatch plugin shortcuts and nothing else.
    if let Key::Alt(c) = key {
        if let Some(index) = ctrl.plugins.iter().position(|p| p.key == Some(c)) {
            plugins::execute(ctrl, terminal, index)?;
        }
        return Ok(());
    }

    match key {
        Key::Char('q') | Key::Ctrl('g') => ctrl.prompt_quit(),

        Key::Enter => {
            if ctrl.picker_mode != PickerMode::None {
                if let Some(output) = ctrl.picker_output.clone() {
                    if picker::write_output(ctrl.picker_mode, &output, ctrl.pane())? {
                        ctrl.should_quit = true;
                    }
                }
            } else {
                open_current(ctrl, terminal)?;
            }
        }
        Key::Char('l') | Key::Right => open_current(ctrl, terminal)?,
        Key::Char('h') | Key::Left => ctrl.up_dir(),

        Key::Char('j') | Key::Down => {
            ctrl.pane_mut().cursor_next();
        }
        Key::Char('k') | Key::Up => {
            ctrl.pane_mut().cursor_prev();
        }
        Key::PageDown | Key::Ctrl('d') => {
            ctrl.pane_mut().page_down();
        }
        Key::PageUp | Key::Ctrl('u') => {
            ctrl.pane_mut().page_up();
        }
        Key::Char('g') | Key::Home => ctrl.pane_mut().cursor_first(),
        Key::Char('G') | Key::End => ctrl.pane_mut().cursor_last(),
        Key::Char('H') => ctrl.pane_mut().cursor_top_of_screen(),
        Key::Char('M') => ctrl.pane_mut().cursor_middle_of_screen(),
        Key::Char('L') => ctrl.pane_mut().cursor_bottom_of_screen(),

        Key::Char(' ') => ctrl.toggle_select_and_advance(),
        Key::Char('a') => ctrl.invert_selection(),
        Key::Char('u') => PaneState::clear_selection(),

        Key::Char('c') => {
            ctrl.yank_selection(ClipboardOp::Copy);
        }
        Key::Char('m') => {
            ctrl.yank_selection(ClipboardOp::Move);
        }
        Key::Char('p') => {
            ctrl.paste_clipboard();
        }
        Key::Char('d') => ctrl.prompt_delete(),

        Key::Char('r') => ctrl.prompt_rename(),
        Key::Char('n') => ctrl.prompt_create(),
        Key::Char('*') => ctrl.toggle_execute_bits(),
        Key::Char('.') => ctrl.toggle_hidden(),
        Key::Char(',') => ctrl.toggle_view_style(),
        Key::Char('s') => ctrl.prompt_sort(),
        Key::Char('/') => ctrl.prompt_filter(),
        // Ctrl-/ arrives as 0x1F on legacy terminals, which different
        // parsers report as '/', '_' or '7'.
        Key::Ctrl('/') | Key::Ctrl('_') | Key::Ctrl('7') => ctrl.prompt_filter_kind(),
        Key::Char('i') => ctrl.toggle_image_preview(),

        Key::Char('b') => ctrl.open_bookmarks(),
        Key::Char('@') => ctrl.go_home(),
        Key::Char('!') => spawn_shell(ctrl, terminal)?,
        Key::Char('e') => edit_current(ctrl, terminal)?,

        Key::Char('0') => ctrl.open_log_view(),
        Key::Char(c @ '1'..='4') => ctrl.switch_tab(c as usize - '1' as usize),

        Key::Char('x') => archive::extract(ctrl, terminal, false)?,
        Key::Char('z') => archive::prompt_create_archive(ctrl),
        Key::Char('U') => archive::unmount(ctrl, terminal)?,

        Key::Ctrl('j') => {
            if ctrl.preview.scroll_down() {
                ctrl.preview_drawn = false;
            }
        }
        Key::Ctrl('k') => {
            if ctrl.preview.scroll_up() {
                ctrl.preview_drawn = false;
            }
        }
        Key::Ctrl('a') => {
            let mnt = settings::tilde_expand(&ctrl.config.archive_mnt_dir);
            ctrl.goto_directory(&mnt.display().to_string());
        }
        Key::Ctrl('l') => {
            ctrl.force_clear = true;
            ctrl.pane_mut().reload();
            ctrl.preview_drawn = false;
        }
        Key::Ctrl('r') => batch_rename(ctrl, terminal)?,
        Key::Ctrl('o') => ctrl.prompt_open_with(),
        Key::Ctrl('x') => ctrl.open_plugin_menu(),

        _ => {}
    }
    Ok(())
}

/// Open the focused entry: descend into directories, offer the archive
/// submenu for archives, hand everything else to the opener.
fn open_current(ctrl: &mut Controller, _terminal: &mut TerminalGuard) -> Result<()> {
    let Some(entry) = ctrl.pane().current() else {
        return Ok(());
    };

    if entry.is_dir() {
        let target = entry.path();
        if let Err(e) = ctrl.pane_mut().set_path(&target) {
            ctrl.show_info(e.to_string());
        }
        return Ok(());
    }

    let is_archive = filetype::FileHead::read(&entry.path())
        .map(|h| filetype::is_archive(&h.head))
        .unwrap_or(false);
    if is_archive {
        archive::prompt_open_archive(ctrl);
        return Ok(());
    }

    let path = entry.path().display().to_string();
    if let Err(e) = spawn::gui_detached(&ctrl.config.opener, &[&path], None) {
        ctrl.show_info(format!("{}: {}", ctrl.config.opener, e));
    }
    Ok(())
}

fn spawn_shell(ctrl: &mut Controller, terminal: &mut TerminalGuard) -> Result<()> {
    let Some(shell) = spawn::shell() else {
        ctrl.show_info("SHELL environment variable not set.");
        return Ok(());
    };
    let dir = ctrl.pane().path().to_path_buf();
    if let Err(e) = spawn::foreground(terminal, &shell, &[], Some(&dir), false) {
        ctrl.show_info(format!("{}: {}", shell, e));
    }
    ctrl.pane_mut().reload();
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

fn edit_current(ctrl: &mut Controller, terminal: &mut TerminalGuard) -> Result<()> {
    if ctrl.pane().is_empty() {
        return Ok(());
    }
    let Some(editor) = spawn::editor() else {
        ctrl.show_info("EDITOR environment variable not set.");
        return Ok(());
    };
    let entry = ctrl.pane().current().unwrap();
    let path = entry.path().display().to_string();
    let dir = ctrl.pane().path().to_path_buf();
    if let Err(e) = spawn::foreground(terminal, &editor, &[&path], Some(&dir), false) {
        ctrl.show_info(format!("{}: {}", editor, e));
    }

    // The buffer may have changed under the preview; rebuild it.
    ctrl.preview.reload();
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

/// Ctrl-R: batch rename through an external `vidir`.
fn batch_rename(ctrl: &mut Controller, terminal: &mut TerminalGuard) -> Result<()> {
    if !spawn::have_command("vidir") {
        ctrl.show_info("install 'vidir'");
        return Ok(());
    }
    let dir = ctrl.pane().path().to_path_buf();
    if let Err(e) = spawn::foreground(terminal, "vidir", &[], Some(&dir), false) {
        ctrl.show_info(format!("vidir: {}", e));
    }
    ctrl.pane_mut().reload();
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

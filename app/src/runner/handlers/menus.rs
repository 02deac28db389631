//! Single-key prompts, the right-half menu overlay and the log viewer.

use anyhow::Result;

use super::archive;
use crate::app::types::{FilterKind, SortKey, SortOrder};
use crate::input::Key;
use crate::runner::terminal::TerminalGuard;
use crate::runner::{plugins, spawn, CharPromptKind, Controller, MenuKind, Mode};

// ----------------------------------------------------------------------
// CharPrompt: one keypress answers the question on the input line.

pub fn handle_char_prompt(
    ctrl: &mut Controller,
    terminal: &mut TerminalGuard,
    key: Key,
) -> Result<()> {
    let Mode::CharPrompt { kind, .. } = std::mem::take(&mut ctrl.mode) else {
        return Ok(());
    };
    let ch = match key {
        Key::Char(c) => c,
        Key::Esc => {
            ctrl.leave_mode();
            return Ok(());
        }
        // Anything that isn't a printable answer cancels, as if an
        // unexpected letter had been typed.
        _ => '\0',
    };
    ctrl.leave_mode();

    match kind {
        CharPromptKind::Quit => {
            if ch == 'y' || ch == 'Y' {
                ctrl.quit();
            }
        }
        CharPromptKind::DeleteConfirm => {
            if ch == 'y' || ch == 'Y' {
                ctrl.delete_selection();
            }
        }
        CharPromptKind::SortKeySelect => {
            let sort_key = match ch {
                'n' => Some(SortKey::Name),
                's' => Some(SortKey::Size),
                't' => Some(SortKey::Date),
                _ => None,
            };
            if let Some(key) = sort_key {
                ctrl.mode = Mode::CharPrompt {
                    prompt: "Order by 'a'(sc) / 'd'(esc)".to_string(),
                    kind: CharPromptKind::SortOrderSelect { key },
                };
            }
        }
        CharPromptKind::SortOrderSelect { key: sort_key } => {
            let order = match ch {
                'a' => Some(SortOrder::Ascending),
                'd' => Some(SortOrder::Descending),
                _ => None,
            };
            if let Some(order) = order {
                ctrl.pane_mut().sort(sort_key, order);
            }
        }
        CharPromptKind::CreateKind { name } => {
            match ch {
                'f' | 'F' => ctrl.create_entry(&name, true),
                'd' | 'D' => ctrl.create_entry(&name, false),
                _ => {}
            };
        }
        CharPromptKind::ArchiveOpen => {
            archive::handle_open_choice(ctrl, terminal, ch)?;
        }
        CharPromptKind::OpenWithMode { cmd } => {
            open_with(ctrl, terminal, &cmd, ch == 'y' || ch == 'Y')?;
        }
        CharPromptKind::FilterKindSelect => {
            let kind = match ch {
                'n' => Some(FilterKind::Substring),
                'r' => Some(FilterKind::Regexp),
                #[cfg(feature = "migemo")]
                'd' => Some(FilterKind::Dictionary),
                _ => None,
            };
            if let Some(kind) = kind {
                ctrl.set_filter_kind(kind);
            }
        }
    }
    Ok(())
}

/// The `cli mode? (y/N)` answer for Ctrl-O: foreground for CLI tools,
/// detached for graphical ones.
fn open_with(
    ctrl: &mut Controller,
    terminal: &mut TerminalGuard,
    cmd: &str,
    cli: bool,
) -> Result<()> {
    let Some(entry) = ctrl.pane().current() else {
        return Ok(());
    };
    let dir = ctrl.pane().path().to_path_buf();
    let name = entry.display_name();

    let result = if cli {
        spawn::foreground(terminal, cmd, &[&name], Some(&dir), false).map(|_| ())
    } else {
        spawn::gui_detached(cmd, &[&name], Some(&dir))
    };
    if let Err(e) = result {
        ctrl.show_info(format!("{}: {}", cmd, e));
    }
    ctrl.pane_mut().reload();
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

// ----------------------------------------------------------------------
// Menu overlay (bookmarks, plugins)

pub fn handle_menu(ctrl: &mut Controller, terminal: &mut TerminalGuard, key: Key) -> Result<()> {
    let Mode::Menu {
        title,
        items,
        mut cursor,
        mut top,
        kind,
        extra_cancel,
    } = std::mem::take(&mut ctrl.mode)
    else {
        return Ok(());
    };

    let page = ctrl.pane().height().saturating_sub(2).max(1);
    let count = items.len();

    let mut accepted = false;
    match key {
        Key::Char('q') | Key::Char('h') | Key::Left | Key::Esc | Key::Ctrl('c') => {
            ctrl.leave_mode();
            return Ok(());
        }
        Key::Char(c) if extra_cancel == Some(c) => {
            ctrl.leave_mode();
            return Ok(());
        }
        Key::Char('l') | Key::Right | Key::Enter => accepted = count > 0,
        Key::Char('j') | Key::Down => {
            if count > 0 && cursor + 1 < count {
                cursor += 1;
                if cursor > top + page - 1 {
                    top += 1;
                }
            }
        }
        Key::Char('k') | Key::Up => {
            if cursor > 0 {
                cursor -= 1;
                if cursor < top {
                    top = cursor;
                }
            }
        }
        Key::PageDown | Key::Ctrl('d') => {
            if count > 0 {
                let step = page / 2;
                cursor = (cursor + step).min(count - 1);
                top = cursor.saturating_sub(step);
            }
        }
        Key::PageUp | Key::Ctrl('u') => {
            let step = page / 2;
            cursor = cursor.saturating_sub(step);
            top = top.min(cursor);
        }
        Key::Char('g') | Key::Home => {
            cursor = 0;
            top = 0;
        }
        Key::Char('G') | Key::End => {
            if count > 0 {
                cursor = count - 1;
                top = cursor.saturating_sub(page.saturating_sub(1));
            }
        }
        Key::Char('H') => cursor = top.min(count.saturating_sub(1)),
        Key::Char('M') => cursor = (top + page / 2).min(count.saturating_sub(1)),
        Key::Char('L') => cursor = (top + page.saturating_sub(1)).min(count.saturating_sub(1)),
        _ => {}
    }

    if accepted {
        ctrl.leave_mode();
        match kind {
            MenuKind::Bookmarks => {
                if let Some(item) = items.get(cursor) {
                    ctrl.goto_directory(item);
                }
            }
            MenuKind::Plugins => plugins::execute(ctrl, terminal, cursor)?,
        }
        return Ok(());
    }

    ctrl.mode = Mode::Menu {
        title,
        items,
        cursor,
        top,
        kind,
        extra_cancel,
    };
    Ok(())
}

// ----------------------------------------------------------------------
// Log viewer

pub fn handle_log_view(ctrl: &mut Controller, key: Key) -> Result<()> {
    let Mode::LogView { mut line, mut log } = std::mem::take(&mut ctrl.mode) else {
        return Ok(());
    };
    let height = ctrl.pane().height() + 1;

    match key {
        Key::Char('q') | Key::Char('0') | Key::Esc => {
            ctrl.leave_mode();
            return Ok(());
        }
        Key::Char('j') | Key::Down => {
            if log.len() > line + height {
                line += 1;
            }
        }
        Key::Char('k') | Key::Up => {
            line = line.saturating_sub(1);
        }
        Key::PageDown | Key::Ctrl('d') => {
            if log.len() > line + height + height / 2 {
                line += height / 2;
            } else {
                line = log.len().saturating_sub(height);
            }
        }
        Key::PageUp | Key::Ctrl('u') => {
            line = line.saturating_sub(height / 2);
        }
        Key::Home | Key::Char('g') => line = 0,
        Key::End | Key::Char('G') => line = log.len().saturating_sub(height),
        _ => {}
    }

    // Pull in fresh lines while tasks are still writing.
    if ctrl.tasks.log_updated() {
        log = ctrl.tasks.log_snapshot();
    }

    ctrl.mode = Mode::LogView { line, log };
    Ok(())
}

//! Archive operations: list, extract, create, mount, unmount. All the
//! heavy lifting happens in external helpers; missing ones degrade to an
//! `install 'X'` info message.

use anyhow::Result;
use std::fs;

use crate::app::pane::PaneState;
use crate::app::settings;
use crate::runner::spawn::{self, shell_quote};
use crate::runner::terminal::TerminalGuard;
use crate::runner::{CharPromptKind, Controller, InputKind, InputState, Mode};

/// `l`/Enter on an archive: one keypress chooses open/extract/list/mount.
pub fn prompt_open_archive(ctrl: &mut Controller) {
    ctrl.mode = Mode::CharPrompt {
        prompt: "'o'pen / e'x'tract / 'l's / 'm'nt".to_string(),
        kind: CharPromptKind::ArchiveOpen,
    };
}

pub fn handle_open_choice(
    ctrl: &mut Controller,
    terminal: &mut TerminalGuard,
    choice: char,
) -> Result<()> {
    match choice {
        'o' => {
            if let Some(entry) = ctrl.pane().current() {
                let path = entry.path().display().to_string();
                if let Err(e) = spawn::gui_detached(&ctrl.config.opener, &[&path], None) {
                    ctrl.show_info(format!("{}: {}", ctrl.config.opener, e));
                }
            }
        }
        'l' => list(ctrl, terminal)?,
        'x' => extract(ctrl, terminal, true)?,
        'm' => mount(ctrl, terminal)?,
        _ => {}
    }
    Ok(())
}

/// Page the archive's table of contents through `less`.
fn list(ctrl: &mut Controller, terminal: &mut TerminalGuard) -> Result<()> {
    let Some(shell) = spawn::shell() else {
        ctrl.show_info("SHELL environment variable not set.");
        return Ok(());
    };
    let lsar = spawn::have_command("lsar");
    let bsdtar = spawn::have_command("bsdtar");
    if !lsar && !bsdtar {
        ctrl.show_info("install 'lsar' or 'bsdtar'");
        return Ok(());
    }
    let Some(entry) = ctrl.pane().current() else {
        return Ok(());
    };
    let quoted = shell_quote(&entry.path().display().to_string());
    let cmd = if lsar {
        format!("lsar -l {} | less", quoted)
    } else {
        format!("bsdtar tfv {} | less", quoted)
    };
    let dir = ctrl.pane().path().to_path_buf();
    if let Err(e) = spawn::shell_foreground(terminal, &shell, &cmd, Some(&dir), false) {
        ctrl.show_info(e.to_string());
    }
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

/// `x`: unpack into the focused directory. With a selection (and unless
/// `current_only`), every selected archive is extracted via a
/// NUL-separated list fed through the temp file.
pub fn extract(ctrl: &mut Controller, terminal: &mut TerminalGuard, current_only: bool) -> Result<()> {
    let Some(shell) = spawn::shell() else {
        ctrl.show_info("SHELL environment variable not set.");
        return Ok(());
    };
    let unar = spawn::have_command("unar");
    let bsdtar = spawn::have_command("bsdtar");
    if !unar && !bsdtar {
        ctrl.show_info("install 'unar' or 'bsdtar'");
        return Ok(());
    }

    let selected = PaneState::selected_paths();
    let cmd = if current_only || selected.is_empty() {
        let Some(entry) = ctrl.pane().current() else {
            return Ok(());
        };
        let quoted = shell_quote(&entry.path().display().to_string());
        if unar {
            format!("unar -o \"./\" {}", quoted)
        } else {
            format!("bsdtar -C \"./\" -xvf {}", quoted)
        }
    } else {
        let mut body = Vec::new();
        for path in &selected {
            body.extend_from_slice(path.to_string_lossy().as_bytes());
            body.push(0);
        }
        fs::write(&ctrl.tmp_file, body)?;
        let tmp = shell_quote(&ctrl.tmp_file.display().to_string());
        if unar {
            format!("cat {} | xargs -0 -n 1 unar ", tmp)
        } else {
            format!("cat {} | xargs -0 -n 1 bsdtar -xvf ", tmp)
        }
    };

    let dir = ctrl.pane().path().to_path_buf();
    if let Err(e) = spawn::shell_foreground_paused(terminal, &shell, &cmd, Some(&dir)) {
        ctrl.show_info(e.to_string());
    }
    ctrl.pane_mut().reload();
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

/// `z`: ask for the archive name; the default strips the focused entry's
/// trailing slash so `dir/` packs to `dir.zip`-style names.
pub fn prompt_create_archive(ctrl: &mut Controller) {
    if spawn::shell().is_none() {
        ctrl.show_info("SHELL environment variable not set.");
        return;
    }
    let default = if PaneState::selected_count() == 0 {
        ctrl.pane()
            .current()
            .map(|e| e.name.clone())
            .unwrap_or_default()
    } else {
        String::new()
    };
    ctrl.mode = Mode::Input(
        InputState::new("Archive: ", InputKind::ArchiveName).with_text(&default),
    );
}

/// Committed archive name: pack the selection (or the focused entry) with
/// `apack` and land the cursor on the result.
pub fn create(ctrl: &mut Controller, terminal: &mut TerminalGuard, name: &str) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }
    let Some(shell) = spawn::shell() else {
        ctrl.show_info("SHELL environment variable not set.");
        return Ok(());
    };

    let selected = PaneState::selected_paths();
    let dir = ctrl.pane().path().to_path_buf();
    let cmd = if selected.is_empty() {
        let Some(entry) = ctrl.pane().current() else {
            return Ok(());
        };
        format!(
            "apack {} {}",
            shell_quote(name),
            shell_quote(&entry.display_name())
        )
    } else {
        // Selected entries inside the focused directory pack by relative
        // path; anything else keeps its absolute path.
        let mut body = Vec::new();
        for path in &selected {
            let rel = path
                .strip_prefix(&dir)
                .map(|r| format!("./{}", r.display()))
                .unwrap_or_else(|_| path.display().to_string());
            body.extend_from_slice(rel.as_bytes());
            body.push(0);
        }
        fs::write(&ctrl.tmp_file, body)?;
        let tmp = shell_quote(&ctrl.tmp_file.display().to_string());
        if name.ends_with(".7z") {
            format!("cat {} | xargs -0 apack {}", tmp, shell_quote(name))
        } else {
            format!("apack --null {} < {}", shell_quote(name), tmp)
        }
    };

    if let Err(e) = spawn::shell_foreground(terminal, &shell, &cmd, Some(&dir), false) {
        ctrl.show_info(e.to_string());
    }
    ctrl.pane_mut().refresh();
    match ctrl.pane().position_of(name) {
        Some(pos) => ctrl.pane_mut().set_cursor(pos),
        None => ctrl.pane_mut().set_cursor(0),
    }
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

/// `m` in the archive submenu: archivemount into `ArchiveMntDir/<name>`.
fn mount(ctrl: &mut Controller, terminal: &mut TerminalGuard) -> Result<()> {
    let Some(shell) = spawn::shell() else {
        ctrl.show_info("SHELL environment variable not set.");
        return Ok(());
    };
    if !spawn::have_command("archivemount") {
        ctrl.show_info("install 'archivemount'");
        return Ok(());
    }
    let Some(entry) = ctrl.pane().current() else {
        return Ok(());
    };

    let mnt_root = settings::tilde_expand(&ctrl.config.archive_mnt_dir);
    if !mnt_root.exists() {
        let _ = fs::create_dir_all(&mnt_root);
    }
    let mnt_dir = mnt_root.join(&entry.name);
    if let Err(e) = fs::create_dir(&mnt_dir) {
        ctrl.show_info(format!("{} : {}", mnt_dir.display(), e));
        return Ok(());
    }

    let cmd = format!(
        "archivemount {} {} > /dev/null 2>&1",
        shell_quote(&entry.path().display().to_string()),
        shell_quote(&mnt_dir.display().to_string())
    );
    let dir = ctrl.pane().path().to_path_buf();
    let mounted = spawn::shell_foreground(terminal, &shell, &cmd, Some(&dir), true)
        .map(|s| s.success())
        .unwrap_or(false);
    if mounted {
        ctrl.show_info(format!("archivemount: {}", mnt_dir.display()));
    } else {
        ctrl.show_info(format!("archivemount failed: {}", mnt_dir.display()));
        let _ = fs::remove_dir(&mnt_dir);
    }
    Ok(())
}

/// `U`: fusermount -u on the focused entry, removing the mount point on
/// success.
pub fn unmount(ctrl: &mut Controller, terminal: &mut TerminalGuard) -> Result<()> {
    let Some(shell) = spawn::shell() else {
        ctrl.show_info("SHELL environment variable not set.");
        return Ok(());
    };
    let helper = if spawn::have_command("fusermount3") {
        "fusermount3"
    } else if spawn::have_command("fusermount") {
        "fusermount"
    } else {
        ctrl.show_info("install 'fusermount3' or 'fusermount'");
        return Ok(());
    };
    let Some(entry) = ctrl.pane().current() else {
        return Ok(());
    };

    let target = entry.path();
    let cmd = format!(
        "{} -u {} > /dev/null 2>&1",
        helper,
        shell_quote(&target.display().to_string())
    );
    let dir = ctrl.pane().path().to_path_buf();
    let unmounted = spawn::shell_foreground(terminal, &shell, &cmd, Some(&dir), true)
        .map(|s| s.success())
        .unwrap_or(false);
    if unmounted {
        let _ = fs::remove_dir(&target);
    } else {
        ctrl.show_info(format!("{} failed!", helper));
    }
    ctrl.pane_mut().reload();
    ctrl.force_clear = true;
    ctrl.preview_drawn = false;
    Ok(())
}

//! Main loop: 20 ms event polling, preview retargeting while idle, task
//! and reload bookkeeping, then rendering: the cell-grid half through
//! ratatui and the preview pane directly to stdout after it.

use anyhow::Result;
use crossterm::event::{self, Event};
use std::time::Duration;

use super::handlers;
use super::terminal::{restore_terminal, TerminalGuard};
use super::Controller;
use crate::input::Key;
use crate::ui;

const TICK: Duration = Duration::from_millis(20);

pub fn run(mut terminal: TerminalGuard, mut ctrl: Controller) -> Result<()> {
    let size = terminal.size()?;
    ctrl.update_geometry(size.width, size.height);
    terminal.draw(|f| ui::draw(f, &ctrl))?;

    loop {
        let has_event = event::poll(TICK)?;

        // Idle ticks follow the cursor with the preview.
        if !has_event {
            ctrl.retarget_preview();
        }

        let mut dirty = ctrl.task_count_changed();
        if ctrl.drain_reload_paths() {
            dirty = true;
            ctrl.preview_drawn = false;
        }

        // The menu overlay and the log viewer own the preview's region;
        // don't paint over them.
        let preview_visible = matches!(
            ctrl.mode,
            super::Mode::Normal | super::Mode::CharPrompt { .. } | super::Mode::Input(_)
        );
        if !ctrl.preview_drawn && preview_visible {
            ctrl.preview_drawn = ctrl.preview.draw()?;
        }

        if has_event {
            match event::read()? {
                Event::Key(ev) => {
                    // Action failures surface on the status line; the loop
                    // itself never aborts on them.
                    if let Err(e) = handlers::handle_key(&mut ctrl, &mut terminal, Key::from(ev)) {
                        tracing::warn!(error = %e, "action failed");
                        ctrl.show_info(e.to_string());
                    }
                    dirty = true;
                }
                Event::Resize(w, h) => {
                    ctrl.update_geometry(w, h);
                    ctrl.force_clear = true;
                    ctrl.preview_drawn = false;
                    dirty = true;
                }
                _ => {}
            }
        }

        if ctrl.should_quit {
            break;
        }

        // Live log updates repaint the log viewer without a key.
        if matches!(ctrl.mode, super::Mode::LogView { .. }) && ctrl.tasks.log_updated() {
            if let super::Mode::LogView { line, .. } = &ctrl.mode {
                let line = *line;
                ctrl.mode = super::Mode::LogView {
                    line,
                    log: ctrl.tasks.log_snapshot(),
                };
            }
            dirty = true;
        }

        if ctrl.force_clear {
            terminal.full_clear()?;
            ctrl.force_clear = false;
            dirty = true;
        }

        if dirty {
            for pane in &mut ctrl.panes {
                pane.update_scroll();
            }
            terminal.draw(|f| ui::draw(f, &ctrl))?;
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

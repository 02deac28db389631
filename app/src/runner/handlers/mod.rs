//! Key dispatch, one submodule per mode.

mod archive;
mod menus;
mod normal;
mod prompt;

use anyhow::Result;

use super::terminal::TerminalGuard;
use super::{Controller, Mode};
use crate::input::Key;

/// Route one key according to the active mode.
pub fn handle_key(ctrl: &mut Controller, terminal: &mut TerminalGuard, key: Key) -> Result<()> {
    match ctrl.mode {
        Mode::Normal => normal::handle(ctrl, terminal, key),
        Mode::CharPrompt { .. } => menus::handle_char_prompt(ctrl, terminal, key),
        Mode::Input(_) => prompt::handle(ctrl, terminal, key),
        Mode::Menu { .. } => menus::handle_menu(ctrl, terminal, key),
        Mode::LogView { .. } => menus::handle_log_view(ctrl, key),
    }
}

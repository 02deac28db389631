use crossterm::cursor::{Hide, Show};
use crossterm::queue;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::io::{Stdout, Write};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Errors from terminal setup/teardown.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(String),
}

/// RAII wrapper around the terminal: alternate screen + raw mode + hidden
/// cursor on entry, everything restored on Drop.
///
/// `suspend`/`resume` form the scoped handover used around every
/// foreground child process, so redraws can't race a pager or editor that
/// owns the terminal.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl Deref for TerminalGuard {
    type Target = Terminal<CrosstermBackend<Stdout>>;
    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for TerminalGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl TerminalGuard {
    pub fn new() -> Result<Self, TerminalError> {
        let mut stdout = io::stdout();
        queue!(stdout, EnterAlternateScreen, Hide)?;
        stdout.flush()?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        // Raw mode last, so a failed Terminal::new doesn't leave the shell raw.
        enable_raw_mode()?;
        Ok(TerminalGuard {
            terminal,
            restored: false,
        })
    }

    /// Hand the terminal to a foreground child: leave the alternate
    /// screen, drop raw mode, show the cursor.
    pub fn suspend(&mut self) -> Result<(), TerminalError> {
        disable_raw_mode()?;
        queue!(self.terminal.backend_mut(), LeaveAlternateScreen, Show)?;
        self.terminal.backend_mut().flush()?;
        Ok(())
    }

    /// Take the terminal back after the child exits.
    pub fn resume(&mut self) -> Result<(), TerminalError> {
        queue!(self.terminal.backend_mut(), EnterAlternateScreen, Hide)?;
        self.terminal.backend_mut().flush()?;
        enable_raw_mode()?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Clear both the visible screen and ratatui's back buffer so the next
    /// draw repaints everything (sixel leftovers included).
    pub fn full_clear(&mut self) -> Result<(), TerminalError> {
        queue!(self.terminal.backend_mut(), Clear(ClearType::All))?;
        self.terminal.backend_mut().flush()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn restore(mut self) -> Result<(), TerminalError> {
        if !self.restored {
            disable_raw_mode()?;
            queue!(self.terminal.backend_mut(), LeaveAlternateScreen, Show)?;
            self.terminal.backend_mut().flush()?;
            self.terminal.show_cursor()?;
            self.restored = true;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        // Best-effort restore; never panic during unwinding.
        let _ = disable_raw_mode();
        let _ = queue!(self.terminal.backend_mut(), LeaveAlternateScreen, Show);
        let _ = self.terminal.backend_mut().flush();
        let _ = self.terminal.show_cursor();
        self.restored = true;
    }
}

pub fn init_terminal() -> Result<TerminalGuard, TerminalError> {
    TerminalGuard::new()
}

pub fn restore_terminal(terminal: TerminalGuard) -> Result<(), TerminalError> {
    terminal.restore()
}

/// Best-effort restore without a guard, for panic hooks.
pub fn force_restore() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = queue!(stdout, LeaveAlternateScreen, Show);
    let _ = stdout.flush();
}

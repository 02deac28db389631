//! External process plumbing: foreground children behind the terminal
//! handover, and detached "gui" children that outlive redraws.

use std::io::{self, BufRead, Write};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use super::terminal::TerminalGuard;

/// Run a command in the foreground. Unless `silent`, the terminal is
/// handed over first and taken back after the child exits.
pub fn foreground(
    terminal: &mut TerminalGuard,
    cmd: &str,
    args: &[&str],
    dir: Option<&Path>,
    silent: bool,
) -> io::Result<ExitStatus> {
    if !silent {
        terminal
            .suspend()
            .map_err(|e| io::Error::other(e.to_string()))?;
    }

    let mut command = Command::new(cmd);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    if silent {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
    }
    let status = command.status();

    if !silent {
        terminal
            .resume()
            .map_err(|e| io::Error::other(e.to_string()))?;
    }
    status
}

/// `$SHELL -c cmdline` in the foreground.
pub fn shell_foreground(
    terminal: &mut TerminalGuard,
    shell: &str,
    cmdline: &str,
    dir: Option<&Path>,
    silent: bool,
) -> io::Result<ExitStatus> {
    foreground(terminal, shell, &["-c", cmdline], dir, silent)
}

/// Foreground shell command that pauses for an Enter keypress before the
/// terminal is taken back, so the user can read the child's output.
pub fn shell_foreground_paused(
    terminal: &mut TerminalGuard,
    shell: &str,
    cmdline: &str,
    dir: Option<&Path>,
) -> io::Result<ExitStatus> {
    terminal
        .suspend()
        .map_err(|e| io::Error::other(e.to_string()))?;

    let mut command = Command::new(shell);
    command.args(["-c", cmdline]);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    let status = command.status();

    {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\x1b[7mPress Enter key!!\n\x1b[0m");
        let _ = out.flush();
    }
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);

    terminal
        .resume()
        .map_err(|e| io::Error::other(e.to_string()))?;
    status
}

/// Detached spawn for graphical openers: new session, stdio on
/// `/dev/null`, reaped by a background thread so the child never zombies
/// and survives controller redraws.
pub fn gui_detached(cmd: &str, args: &[&str], dir: Option<&Path>) -> io::Result<()> {
    let mut command = Command::new(cmd);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    unsafe {
        command.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }
    let mut child = command.spawn()?;
    thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

/// Is `cmd` on `$PATH`?
pub fn have_command(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// `$SHELL`, if set.
pub fn shell() -> Option<String> {
    std::env::var("SHELL").ok().filter(|s| !s.is_empty())
}

/// `$EDITOR`, if set.
pub fn editor() -> Option<String> {
    std::env::var("EDITOR").ok().filter(|s| !s.is_empty())
}

/// Quote a path for interpolation into a `$SHELL -c` command line.
pub fn shell_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn which_finds_sh() {
        assert!(have_command("sh"));
        assert!(!have_command("definitely-not-a-command-minase"));
    }

    #[test]
    fn quote_escapes_double_quotes() {
        assert_eq!(shell_quote(r#"a"b"#), r#""a\"b""#);
        assert_eq!(shell_quote("plain"), "\"plain\"");
    }

    #[test]
    fn gui_detached_runs_without_zombie() {
        gui_detached("true", &[], None).unwrap();
    }
}

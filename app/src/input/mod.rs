//! Crate-local key abstraction over the terminal backend's events.
//!
//! Keeping a small enum here decouples the handler tables from
//! `crossterm` internals and keeps them unit-testable.

use crossterm::event::{KeyCode as CtKeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Alt(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Other,
}

impl From<KeyEvent> for Key {
    fn from(ev: KeyEvent) -> Self {
        if ev.kind == KeyEventKind::Release {
            return Key::Other;
        }
        match ev.code {
            CtKeyCode::Char(c) => {
                if ev.modifiers.contains(KeyModifiers::CONTROL) {
                    Key::Ctrl(c.to_ascii_lowercase())
                } else if ev.modifiers.contains(KeyModifiers::ALT) {
                    Key::Alt(c)
                } else {
                    Key::Char(c)
                }
            }
            CtKeyCode::Enter => Key::Enter,
            CtKeyCode::Esc => Key::Esc,
            CtKeyCode::Backspace => Key::Backspace,
            CtKeyCode::Tab => Key::Tab,
            CtKeyCode::Left => Key::Left,
            CtKeyCode::Right => Key::Right,
            CtKeyCode::Up => Key::Up,
            CtKeyCode::Down => Key::Down,
            CtKeyCode::Home => Key::Home,
            CtKeyCode::End => Key::End,
            CtKeyCode::PageUp => Key::PageUp,
            CtKeyCode::PageDown => Key::PageDown,
            CtKeyCode::Delete => Key::Delete,
            _ => Key::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn ev(code: CtKeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: mods,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn plain_ctrl_and_alt_chars() {
        assert_eq!(Key::from(ev(CtKeyCode::Char('j'), KeyModifiers::NONE)), Key::Char('j'));
        assert_eq!(
            Key::from(ev(CtKeyCode::Char('J'), KeyModifiers::CONTROL)),
            Key::Ctrl('j')
        );
        assert_eq!(
            Key::from(ev(CtKeyCode::Char('x'), KeyModifiers::ALT)),
            Key::Alt('x')
        );
    }

    #[test]
    fn releases_are_ignored() {
        let mut e = ev(CtKeyCode::Char('q'), KeyModifiers::NONE);
        e.kind = KeyEventKind::Release;
        assert_eq!(Key::from(e), Key::Other);
    }
}

//! The bottom-row line editor: rename, create, filter, open-with,
//! archive names and plugin arguments all commit through here.

use anyhow::Result;

use super::archive;
use crate::input::Key;
use crate::runner::terminal::TerminalGuard;
use crate::runner::{plugins, CharPromptKind, Controller, InputKind, InputState, Mode};

pub fn handle(ctrl: &mut Controller, terminal: &mut TerminalGuard, key: Key) -> Result<()> {
    let Mode::Input(mut state) = std::mem::take(&mut ctrl.mode) else {
        return Ok(());
    };

    match key {
        Key::Esc => {
            ctrl.leave_mode();
            return Ok(());
        }
        Key::Enter => {
            ctrl.leave_mode();
            commit(ctrl, terminal, state)?;
            return Ok(());
        }
        Key::Char(c) => {
            state.buffer.insert(state.cursor, c);
            state.cursor += c.len_utf8();
            state.hist_idx = None;
        }
        Key::Backspace => {
            if state.cursor > 0 {
                let prev = prev_boundary(&state.buffer, state.cursor);
                state.buffer.replace_range(prev..state.cursor, "");
                state.cursor = prev;
            }
        }
        Key::Delete => {
            if state.cursor < state.buffer.len() {
                let next = next_boundary(&state.buffer, state.cursor);
                state.buffer.replace_range(state.cursor..next, "");
            }
        }
        Key::Left => {
            if state.cursor > 0 {
                state.cursor = prev_boundary(&state.buffer, state.cursor);
            }
        }
        Key::Right => {
            if state.cursor < state.buffer.len() {
                state.cursor = next_boundary(&state.buffer, state.cursor);
            }
        }
        Key::Home => state.cursor = 0,
        Key::End => state.cursor = state.buffer.len(),
        Key::Tab => complete(&mut state),
        Key::Up => history_step(&mut state, true),
        Key::Down => history_step(&mut state, false),
        _ => {}
    }

    ctrl.mode = Mode::Input(state);
    Ok(())
}

fn prev_boundary(s: &str, at: usize) -> usize {
    let mut i = at - 1;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn next_boundary(s: &str, at: usize) -> usize {
    let mut i = at + 1;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Tab: cycle through completions sharing the buffer's prefix. A buffer
/// that already equals a candidate advances to the next one.
fn complete(state: &mut InputState) {
    if state.completions.is_empty() {
        return;
    }
    let matches: Vec<&String> = if state.buffer.is_empty() {
        state.completions.iter().collect()
    } else {
        let exact = state.completions.iter().position(|c| *c == state.buffer);
        match exact {
            Some(pos) => {
                // The buffer already names a candidate; advance to the next
                // one sharing its leading character.
                let head: String = state.buffer.chars().take(1).collect();
                let next = state
                    .completions
                    .iter()
                    .cycle()
                    .skip(pos + 1)
                    .take(state.completions.len())
                    .find(|c| c.starts_with(&head));
                if let Some(next) = next {
                    state.buffer = next.clone();
                    state.cursor = state.buffer.len();
                }
                return;
            }
            None => state
                .completions
                .iter()
                .filter(|c| c.starts_with(&state.buffer))
                .collect(),
        }
    };
    if let Some(first) = matches.first() {
        state.buffer = (*first).clone();
        state.cursor = state.buffer.len();
    }
}

/// Up/Down walk the history ring, newest entry first.
fn history_step(state: &mut InputState, up: bool) {
    if state.history.is_empty() {
        return;
    }
    let last = state.history.len() - 1;
    state.hist_idx = match (state.hist_idx, up) {
        (None, true) => Some(last),
        (None, false) => return,
        (Some(i), true) => Some(i.saturating_sub(1)),
        (Some(i), false) => {
            if i >= last {
                state.hist_idx = None;
                state.buffer.clear();
                state.cursor = 0;
                return;
            }
            Some(i + 1)
        }
    };
    if let Some(i) = state.hist_idx {
        state.buffer = state.history[i].clone();
        state.cursor = state.buffer.len();
    }
}

fn commit(ctrl: &mut Controller, terminal: &mut TerminalGuard, state: InputState) -> Result<()> {
    let text = state.buffer;
    match state.kind {
        InputKind::Rename => ctrl.rename_current(&text),
        InputKind::CreateName => {
            if !text.is_empty() {
                ctrl.mode = Mode::CharPrompt {
                    prompt: "'f'(ile) / 'd'(ir)".to_string(),
                    kind: CharPromptKind::CreateKind { name: text },
                };
            }
        }
        InputKind::Filter => ctrl.apply_filter(&text),
        InputKind::OpenWith => {
            if !text.is_empty() {
                ctrl.mode = Mode::CharPrompt {
                    prompt: "cli mode? (y/N)".to_string(),
                    kind: CharPromptKind::OpenWithMode { cmd: text },
                };
            }
        }
        InputKind::ArchiveName => archive::create(ctrl, terminal, &text)?,
        InputKind::PluginText { index } => plugins::run(ctrl, terminal, index, &text)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(buffer: &str) -> InputState {
        InputState::new("p: ", InputKind::Filter).with_text(buffer)
    }

    #[test]
    fn boundaries_handle_multibyte() {
        let s = "aé b";
        assert_eq!(next_boundary(s, 1), 3);
        assert_eq!(prev_boundary(s, 3), 1);
    }

    #[test]
    fn completion_fills_from_prefix() {
        let mut st = state_with("ca").with_completions(vec![
            "cargo".to_string(),
            "cat".to_string(),
            "ls".to_string(),
        ]);
        complete(&mut st);
        assert_eq!(st.buffer, "cargo");
        // A second Tab cycles to the next candidate with the same head.
        complete(&mut st);
        assert_eq!(st.buffer, "cat");
    }

    #[test]
    fn history_walks_newest_first() {
        let mut st = state_with("").with_history(vec!["old".into(), "new".into()]);
        history_step(&mut st, true);
        assert_eq!(st.buffer, "new");
        history_step(&mut st, true);
        assert_eq!(st.buffer, "old");
        history_step(&mut st, false);
        assert_eq!(st.buffer, "new");
        history_step(&mut st, false);
        assert_eq!(st.buffer, "");
        assert!(st.hist_idx.is_none());
    }
}

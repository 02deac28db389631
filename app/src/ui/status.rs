//! The two status rows under the panes: focused filename plus selection
//! count, then permissions/size/mtime and the cursor position, or the
//! live prompt/info message when one is active.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::pane::PaneState;
use crate::runner::{Controller, Mode};

/// `[focused-file-name]` with the selection count at the right edge.
pub fn draw_name_row(f: &mut Frame, area: Rect, ctrl: &Controller) {
    let mut spans = vec![Span::raw("[")];
    if let Some(entry) = ctrl.pane().current() {
        spans.push(Span::styled(
            entry.display_name(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw("]"));
    f.render_widget(Paragraph::new(Line::from(spans)), area);

    let selected = PaneState::selected_count();
    if selected != 0 {
        let badge = format!("[{}]", selected);
        let w = badge.len() as u16;
        if area.width > w {
            let badge_area = Rect {
                x: area.x + area.width - w,
                y: area.y,
                width: w,
                height: 1,
            };
            f.render_widget(Paragraph::new(badge), badge_area);
        }
    }
}

/// Bottom row: prompts win over info messages, info messages win over the
/// file details.
pub fn draw_bottom_row(f: &mut Frame, area: Rect, ctrl: &Controller) {
    match &ctrl.mode {
        Mode::Input(state) => {
            let before = &state.buffer[..state.cursor];
            let after = &state.buffer[state.cursor..];
            let mut spans = vec![
                Span::raw(state.prompt.clone()),
                Span::raw(before.to_string()),
            ];
            // Visible cursor cell.
            let (cursor_ch, rest) = match after.chars().next() {
                Some(c) => (c.to_string(), &after[c.len_utf8()..]),
                None => (" ".to_string(), after),
            };
            spans.push(Span::styled(
                cursor_ch,
                Style::default().add_modifier(Modifier::REVERSED),
            ));
            spans.push(Span::raw(rest.to_string()));
            f.render_widget(Paragraph::new(Line::from(spans)), area);
            return;
        }
        Mode::CharPrompt { prompt, .. } => {
            f.render_widget(Paragraph::new(prompt.clone()), area);
            return;
        }
        _ => {}
    }

    if let Some(info) = ctrl.info_text() {
        f.render_widget(Paragraph::new(info.to_string()), area);
        return;
    }

    let pane = ctrl.pane();
    if pane.is_empty() {
        render_right(f, area, "0/0");
        return;
    }

    if let Some(entry) = pane.current() {
        let left = format!(
            "{} {:>8.8}  {}",
            entry.mode_string(),
            entry.size_string(),
            entry.mtime_string()
        );
        f.render_widget(Paragraph::new(left), area);
    }
    render_right(f, area, &format!("{}/{}", pane.cursor() + 1, pane.count()));
}

fn render_right(f: &mut Frame, area: Rect, text: &str) {
    let w = text.len() as u16 + 1;
    if area.width > w {
        let right = Rect {
            x: area.x + area.width - w,
            y: area.y,
            width: w,
            height: 1,
        };
        f.render_widget(Paragraph::new(text.to_string()), right);
    }
}

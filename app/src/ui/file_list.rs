//! The directory pane rows.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::entry::FileEntry;
use crate::app::pane::PaneState;
use crate::app::types::{FileKind, ViewStyle};
use crate::runner::Controller;
use crate::util;

/// Colour for an entry, matching the preview pane's directory colouring.
fn entry_style(entry: &FileEntry) -> Style {
    if entry.kind == FileKind::Directory {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else if entry.is_link() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if entry.is_exe() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if entry.kind == FileKind::Fifo {
        Style::default().fg(Color::Yellow)
    } else if entry.kind == FileKind::Socket {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

pub fn draw(f: &mut Frame, area: Rect, ctrl: &Controller) {
    let pane = ctrl.pane();
    let cjk = ctrl.config.wcwidth_cjk;
    let height = area.height as usize;
    let name_budget = area.width.saturating_sub(1) as usize;

    let mut lines: Vec<Line> = Vec::with_capacity(height);

    if pane.is_empty() {
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled("empty", Style::default().add_modifier(Modifier::REVERSED)),
        ]));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    let top = pane.top();
    for row in 0..height {
        let idx = top + row;
        if idx >= pane.count() {
            break;
        }
        let entry = pane.entry(idx);

        let mut style = entry_style(&entry);
        if idx == pane.cursor() {
            style = style.add_modifier(Modifier::REVERSED);
        }

        let gutter = if PaneState::is_selected(&entry) {
            Span::styled(" ", Style::default().bg(Color::Magenta))
        } else {
            Span::raw(" ")
        };

        let text = match pane.view() {
            ViewStyle::Simple => {
                let (name, _) =
                    util::trim_file_name(&entry.display_name(), entry.suffix(), name_budget, cjk);
                name
            }
            ViewStyle::Detail => {
                let info = format!(" {:>8.8}  {}", entry.size_string(), entry.mtime_string());
                let budget = name_budget.saturating_sub(info.chars().count());
                let (mut name, width) =
                    util::trim_file_name(&entry.display_name(), entry.suffix(), budget, cjk);
                for _ in width..budget {
                    name.push(' ');
                }
                name.push_str(&info);
                name
            }
        };

        lines.push(Line::from(vec![gutter, Span::styled(text, style)]));
    }

    f.render_widget(Paragraph::new(lines), area);
}

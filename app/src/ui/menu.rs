//! Right-half menu overlay for bookmarks and plugins.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub fn draw(f: &mut Frame, area: Rect, title: &str, items: &[String], cursor: usize, top: usize) {
    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);

    let position = format!(
        "{}/{}",
        cursor,
        if items.is_empty() { 0 } else { items.len() - 1 }
    );
    lines.push(Line::from(vec![
        Span::raw("["),
        Span::styled(
            title.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("]  "),
        Span::raw(position),
    ]));

    for row in 0..area.height.saturating_sub(1) as usize {
        let idx = top + row;
        if idx >= items.len() {
            break;
        }
        let mut style = Style::default();
        if idx == cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(items[idx].clone(), style)));
    }

    f.render_widget(Paragraph::new(lines), area);
}

//! Full-screen task-log viewer.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::runner::Controller;

pub fn draw(f: &mut Frame, ctrl: &Controller, line: usize, log: &[String]) {
    let area = f.area();
    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);

    lines.push(Line::styled(
        "[LogViewer]",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::raw("-".repeat(width)));

    for row in 0..area.height.saturating_sub(2) as usize {
        let idx = line + row;
        if idx >= log.len() {
            break;
        }
        // Blank marker lines render as full-width separators.
        if log[idx].is_empty() {
            lines.push(Line::raw("-".repeat(width)));
        } else {
            lines.push(Line::raw(log[idx].clone()));
        }
    }

    f.render_widget(Paragraph::new(lines), area);

    let tasks = ctrl.tasks.task_count();
    if tasks != 0 {
        let badge = format!("  [{}]", tasks);
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

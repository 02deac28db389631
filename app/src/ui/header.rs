//! Top row: tab strip, current path and the pending-task badge.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::runner::{Controller, TAB_MAX};

pub fn draw(f: &mut Frame, area: Rect, ctrl: &Controller) {
    let mut spans: Vec<Span> = Vec::with_capacity(TAB_MAX + 4);
    spans.push(Span::raw("["));
    for i in 0..TAB_MAX {
        let label = (i + 1).to_string();
        if i == ctrl.current {
            spans.push(Span::styled(
                label,
                Style::default().add_modifier(Modifier::REVERSED),
            ));
        } else {
            spans.push(Span::raw(label));
        }
    }
    spans.push(Span::raw("] "));
    spans.push(Span::styled(
        ctrl.pane().path().display().to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));

    let tasks = ctrl.tasks.task_count();
    let badge = if tasks != 0 {
        format!("  [{}]", tasks)
    } else {
        "     ".to_string()
    };

    f.render_widget(Paragraph::new(Line::from(spans)), area);

    let badge_width = badge.len() as u16;
    if area.width > badge_width {
        let badge_area = Rect {
            x: area.x + area.width - badge_width,
            y: area.y,
            width: badge_width,
            height: 1,
        };
        f.render_widget(Paragraph::new(badge), badge_area);
    }
}

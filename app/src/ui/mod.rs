//! Cell-grid rendering: header, file pane, status rows and the modal
//! overlays. The preview pane is *not* painted here; the engine writes
//! it straight to stdout after each frame.

mod file_list;
mod header;
mod logview;
mod menu;
mod status;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use crate::runner::{Controller, Mode};

pub fn draw(f: &mut Frame, ctrl: &Controller) {
    if let Mode::LogView { line, log } = &ctrl.mode {
        logview::draw(f, ctrl, *line, log);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    header::draw(f, chunks[0], ctrl);

    // Only the left half belongs to the cell grid; the right half is the
    // preview engine's canvas.
    let pane_area = Rect {
        x: 0,
        y: chunks[1].y,
        width: chunks[1].width / 2,
        height: chunks[1].height,
    };
    file_list::draw(f, pane_area, ctrl);

    if let Mode::Menu {
        title,
        items,
        cursor,
        top,
        ..
    } = &ctrl.mode
    {
        let menu_area = Rect {
            x: chunks[1].width / 2 + 1,
            y: chunks[1].y,
            width: chunks[1].width.saturating_sub(chunks[1].width / 2 + 1),
            height: chunks[1].height,
        };
        menu::draw(f, menu_area, title, items, *cursor, *top);
    }

    status::draw_name_row(f, chunks[2], ctrl);
    status::draw_bottom_row(f, chunks[3], ctrl);
}

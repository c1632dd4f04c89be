pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::{AppState, HitAreas};

pub fn render(f: &mut Frame, app: &mut AppState) {
    app.hit = HitAreas::default();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    components::render_header(f, root[0], app);
    components::render_filter_bar(f, root[1], app);
    users::render_results(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    if app.dialog.is_open() {
        users::render_user_dialog(f, f.area(), app);
    }
}

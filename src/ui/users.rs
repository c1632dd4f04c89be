use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, FocusTarget};
use crate::model::Role;
use crate::query::ResultsView;
use crate::ui::components::{centered_rect, render_empty_state};

/// Results area: loading, error, empty, or the user cards, in that priority.
pub fn render_results(f: &mut Frame, area: Rect, app: &mut AppState) {
    if !app.query.is_enabled() && app.query.all_users().is_empty() && app.query.error().is_none() {
        render_empty_state(
            f,
            area,
            app,
            "What are you looking for?",
            Some("Type a name to search for users"),
            app.theme.title,
        );
        return;
    }

    let users = std::mem::take(&mut app.users);
    let error = app.query.error().map(str::to_string);
    match ResultsView::classify(&users, app.query.loading(), error.as_deref()) {
        ResultsView::Loading => {
            render_empty_state(f, area, app, "Loading users...", None, app.theme.title);
        }
        ResultsView::Error(message) => {
            render_empty_state(f, area, app, "Something went wrong", Some(message), app.theme.error);
        }
        ResultsView::Empty => render_empty_state(
            f,
            area,
            app,
            "No users found",
            Some("Try adjusting your search or filters to find what you're looking for."),
            app.theme.muted,
        ),
        ResultsView::Populated(list) => render_users_table(f, area, app, list),
    }
    app.users = users;
}

/// One row per user on the page holding the selection. Records a hit
/// rectangle per row and resizes the page to the visible height.
fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState, users: &[crate::model::User]) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let start = (app.selected_user_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(users.len());
    let slice = &users[start..end];
    let card_focused = matches!(app.focus, FocusTarget::Card(_));

    // Rows start below the top border and header line
    for i in 0..slice.len() {
        let y = area.y + 2 + i as u16;
        app.hit.cards.push((Rect::new(area.x + 1, y, area.width.saturating_sub(2), 1), start + i));
    }

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let absolute_index = start + i;
        let style = if absolute_index == app.selected_user_index {
            let s = Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD);
            if card_focused { s.bg(app.theme.highlight_bg) } else { s }
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(Span::styled(u.role.label(), Style::default().fg(app.theme.role_color(u.role)))),
            Cell::from(u.name.clone()),
            Cell::from(u.job_title.clone()),
            Cell::from(u.team.clone()),
            Cell::from(u.email.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Length(22),
        Constraint::Length(22),
        Constraint::Length(14),
        Constraint::Min(20),
    ];
    let header = Row::new(vec!["ROLE", "NAME", "JOB TITLE", "TEAM", "CONTACT"]).style(
        Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
    );
    let title = format!("Users ({})", users.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

/// Detail dialog over a cleared backdrop; records panel and Close rectangles.
pub fn render_user_dialog(f: &mut Frame, area: Rect, app: &mut AppState) {
    let Some(user) = app.dialog_user().cloned() else {
        return;
    };
    let width = area.width.saturating_sub(10).clamp(40, 70);
    let height = area.height.saturating_sub(4).clamp(12, 18);
    let rect = centered_rect(width, height, area);
    app.hit.dialog = Some(rect);

    let focus_style = |target: FocusTarget| {
        if app.focus == target {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        }
    };
    let email_style = focus_style(FocusTarget::DialogEmail).add_modifier(Modifier::UNDERLINED);
    let close_style = focus_style(FocusTarget::DialogClose);
    let label = Style::default().fg(app.theme.muted);
    let lines = vec![
        Line::from(badge(app, user.role)),
        Line::from(Span::styled(user.name.clone(), Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(user.job_title.clone(), Style::default().fg(app.theme.text))),
        Line::raw(""),
        Line::from(vec![Span::styled("Team: ", label), Span::raw(user.team.clone())]),
        Line::from(vec![
            Span::styled("Contact information: ", label),
            Span::styled(user.email.clone(), email_style),
        ]),
        Line::raw(""),
        Line::from(Span::styled("Other details:", label)),
        Line::raw(user.details.clone()),
    ];

    let block = Block::default()
        .title("User details")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(rect);
    let close_text = "[ Close ]";
    let close_w = close_text.len() as u16;
    let close_rect = Rect::new(
        inner.x + inner.width.saturating_sub(close_w) / 2,
        inner.y + inner.height.saturating_sub(1),
        close_w.min(inner.width),
        1,
    );
    let body_rect = Rect { height: inner.height.saturating_sub(2), ..inner };
    app.hit.dialog_close = Some(close_rect);

    let close = Paragraph::new(Span::styled(close_text, close_style));
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), body_rect);
    f.render_widget(close, close_rect);
}

/// Role label on the role's theme colour.
fn badge(app: &AppState, role: Role) -> Span<'static> {
    Span::styled(
        format!(" {} ", role.label()),
        Style::default()
            .fg(app.theme.header_bg)
            .bg(app.theme.role_color(role))
            .add_modifier(Modifier::BOLD),
    )
}

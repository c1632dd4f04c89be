//! Shared UI components: header with search box, role filter bar, status
//! bar, empty/loading panels and layout helpers.
//!
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, FocusTarget, InputMode};
use crate::model::{ROLES, Role};

/// Header: title plus the search box and its submit hint.
pub fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let editing = app.input_mode == InputMode::Search;
    let focused = app.focus == FocusTarget::SearchBox;
    let box_style = if editing || focused {
        Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text)
    };
    let field = if editing {
        format!("[ {}_ ]", app.search_input)
    } else if app.search_input.is_empty() {
        "[ Search by name... ]".to_string()
    } else {
        format!("[ {} ]", app.search_input)
    };
    let hint = if editing {
        "  Enter: search  Esc: cancel".to_string()
    } else {
        format!("  {}: search", app.keymap.keys_for(KeyAction::StartSearch).join("/"))
    };
    let line = Line::from(vec![
        Span::styled("What are you looking for? ", Style::default().fg(app.theme.header_fg)),
        Span::styled(field, box_style),
        Span::styled(hint, Style::default().fg(app.theme.muted)),
    ]);
    let p = Paragraph::new(line)
        .block(
            Block::default()
                .title("User Dashboard")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().bg(app.theme.header_bg));
    f.render_widget(p, area);
}

/// Role chips in display order, plus "Remove filters" while any is active.
/// Records chip rectangles for mouse hit-testing.
pub fn render_filter_bar(f: &mut Frame, area: Rect, app: &mut AppState) {
    let block = Block::default()
        .title("Filter by")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let mut spans = Vec::new();
    let mut x = inner.x;
    let right = inner.x.saturating_add(inner.width);
    for (i, role) in ROLES.into_iter().enumerate() {
        let active = app.role_filters.contains(&role);
        let mark = if active { 'x' } else { ' ' };
        let text = format!("[{mark}] {} ({})", role.label(), i + 1);
        let width = text.chars().count() as u16;
        if x.saturating_add(width) <= right {
            app.hit.chips.push((Rect::new(x, inner.y, width, 1), role));
        }
        spans.push(Span::styled(text, chip_style(app, role, active)));
        spans.push(Span::raw("  "));
        x = x.saturating_add(width + 2);
    }
    if !app.role_filters.is_empty() {
        let text = "Remove filters";
        let width = text.len() as u16;
        if x.saturating_add(width) <= right {
            app.hit.clear_filters = Some(Rect::new(x, inner.y, width, 1));
        }
        let mut style = Style::default().fg(app.theme.muted).add_modifier(Modifier::UNDERLINED);
        if app.focus == FocusTarget::ClearFilters {
            style = style.fg(app.theme.highlight_fg).bg(app.theme.highlight_bg);
        }
        spans.push(Span::styled(text, style));
    }

    f.render_widget(block, area);
    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn chip_style(app: &AppState, role: Role, active: bool) -> Style {
    let mut style = Style::default().fg(app.theme.role_color(role));
    if active {
        style = style.add_modifier(Modifier::BOLD);
    }
    if app.focus == FocusTarget::RoleChip(role) {
        style = style.bg(app.theme.highlight_bg).add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Render the bottom status bar with mode and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "DETAILS",
    };
    let filters = if app.role_filters.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = app.role_filters.iter().map(|r| r.as_str()).collect();
        format!("  filters:[{}]", names.join(","))
    };
    let status = app
        .status
        .as_deref()
        .map(|s| format!("  {s}"))
        .unwrap_or_default();
    let msg = format!(
        "mode: {mode}  showing:{}/{}{filters}{status}  Tab: focus  Enter: open  1-6: roles  r: refresh  q: quit",
        app.users.len(),
        app.query.all_users().len(),
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Centred title + description, used for the loading, error and empty states.
pub fn render_empty_state(f: &mut Frame, area: Rect, app: &AppState, title: &str, description: Option<&str>, accent: ratatui::style::Color) {
    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(title.to_string(), Style::default().fg(accent).add_modifier(Modifier::BOLD))),
    ];
    if let Some(d) = description {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(d.to_string(), Style::default().fg(app.theme.text))));
    }
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Users")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(40, 40, area), Rect::new(0, 0, 20, 10));
    }
}

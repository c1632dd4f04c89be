use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Position, Rect};
use std::time::Duration;

use crate::app::keymap::KeyAction;
use crate::app::{AppState, FocusTarget, InputMode, detail_dialog_spec};
use crate::focus::{DialogClick, DialogKey, KeyOutcome};
use crate::ui;

/// Whether the event loop should keep going after an input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Leave the loop and restore the terminal.
    Quit,
}

/// Main loop: apply finished fetches, draw, then wait up to 100ms for input.
///
/// Returns when a key resolves to [`KeyAction::Quit`] or the backend fails.
pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: AppState) -> Result<()> {
    tracing::info!("dashboard started");
    loop {
        app.tick();
        terminal.draw(|f| {
            ui::render(f, &mut app);
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let flow = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
            Event::Mouse(mouse) => {
                handle_mouse(&mut app, mouse);
                Flow::Continue
            }
            _ => Flow::Continue,
        };
        if flow == Flow::Quit {
            break;
        }
    }
    tracing::info!(uptime = ?app.started_at.elapsed(), "dashboard stopped");
    Ok(())
}

/// Route a key press by input mode. Only normal mode consults the keymap;
/// search editing and the dialog use fixed keys.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Flow {
    match app.input_mode {
        InputMode::Modal => {
            handle_modal_key(app, key.code);
            Flow::Continue
        }
        InputMode::Search => {
            handle_search_key(app, key.code);
            Flow::Continue
        }
        InputMode::Normal => match app.keymap.resolve(&key) {
            Some(action) => handle_action(app, action),
            None => Flow::Continue,
        },
    }
}

fn handle_action(app: &mut AppState, action: KeyAction) -> Flow {
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::StartSearch => {
            app.focus = FocusTarget::SearchBox;
            app.input_mode = InputMode::Search;
        }
        KeyAction::FocusNext => {
            let ring = app.focus_ring();
            app.advance_focus(&ring, true);
        }
        KeyAction::FocusPrev => {
            let ring = app.focus_ring();
            app.advance_focus(&ring, false);
        }
        KeyAction::Activate => match app.focus.clone() {
            FocusTarget::SearchBox => app.input_mode = InputMode::Search,
            FocusTarget::RoleChip(role) => app.toggle_role(role),
            FocusTarget::ClearFilters => app.clear_filters(),
            FocusTarget::Card(_) => app.open_details(app.selected_user_index),
            FocusTarget::DialogEmail | FocusTarget::DialogClose => {}
        },
        KeyAction::MoveUp => move_selection(app, -1),
        KeyAction::MoveDown => move_selection(app, 1),
        KeyAction::PageUp => move_selection(app, -(app.rows_per_page.max(1) as isize)),
        KeyAction::PageDown => move_selection(app, app.rows_per_page.max(1) as isize),
        KeyAction::Refetch => {
            app.query.refetch();
            app.status = Some("Refreshing users...".to_string());
        }
        KeyAction::ClearFilters => app.clear_filters(),
        KeyAction::ToggleRole(role) => app.toggle_role(role),
        KeyAction::ToggleErrorSimulation => match &app.error_switch {
            Some(src) => {
                let on = !src.simulate_error();
                src.set_simulate_error(on);
                app.status = Some(format!(
                    "Error simulation {}",
                    if on { "on" } else { "off" }
                ));
            }
            None => app.status = Some("Error simulation needs the bundled directory".to_string()),
        },
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

/// Move the card selection; focus lands on the selected card.
fn move_selection(app: &mut AppState, delta: isize) {
    if app.users.is_empty() {
        return;
    }
    let last = app.users.len() - 1;
    let next = app.selected_user_index.saturating_add_signed(delta).min(last);
    app.selected_user_index = next;
    app.focus = FocusTarget::Card(app.users[next].id.clone());
}

/// Edit the search draft. Enter commits it, Esc restores the last committed text.
fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            app.commit_search();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.search_input = app.search_query.clone();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}

/// Let the dialog controller see the key first; when it declines, Tab and
/// BackTab step through the dialog ring and Enter/Space activate.
fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    let key = match code {
        KeyCode::Esc => DialogKey::Escape,
        KeyCode::Tab => DialogKey::Tab,
        KeyCode::BackTab => DialogKey::BackTab,
        _ => DialogKey::Other,
    };
    let outcome = app.with_dialog(|dialog, app| dialog.handle_key(key, app));
    match outcome {
        KeyOutcome::Closed => app.dialog_closed(),
        KeyOutcome::Wrapped => {}
        KeyOutcome::Ignored => match key {
            DialogKey::Tab | DialogKey::BackTab => {
                let ring = detail_dialog_spec().focusables;
                app.advance_focus(&ring, key == DialogKey::Tab);
            }
            DialogKey::Escape | DialogKey::Other => activate_in_dialog(app, code),
        },
    }
}

fn activate_in_dialog(app: &mut AppState, code: KeyCode) {
    if !matches!(code, KeyCode::Enter | KeyCode::Char(' ')) {
        return;
    }
    match app.focus {
        FocusTarget::DialogClose => app.close_details(),
        FocusTarget::DialogEmail => {
            if let Some(email) = app.dialog_user().map(|u| u.email.clone()) {
                app.status = Some(format!("mailto:{email}"));
            }
        }
        _ => {}
    }
}

/// Left clicks only, hit-tested against the rectangles of the last frame.
///
/// While the dialog is open a click is either on Close, on the panel
/// (ignored) or on the backdrop (closes).
pub fn handle_mouse(app: &mut AppState, mouse: MouseEvent) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let at = Position::new(mouse.column, mouse.row);
    let hit = |r: &Option<Rect>| r.is_some_and(|r| r.contains(at));

    if app.input_mode == InputMode::Modal {
        if hit(&app.hit.dialog_close) {
            app.close_details();
            return;
        }
        let click = if hit(&app.hit.dialog) {
            DialogClick::Panel
        } else {
            DialogClick::Backdrop
        };
        if app.with_dialog(|dialog, app| dialog.handle_click(click, app)) {
            app.dialog_closed();
        }
        return;
    }

    if let Some((_, role)) = app.hit.chips.iter().find(|(r, _)| r.contains(at)).copied() {
        app.focus = FocusTarget::RoleChip(role);
        app.toggle_role(role);
    } else if hit(&app.hit.clear_filters) {
        app.clear_filters();
    } else if let Some((_, idx)) = app.hit.cards.iter().find(|(r, _)| r.contains(at)).copied() {
        if let Some(u) = app.users.get(idx) {
            app.focus = FocusTarget::Card(u.id.clone());
            app.open_details(idx);
        }
    }
}

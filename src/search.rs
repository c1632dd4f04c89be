use crate::app::{AppState, FocusTarget};

/// Recompute the on-screen view from the loaded users and the active
/// criteria, keeping the selection and card focus valid.
pub fn apply_filters_and_search(app: &mut AppState) {
    app.users = app.query.derive_filtered_view(&app.criteria());
    app.selected_user_index = app.selected_user_index.min(app.users.len().saturating_sub(1));

    if let FocusTarget::Card(id) = &app.focus {
        let still_listed = app.users.iter().position(|u| &u.id == id);
        match (still_listed, app.users.get(app.selected_user_index)) {
            (Some(idx), _) => app.selected_user_index = idx,
            (None, Some(u)) => app.focus = FocusTarget::Card(u.id.clone()),
            (None, None) => app.focus = FocusTarget::SearchBox,
        }
    }
}

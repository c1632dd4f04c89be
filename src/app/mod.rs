//! Application state types and entry glue.
//!
//! Defines the state the TUI renders from, the focus model the detail
//! dialog plugs into, config file resolution, and re-exports the event loop
//! as `run`.
//!
pub mod filterconf;
pub mod keymap;
pub mod theme;
pub mod update;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;

use crate::focus::{DialogSpec, FocusHost, ModalFocusController};
use crate::model::{ROLES, Role, User};
use crate::query::{FilterCriteria, LoadPolicy, QueryOptions, UserQuery};
use crate::source::{BundledSource, UserSource};

pub use keymap::Keymap;
pub use theme::Theme;

const APP_DIR: &str = "user-directory";

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the search box.
    Search,
    /// The detail dialog is open.
    Modal,
}

/// Everything that can hold keyboard focus.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    SearchBox,
    RoleChip(Role),
    ClearFilters,
    /// A result card, by user id.
    Card(String),
    DialogEmail,
    DialogClose,
}

pub type DetailDialog = ModalFocusController<String, FocusTarget>;

/// The detail dialog's focus ring; Close takes initial focus.
pub fn detail_dialog_spec() -> DialogSpec<FocusTarget> {
    DialogSpec::new(
        vec![FocusTarget::DialogEmail, FocusTarget::DialogClose],
        FocusTarget::DialogClose,
    )
}

/// Screen regions from the last frame, used to route mouse clicks.
#[derive(Clone, Debug, Default)]
pub struct HitAreas {
    pub chips: Vec<(Rect, Role)>,
    pub clear_filters: Option<Rect>,
    pub cards: Vec<(Rect, usize)>,
    pub dialog: Option<Rect>,
    pub dialog_close: Option<Rect>,
}

/// Start-up knobs coming from the command line.
#[derive(Clone, Debug, Default)]
pub struct AppOptions {
    /// Fetch immediately instead of waiting for the first search.
    pub fetch_on_start: bool,
    pub policy: LoadPolicy,
    /// Where role filter changes are persisted; `None` disables persistence.
    pub filter_conf_path: Option<String>,
}

pub struct AppState {
    pub started_at: Instant,
    pub query: UserQuery,
    /// Handle to the bundled source when it is in use, for error simulation.
    pub error_switch: Option<Arc<BundledSource>>,
    /// Filtered view currently on screen.
    pub users: Vec<User>,
    /// Text being typed into the search box.
    pub search_input: String,
    /// Last submitted search.
    pub search_query: String,
    pub role_filters: BTreeSet<Role>,
    pub fetch_on_start: bool,
    pub selected_user_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub focus: FocusTarget,
    pub dialog: DetailDialog,
    pub theme: Theme,
    pub keymap: Keymap,
    pub filter_conf_path: Option<String>,
    pub status: Option<String>,
    pub hit: HitAreas,
}

impl AppState {
    /// State with default theme and keymap and no config files touched.
    pub fn with_source(source: Arc<dyn UserSource>, options: AppOptions) -> Self {
        let query = UserQuery::with_options(
            source,
            QueryOptions {
                enabled: options.fetch_on_start,
                policy: options.policy,
            },
        );
        Self {
            started_at: Instant::now(),
            query,
            error_switch: None,
            users: Vec::new(),
            search_input: String::new(),
            search_query: String::new(),
            role_filters: BTreeSet::new(),
            fetch_on_start: options.fetch_on_start,
            selected_user_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            focus: FocusTarget::SearchBox,
            dialog: DetailDialog::new(),
            theme: Theme::mocha(),
            keymap: Keymap::default(),
            filter_conf_path: options.filter_conf_path,
            status: None,
            hit: HitAreas::default(),
        }
    }

    /// State for the interactive session: loads theme, keybinds and saved filters.
    pub fn new(source: Arc<dyn UserSource>, options: AppOptions) -> Self {
        let mut app = Self::with_source(source, options);
        app.theme = Theme::load_or_init(&config_file_write_path("theme.conf"));
        app.keymap = Keymap::load_or_init(&config_file_write_path("keybinds.conf"));
        if let Some(path) = app.filter_conf_path.clone() {
            filterconf::FiltersConfig::load_or_init(&path).apply_to(&mut app);
        }
        crate::search::apply_filters_and_search(&mut app);
        app
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_query: self.search_query.clone(),
            role_filters: self.role_filters.clone(),
        }
    }

    pub fn has_searched(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.selected_user_index)
    }

    /// User the detail dialog is showing, if open.
    pub fn dialog_user(&self) -> Option<&User> {
        let id = self.dialog.subject()?;
        self.users
            .iter()
            .chain(self.query.all_users())
            .find(|u| &u.id == id)
    }

    /// Normal-mode focus stops in Tab order.
    pub fn focus_ring(&self) -> Vec<FocusTarget> {
        let mut ring = vec![FocusTarget::SearchBox];
        ring.extend(ROLES.into_iter().map(FocusTarget::RoleChip));
        if !self.role_filters.is_empty() {
            ring.push(FocusTarget::ClearFilters);
        }
        if let Some(u) = self.selected_user() {
            ring.push(FocusTarget::Card(u.id.clone()));
        }
        ring
    }

    /// Move focus one stop along `ring`, wrapping at the ends.
    pub fn advance_focus(&mut self, ring: &[FocusTarget], forward: bool) {
        if ring.is_empty() {
            return;
        }
        let next = match ring.iter().position(|t| *t == self.focus) {
            Some(i) if forward => (i + 1) % ring.len(),
            Some(i) => (i + ring.len() - 1) % ring.len(),
            None => 0,
        };
        let target = ring[next].clone();
        self.focus(&target);
    }

    /// Run `f` with the dialog controller detached so it can drive `self` as its focus host.
    pub fn with_dialog<R>(&mut self, f: impl FnOnce(&mut DetailDialog, &mut Self) -> R) -> R {
        let mut dialog = std::mem::take(&mut self.dialog);
        let out = f(&mut dialog, self);
        self.dialog = dialog;
        out
    }

    pub fn open_details(&mut self, user_index: usize) {
        let Some(user) = self.users.get(user_index) else {
            return;
        };
        let id = user.id.clone();
        self.selected_user_index = user_index;
        self.with_dialog(|dialog, app| dialog.open(id, detail_dialog_spec(), app));
        self.input_mode = InputMode::Modal;
    }

    pub fn close_details(&mut self) {
        self.with_dialog(|dialog, app| dialog.close(app));
        self.dialog_closed();
    }

    /// Back to normal mode after the dialog closed by any route. When the
    /// opener could not be refocused, focus moves to the selected card, or
    /// the search box when no card is listed.
    pub fn dialog_closed(&mut self) {
        self.input_mode = InputMode::Normal;
        if matches!(self.focus, FocusTarget::DialogEmail | FocusTarget::DialogClose) {
            self.focus = match self.selected_user() {
                Some(u) => FocusTarget::Card(u.id.clone()),
                None => FocusTarget::SearchBox,
            };
            tracing::debug!(focus = ?self.focus, "dialog opener gone, focus moved");
        }
    }

    /// Flip one role in the filters, refresh the view and persist the selection.
    pub fn toggle_role(&mut self, role: Role) {
        if !self.role_filters.remove(&role) {
            self.role_filters.insert(role);
        }
        self.filters_changed();
    }

    pub fn clear_filters(&mut self) {
        self.role_filters.clear();
        if self.focus == FocusTarget::ClearFilters {
            self.focus = FocusTarget::SearchBox;
        }
        self.filters_changed();
    }

    fn filters_changed(&mut self) {
        crate::search::apply_filters_and_search(self);
        if let Some(path) = &self.filter_conf_path
            && let Err(e) = filterconf::FiltersConfig::save_from_app(self, path)
        {
            tracing::warn!(error = %e, "role filters not persisted");
        }
    }

    /// Submit the typed search, which also opens the fetch gate on first use.
    pub fn commit_search(&mut self) {
        self.search_query = self.search_input.clone();
        let enabled = self.fetch_on_start || self.has_searched();
        self.query.set_enabled(enabled);
        crate::search::apply_filters_and_search(self);
    }

    /// Apply finished fetches. Returns true when the view changed.
    pub fn tick(&mut self) -> bool {
        if self.query.poll() > 0 {
            crate::search::apply_filters_and_search(self);
            true
        } else {
            false
        }
    }
}

impl FocusHost<FocusTarget> for AppState {
    fn focused(&self) -> Option<FocusTarget> {
        Some(self.focus.clone())
    }

    fn focus(&mut self, target: &FocusTarget) {
        if let FocusTarget::Card(id) = target
            && let Some(idx) = self.users.iter().position(|u| &u.id == id)
        {
            self.selected_user_index = idx;
        }
        self.focus = target.clone();
    }

    fn is_attached(&self, target: &FocusTarget) -> bool {
        match target {
            FocusTarget::ClearFilters => !self.role_filters.is_empty(),
            FocusTarget::Card(id) => self.users.iter().any(|u| &u.id == id),
            FocusTarget::SearchBox
            | FocusTarget::RoleChip(_)
            | FocusTarget::DialogEmail
            | FocusTarget::DialogClose => true,
        }
    }
}

fn config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join(APP_DIR))
}

/// First existing copy of `name`: config directory, then the working directory.
pub fn config_file_read_path(name: &str) -> Option<String> {
    let candidates = config_dir()
        .map(|d| d.join(name))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(name)));
    for p in candidates {
        if p.is_file() {
            return Some(p.to_string_lossy().to_string());
        }
    }
    None
}

/// Where `name` should be written: the config directory if it can be created,
/// else the working directory.
pub fn config_file_write_path(name: &str) -> String {
    if let Some(dir) = config_dir()
        && std::fs::create_dir_all(&dir).is_ok()
    {
        return dir.join(name).to_string_lossy().to_string();
    }
    name.to_string()
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;

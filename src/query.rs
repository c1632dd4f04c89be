//! UserQuery: loads the user collection and derives filtered views over it.
//!
//! Fetches run on a worker thread; their outcomes are applied only when the
//! owner drains them with [`UserQuery::poll`] or [`UserQuery::wait_settled`],
//! so every state mutation happens on the owning thread.

use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};

use crate::error::FetchError;
use crate::model::{Role, User};
use crate::observe::Subscribers;
use crate::source::UserSource;

/// Caller-supplied search text and role set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_query: String,
    pub role_filters: BTreeSet<Role>,
}

impl FilterCriteria {
    pub fn new(search_query: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            search_query: search_query.into(),
            role_filters: roles.into_iter().collect(),
        }
    }

    /// Search text after trimming; empty means no name constraint.
    pub fn trimmed_query(&self) -> &str {
        self.search_query.trim()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.trimmed_query().is_empty() && self.role_filters.is_empty()
    }
}

/// Keep users whose name contains the trimmed query (case-insensitive) and
/// whose role is in the role set. Empty constraints are skipped; order is kept.
pub fn filter_users(all: &[User], criteria: &FilterCriteria) -> Vec<User> {
    let query = criteria.trimmed_query().to_lowercase();
    all.iter()
        .filter(|u| query.is_empty() || u.name.to_lowercase().contains(&query))
        .filter(|u| criteria.role_filters.is_empty() || criteria.role_filters.contains(&u.role))
        .cloned()
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    pub all_users: Vec<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            all_users: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// What to do with a completion that arrives after a newer load was issued.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Apply every completion in arrival order; a slow stale answer may win.
    #[default]
    AcceptAll,
    /// Drop completions whose sequence number is not the latest issued.
    LatestWins,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryEvent {
    LoadStarted { seq: u64 },
    Loaded { seq: u64, count: usize },
    Failed { seq: u64, message: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueryOptions {
    pub enabled: bool,
    pub policy: LoadPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: LoadPolicy::AcceptAll,
        }
    }
}

struct Completion {
    seq: u64,
    outcome: Result<Vec<User>, FetchError>,
}

pub struct UserQuery {
    source: Arc<dyn UserSource>,
    state: QueryState,
    enabled: bool,
    policy: LoadPolicy,
    issued: u64,
    in_flight: usize,
    done_tx: Sender<Completion>,
    done_rx: Receiver<Completion>,
    subscribers: Subscribers<QueryEvent>,
}

impl std::fmt::Debug for UserQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserQuery")
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("policy", &self.policy)
            .field("issued", &self.issued)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl UserQuery {
    /// Create an enabled query; the first load is issued immediately.
    pub fn new(source: Arc<dyn UserSource>) -> Self {
        Self::with_options(source, QueryOptions::default())
    }

    /// Create a query; when `options.enabled` is false nothing is fetched
    /// until [`set_enabled`](Self::set_enabled) or [`refetch`](Self::refetch).
    pub fn with_options(source: Arc<dyn UserSource>, options: QueryOptions) -> Self {
        let (done_tx, done_rx) = flume::unbounded();
        let mut query = Self {
            source,
            state: QueryState::default(),
            enabled: options.enabled,
            policy: options.policy,
            issued: 0,
            in_flight: 0,
            done_tx,
            done_rx,
            subscribers: Subscribers::new(),
        };
        if query.enabled {
            query.load();
        }
        query
    }

    /// Start a fetch and return its sequence number.
    pub fn load(&mut self) -> u64 {
        self.issued += 1;
        let seq = self.issued;
        self.state.loading = true;
        self.state.error = None;
        self.in_flight += 1;
        tracing::debug!(seq, "user load issued");
        self.subscribers.notify(QueryEvent::LoadStarted { seq });

        let source = Arc::clone(&self.source);
        let tx = self.done_tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("user-fetch-{seq}"))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| source.fetch_users()))
                    .unwrap_or(Err(FetchError::Unspecified));
                let _ = tx.send(Completion { seq, outcome });
            });
        if let Err(e) = spawned {
            tracing::warn!(seq, error = %e, "could not spawn fetch worker");
            self.apply(Completion {
                seq,
                outcome: Err(FetchError::new(format!("could not start fetch: {e}"))),
            });
        }
        seq
    }

    pub fn refetch(&mut self) -> u64 {
        self.load()
    }

    /// Update the enabled gate; turning it on fires a load.
    pub fn set_enabled(&mut self, enabled: bool) {
        let was = self.enabled;
        self.enabled = enabled;
        if enabled && !was {
            self.load();
        }
    }

    /// Apply every completion that has already arrived. Returns how many changed state.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.done_rx.try_recv() {
            if self.apply(done) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until no fetch is in flight or `timeout` elapses. Returns `true` when settled.
    pub fn wait_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            match self.done_rx.recv_deadline(deadline) {
                Ok(done) => {
                    self.apply(done);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
        true
    }

    fn apply(&mut self, done: Completion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        let seq = done.seq;
        if self.policy == LoadPolicy::LatestWins && seq != self.issued {
            tracing::debug!(seq, latest = self.issued, "stale user load discarded");
            return false;
        }
        match done.outcome {
            Ok(users) => {
                let count = users.len();
                self.state.all_users = users;
                self.state.loading = false;
                tracing::info!(seq, count, "users loaded");
                self.subscribers.notify(QueryEvent::Loaded { seq, count });
            }
            Err(err) => {
                let message = err.user_message();
                self.state.error = Some(message.clone());
                self.state.loading = false;
                tracing::warn!(seq, %message, "user load failed");
                self.subscribers.notify(QueryEvent::Failed { seq, message });
            }
        }
        true
    }

    pub fn derive_filtered_view(&self, criteria: &FilterCriteria) -> Vec<User> {
        filter_users(&self.state.all_users, criteria)
    }

    pub fn subscribe(&mut self) -> Receiver<QueryEvent> {
        self.subscribers.subscribe()
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn all_users(&self) -> &[User] {
        &self.state.all_users
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// The four mutually exclusive states of the results area, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultsView<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Populated(&'a [User]),
}

impl<'a> ResultsView<'a> {
    pub fn classify(users: &'a [User], loading: bool, error: Option<&'a str>) -> Self {
        if loading {
            ResultsView::Loading
        } else if let Some(e) = error.filter(|e| !e.is_empty()) {
            ResultsView::Error(e)
        } else if users.is_empty() {
            ResultsView::Empty
        } else {
            ResultsView::Populated(users)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_user(id: &str, name: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            role,
            job_title: "Engineer".to_string(),
            team: "Core".to_string(),
            email: format!("{id}@example.com"),
            details: String::new(),
        }
    }

    fn sample() -> Vec<User> {
        vec![
            mk_user("1", "George Harris", Role::Admin),
            mk_user("2", "Arianna Russo", Role::Editor),
            mk_user("3", "Sarah Williams", Role::Guest),
        ]
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn empty_criteria_returns_everything_in_order() {
        let all = sample();
        assert_eq!(filter_users(&all, &FilterCriteria::default()), all);
        assert_eq!(filter_users(&all, &FilterCriteria::new("   ", [])), all);
    }

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let all = sample();
        let out = filter_users(&all, &FilterCriteria::new("  GEORGE ", []));
        assert_eq!(names(&out), ["George Harris"]);
        let out = filter_users(&all, &FilterCriteria::new("a", []));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn roles_are_ored_then_anded_with_search() {
        let all = sample();
        let out = filter_users(&all, &FilterCriteria::new("", [Role::Admin, Role::Guest]));
        assert_eq!(names(&out), ["George Harris", "Sarah Williams"]);
        let out = filter_users(&all, &FilterCriteria::new("a", [Role::Admin]));
        assert_eq!(names(&out), ["George Harris"]);
        let out = filter_users(&all, &FilterCriteria::new("arianna", [Role::Admin]));
        assert!(out.is_empty());
    }

    #[test]
    fn results_view_priority() {
        let users = sample();
        assert_eq!(ResultsView::classify(&users, true, Some("boom")), ResultsView::Loading);
        assert_eq!(ResultsView::classify(&users, false, Some("boom")), ResultsView::Error("boom"));
        assert_eq!(ResultsView::classify(&[], false, None), ResultsView::Empty);
        assert!(matches!(
            ResultsView::classify(&users, false, None),
            ResultsView::Populated(u) if u.len() == 3
        ));
    }
}

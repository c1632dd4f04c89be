// Unit tests for user-directory
// These exercise the query and dialog cores through the public API only.

#[cfg(test)]
mod query_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use user_directory::error::FetchError;
    use user_directory::model::{Role, User};
    use user_directory::query::{
        FilterCriteria, LoadPolicy, QueryEvent, QueryOptions, UserQuery, filter_users,
    };
    use user_directory::source::UserSource;

    const SETTLE: Duration = Duration::from_secs(5);

    fn create_test_user(id: &str, name: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            role,
            job_title: "Engineer".to_string(),
            team: "Platform".to_string(),
            email: format!("user{id}@example.com"),
            details: "Details".to_string(),
        }
    }

    fn scenario_users() -> Vec<User> {
        vec![
            create_test_user("1", "George Harris", Role::Admin),
            create_test_user("2", "Arianna Russo", Role::Editor),
            create_test_user("3", "Sarah Williams", Role::Guest),
        ]
    }

    fn fixed_source(users: Vec<User>) -> Arc<dyn UserSource> {
        Arc::new(move || Ok::<_, FetchError>(users.clone()))
    }

    fn failing_source(err: FetchError) -> Arc<dyn UserSource> {
        Arc::new(move || Err::<Vec<User>, _>(err.clone()))
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.name.as_str()).collect()
    }

    /// Each fetch blocks until the test hands it a payload through its own gate.
    struct GatedSource {
        calls: AtomicUsize,
        gates: Vec<flume::Receiver<Vec<User>>>,
    }

    impl GatedSource {
        fn new(n: usize) -> (Arc<Self>, Vec<flume::Sender<Vec<User>>>) {
            let (senders, gates): (Vec<_>, Vec<_>) = (0..n).map(|_| flume::bounded(1)).unzip();
            (Arc::new(Self { calls: AtomicUsize::new(0), gates }), senders)
        }

        fn wait_for_calls(&self, n: usize) {
            let deadline = Instant::now() + SETTLE;
            while self.calls.load(Ordering::SeqCst) < n {
                assert!(Instant::now() < deadline, "source was never called");
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }

    impl UserSource for GatedSource {
        fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.get(n).ok_or(FetchError::Unspecified)?;
            gate.recv().map_err(|_| FetchError::new("gate closed"))
        }
    }

    #[test]
    fn test_initial_state_before_resolution() {
        let (src, _senders) = GatedSource::new(1);
        let query = UserQuery::new(src.clone());
        assert!(query.loading());
        assert!(query.all_users().is_empty());
        assert_eq!(query.error(), None);
        assert_eq!(query.in_flight(), 1);
    }

    #[test]
    fn test_load_success_replaces_users() {
        let mut query = UserQuery::new(fixed_source(scenario_users()));
        assert!(query.wait_settled(SETTLE));
        assert!(!query.loading());
        assert_eq!(query.error(), None);
        assert_eq!(query.all_users(), scenario_users().as_slice());
    }

    #[test]
    fn test_load_failure_sets_exact_message_and_keeps_users() {
        let mut query = UserQuery::new(failing_source(FetchError::new("Network error")));
        assert!(query.wait_settled(SETTLE));
        assert!(!query.loading());
        assert_eq!(query.error(), Some("Network error"));
        assert!(query.all_users().is_empty());
    }

    #[test]
    fn test_failure_without_message_uses_generic_text() {
        let mut query = UserQuery::new(failing_source(FetchError::Unspecified));
        assert!(query.wait_settled(SETTLE));
        assert_eq!(query.error(), Some("Failed to fetch users"));
    }

    #[test]
    fn test_panicking_source_is_reported_not_propagated() {
        let src: Arc<dyn UserSource> =
            Arc::new(|| -> Result<Vec<User>, FetchError> { panic!("source blew up") });
        let mut query = UserQuery::new(src);
        assert!(query.wait_settled(SETTLE));
        assert_eq!(query.error(), Some("Failed to fetch users"));
    }

    #[test]
    fn test_failed_refetch_leaves_previous_snapshot() {
        let (src, senders) = GatedSource::new(2);
        let mut query = UserQuery::new(src.clone());
        senders[0].send(scenario_users()).unwrap();
        assert!(query.wait_settled(SETTLE));

        query.refetch();
        assert!(query.loading());
        assert_eq!(query.error(), None);
        drop(senders);
        assert!(query.wait_settled(SETTLE));
        assert_eq!(query.error(), Some("gate closed"));
        assert_eq!(query.all_users().len(), 3);
    }

    #[test]
    fn test_disabled_query_does_not_fetch_until_enabled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let src: Arc<dyn UserSource> = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FetchError>(scenario_users())
        });
        let mut query = UserQuery::with_options(
            src,
            QueryOptions { enabled: false, policy: LoadPolicy::AcceptAll },
        );
        assert!(query.wait_settled(Duration::from_millis(50)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(query.loading());
        assert!(query.all_users().is_empty());

        query.set_enabled(true);
        assert!(query.wait_settled(SETTLE));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(query.all_users().len(), 3);

        // Staying enabled does not refetch; an explicit refetch does
        query.set_enabled(true);
        query.refetch();
        assert!(query.wait_settled(SETTLE));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribers_see_load_lifecycle() {
        let mut query = UserQuery::with_options(
            fixed_source(scenario_users()),
            QueryOptions { enabled: false, policy: LoadPolicy::AcceptAll },
        );
        let events = query.subscribe();
        let seq = query.load();
        assert!(query.wait_settled(SETTLE));
        let got: Vec<QueryEvent> = events.try_iter().collect();
        assert_eq!(
            got,
            vec![QueryEvent::LoadStarted { seq }, QueryEvent::Loaded { seq, count: 3 }]
        );
    }

    #[test]
    fn test_accept_all_lets_stale_answer_win() {
        let (src, senders) = GatedSource::new(2);
        let mut query = UserQuery::new(src.clone());
        let events = query.subscribe();
        src.wait_for_calls(1);
        let second = query.refetch();
        src.wait_for_calls(2);

        senders[1].send(vec![create_test_user("9", "Newest", Role::Owner)]).unwrap();
        let ev = events.recv_timeout(SETTLE).unwrap();
        assert_eq!(ev, QueryEvent::LoadStarted { seq: second });
        let deadline = Instant::now() + SETTLE;
        while query.poll() == 0 {
            assert!(Instant::now() < deadline, "newer load never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(names(query.all_users()), ["Newest"]);

        senders[0].send(scenario_users()).unwrap();
        assert!(query.wait_settled(SETTLE));
        assert_eq!(query.all_users().len(), 3, "slower, older answer overwrote the newer one");
    }

    #[test]
    fn test_latest_wins_discards_stale_answer() {
        let (src, senders) = GatedSource::new(2);
        let mut query = UserQuery::with_options(
            src.clone(),
            QueryOptions { enabled: true, policy: LoadPolicy::LatestWins },
        );
        src.wait_for_calls(1);
        query.refetch();
        src.wait_for_calls(2);

        senders[0].send(scenario_users()).unwrap();
        senders[1].send(vec![create_test_user("9", "Newest", Role::Owner)]).unwrap();
        assert!(query.wait_settled(SETTLE));
        assert_eq!(names(query.all_users()), ["Newest"]);
        assert!(!query.loading());
    }

    #[test]
    fn test_scenario_search_and_role_filters() {
        let mut query = UserQuery::new(fixed_source(scenario_users()));
        assert!(query.wait_settled(SETTLE));

        let view = query.derive_filtered_view(&FilterCriteria::new("a", []));
        assert_eq!(view.len(), 3);
        let view = query.derive_filtered_view(&FilterCriteria::new("a", [Role::Admin]));
        assert_eq!(names(&view), ["George Harris"]);
        let view = query.derive_filtered_view(&FilterCriteria::new("george", []));
        assert_eq!(names(&view), ["George Harris"]);
        let view = query.derive_filtered_view(&FilterCriteria::new("xyz nonexistent", []));
        assert!(view.is_empty());
    }

    #[test]
    fn test_filtering_is_an_intersection_and_idempotent() {
        let users = scenario_users();
        let criteria = FilterCriteria::new(" R ", [Role::Editor, Role::Guest]);
        let by_name = filter_users(&users, &FilterCriteria::new(" R ", []));
        let by_role = filter_users(&users, &FilterCriteria::new("", [Role::Editor, Role::Guest]));
        let both = filter_users(&users, &criteria);

        for u in &both {
            assert!(by_name.contains(u) && by_role.contains(u));
        }
        for u in &users {
            if by_name.contains(u) && by_role.contains(u) {
                assert!(both.contains(u));
            }
        }
        assert_eq!(both, filter_users(&users, &criteria));
        assert_eq!(names(&both), ["Arianna Russo", "Sarah Williams"]);
    }
}

#[cfg(test)]
mod focus_tests {
    use user_directory::focus::{
        DialogClick, DialogEvent, DialogKey, DialogSpec, FocusHost, KeyOutcome,
        ModalFocusController,
    };

    /// Stand-in for a document: named elements, one of which has focus.
    #[derive(Default)]
    struct Page {
        focused: Option<String>,
        removed: Vec<String>,
        focus_calls: usize,
    }

    impl FocusHost<String> for Page {
        fn focused(&self) -> Option<String> {
            self.focused.clone()
        }
        fn focus(&mut self, target: &String) {
            self.focus_calls += 1;
            self.focused = Some(target.clone());
        }
        fn is_attached(&self, target: &String) -> bool {
            !self.removed.contains(target)
        }
    }

    fn page_focused_on(name: &str) -> Page {
        Page { focused: Some(name.to_string()), ..Page::default() }
    }

    fn dialog() -> DialogSpec<String> {
        DialogSpec::new(
            vec!["email".to_string(), "close".to_string()],
            "close".to_string(),
        )
    }

    #[test]
    fn test_open_moves_focus_to_close_control() {
        let mut page = page_focused_on("card-1");
        let mut ctl = ModalFocusController::new();
        ctl.open("user-1", dialog(), &mut page);
        assert!(ctl.is_open());
        assert_eq!(ctl.subject(), Some(&"user-1"));
        assert_eq!(page.focused.as_deref(), Some("close"));
        let state = ctl.focus_state().unwrap();
        assert_eq!(state.previously_focused.as_deref(), Some("card-1"));
    }

    #[test]
    fn test_escape_closes_and_restores_focus() {
        let mut page = page_focused_on("E");
        let mut ctl = ModalFocusController::new();
        ctl.open(1u32, dialog(), &mut page);
        assert_eq!(ctl.handle_key(DialogKey::Escape, &mut page), KeyOutcome::Closed);
        assert!(!ctl.is_open());
        assert_eq!(page.focused.as_deref(), Some("E"));
        // Listeners are gone once closed
        assert_eq!(ctl.handle_key(DialogKey::Escape, &mut page), KeyOutcome::Ignored);
    }

    #[test]
    fn test_tab_on_last_wraps_to_first() {
        let mut page = page_focused_on("E");
        let mut ctl = ModalFocusController::new();
        ctl.open(1u32, dialog(), &mut page);
        assert_eq!(ctl.handle_key(DialogKey::Tab, &mut page), KeyOutcome::Wrapped);
        assert_eq!(page.focused.as_deref(), Some("email"));
        // Not on the last element: the host's own advance applies
        assert_eq!(ctl.handle_key(DialogKey::Tab, &mut page), KeyOutcome::Ignored);
        assert_eq!(ctl.handle_key(DialogKey::Other, &mut page), KeyOutcome::Ignored);
    }

    #[test]
    fn test_backdrop_click_closes_panel_click_does_not() {
        let mut page = page_focused_on("E");
        let mut ctl = ModalFocusController::new();
        ctl.open(1u32, dialog(), &mut page);
        assert!(!ctl.handle_click(DialogClick::Panel, &mut page));
        assert!(ctl.is_open());
        assert!(ctl.handle_click(DialogClick::Backdrop, &mut page));
        assert!(!ctl.is_open());
        assert_eq!(page.focused.as_deref(), Some("E"));
    }

    #[test]
    fn test_removed_element_is_not_refocused() {
        let mut page = page_focused_on("E");
        let mut ctl = ModalFocusController::new();
        ctl.open(1u32, dialog(), &mut page);
        page.removed.push("E".to_string());
        let calls = page.focus_calls;
        assert_eq!(ctl.close(&mut page), None);
        assert_eq!(page.focus_calls, calls);
    }

    #[test]
    fn test_no_previous_focus_means_nothing_to_restore() {
        let mut page = Page::default();
        let mut ctl = ModalFocusController::new();
        ctl.open(1u32, dialog(), &mut page);
        assert_eq!(ctl.close(&mut page), None);
        assert_eq!(page.focused.as_deref(), Some("close"));
    }

    #[test]
    fn test_reopen_switches_subject() {
        let mut page = page_focused_on("card-1");
        let mut ctl = ModalFocusController::new();
        let events = ctl.subscribe();
        ctl.open("a", dialog(), &mut page);
        ctl.open("b", dialog(), &mut page);
        assert_eq!(ctl.subject(), Some(&"b"));
        // The first dialog handed focus back before the second captured it
        let state = ctl.focus_state().unwrap();
        assert_eq!(state.previously_focused.as_deref(), Some("card-1"));

        let got: Vec<_> = events.try_iter().collect();
        assert_eq!(
            got,
            vec![
                DialogEvent::Opened { subject: "a" },
                DialogEvent::FocusMoved { target: "close".to_string() },
                DialogEvent::Closed { restored: Some("card-1".to_string()) },
                DialogEvent::Opened { subject: "b" },
                DialogEvent::FocusMoved { target: "close".to_string() },
            ]
        );
    }
}

//! Navigation controller: owns one [`WebEngine`], mirrors its properties into
//! an observable [`NavigationState`] and exposes the chrome's command surface.
//!
//! The controller never publishes from a command. Commands are forwarded to
//! the engine, and the engine's notifications (fed through
//! [`NavigationController::notify`]) produce the new snapshots.

use tracing::{debug, trace};
use url::Url;

use crate::engine::{BackForwardEntry, LoadRequest, NavigationEvent, WebEngine};
use crate::intent::{self, SearchEngine};
use crate::observable::{CurrentValue, SubscriptionId};
use crate::state::{HistoryItem, NavigationState};

/// Commands the address bar (or any other UI) drives navigation with.
pub trait NavigationCommands {
    fn refresh(&mut self);
    fn cancel(&mut self);
    fn back(&mut self);
    fn forward(&mut self);
    fn go_to(&mut self, request: LoadRequest);
    fn go_to_text(&mut self, text: &str);
}

pub struct NavigationController<E: WebEngine> {
    engine: E,
    search: SearchEngine,
    state: CurrentValue<NavigationState>,
}

impl<E: WebEngine> NavigationController<E> {
    /// Takes ownership of `engine` and publishes a first snapshot of it.
    pub fn new(engine: E, search: SearchEngine) -> Self {
        let initial = snapshot(&engine, None, true);
        Self {
            engine,
            search,
            state: CurrentValue::new(initial),
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state.get()
    }

    /// Observable slot; subscribers get the latest state immediately.
    pub fn states(&self) -> &CurrentValue<NavigationState> {
        &self.state
    }

    pub fn subscribe(&self, callback: impl Fn(&NavigationState) + 'static) -> SubscriptionId {
        self.state.subscribe(callback)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access for glue code that feeds the engine's caches.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }

    /// Re-reads the engine and publishes a complete new snapshot.
    pub fn notify(&mut self, event: NavigationEvent) {
        let previous = self.state.get();
        let mut next = snapshot(&self.engine, Some(&previous), event.is_navigation());
        if event.ends_load() {
            // The engine may still report loading right after a failure.
            next = next.stopped();
        }
        trace!(
            ?event,
            url = next.current_url().map(|u| u.as_str()),
            loading = next.is_loading(),
            progress = next.loading_progress(),
            back = next.back_history().len(),
            forward = next.forward_history().len(),
            "Publishing navigation state"
        );
        self.state.publish(next);
    }

    fn is_current(&self, url: &Url) -> bool {
        self.engine.url().as_ref() == Some(url)
    }
}

impl<E: WebEngine> NavigationCommands for NavigationController<E> {
    fn refresh(&mut self) {
        self.engine.reload();
    }

    fn cancel(&mut self) {
        self.engine.stop_loading();
    }

    fn back(&mut self) {
        if self.engine.can_go_back() {
            self.engine.go_back();
        } else {
            debug!("back() ignored: no back history");
        }
    }

    fn forward(&mut self) {
        if self.engine.can_go_forward() {
            self.engine.go_forward();
        } else {
            debug!("forward() ignored: no forward history");
        }
    }

    fn go_to(&mut self, request: LoadRequest) {
        if self.is_current(request.url()) {
            debug!(url = %request.url(), "go_to() ignored: already on this URL");
            return;
        }
        self.engine.load(request);
    }

    fn go_to_text(&mut self, text: &str) {
        let Some(target) = intent::resolve_input(text, &self.search) else {
            debug!(endpoint = self.search.endpoint(), "go_to_text() ignored: invalid search endpoint");
            return;
        };
        debug!(?target, "Resolved address bar input");
        let url = target.into_url();
        if self.is_current(&url) {
            debug!(%url, "go_to_text() ignored: already on this URL");
            return;
        }
        self.engine.load(LoadRequest::new(url));
    }
}

/// Builds a snapshot from the engine's current properties.
///
/// With `rebuild_history` false the lists of `previous` are carried over,
/// keeping their item ids.
fn snapshot<E: WebEngine>(
    engine: &E,
    previous: Option<&NavigationState>,
    rebuild_history: bool,
) -> NavigationState {
    let (back, forward) = match previous {
        Some(prev) if !rebuild_history => (
            prev.back_history().to_vec(),
            prev.forward_history().to_vec(),
        ),
        _ => {
            let list = engine.back_forward_list();
            (history_items(list.back), history_items(list.forward))
        }
    };

    let state = NavigationState::new(engine.url(), engine.title());
    let state = if engine.is_loading() {
        state.loading(Some(engine.estimated_progress()))
    } else {
        state
    };
    state.with_history(back, forward)
}

fn history_items(entries: Vec<BackForwardEntry>) -> Vec<HistoryItem> {
    entries
        .into_iter()
        .map(|entry| HistoryItem::new(entry.title, entry.url))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::engine::BackForwardList;

    /// In-memory engine recording every command it receives.
    #[derive(Default)]
    pub(crate) struct FakeEngine {
        pub url: Option<Url>,
        pub title: Option<String>,
        pub loading: bool,
        pub progress: f64,
        pub history: BackForwardList,
        pub loads: Vec<Url>,
        pub reloads: usize,
        pub stops: usize,
        pub backs: usize,
        pub forwards: usize,
    }

    impl WebEngine for FakeEngine {
        fn url(&self) -> Option<Url> {
            self.url.clone()
        }
        fn title(&self) -> Option<String> {
            self.title.clone()
        }
        fn is_loading(&self) -> bool {
            self.loading
        }
        fn estimated_progress(&self) -> f64 {
            self.progress
        }
        fn can_go_back(&self) -> bool {
            !self.history.back.is_empty()
        }
        fn can_go_forward(&self) -> bool {
            !self.history.forward.is_empty()
        }
        fn back_forward_list(&self) -> BackForwardList {
            self.history.clone()
        }
        fn reload(&mut self) {
            self.reloads += 1;
        }
        fn stop_loading(&mut self) {
            self.stops += 1;
        }
        fn go_back(&mut self) {
            self.backs += 1;
        }
        fn go_forward(&mut self) {
            self.forwards += 1;
        }
        fn load(&mut self, request: LoadRequest) {
            self.loads.push(request.into_url());
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn entry(s: &str) -> BackForwardEntry {
        BackForwardEntry::new(None, url(s))
    }

    fn controller() -> NavigationController<FakeEngine> {
        NavigationController::new(FakeEngine::default(), SearchEngine::default())
    }

    fn at(page: &str) -> NavigationController<FakeEngine> {
        let engine = FakeEngine {
            url: Some(url(page)),
            ..FakeEngine::default()
        };
        NavigationController::new(engine, SearchEngine::default())
    }

    /// Counts publications after the initial replay.
    fn count_publications(c: &NavigationController<FakeEngine>) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        c.subscribe(move |_| sink.set(sink.get() + 1));
        count.set(0);
        count
    }

    fn assert_invariants(state: &NavigationState) {
        if !state.is_loading() {
            assert!(state.loading_progress().is_none(), "Progress without load: {state:?}");
        }
        assert_eq!(state.can_go_back(), !state.back_history().is_empty());
        assert_eq!(state.can_go_forward(), !state.forward_history().is_empty());
    }

    #[test]
    fn test_initial_state_mirrors_engine() {
        let engine = FakeEngine {
            url: Some(url("https://example.com")),
            title: Some("Example".into()),
            history: BackForwardList {
                back: vec![entry("https://a.example")],
                current: Some(entry("https://example.com")),
                forward: Vec::new(),
            },
            ..FakeEngine::default()
        };
        let c = NavigationController::new(engine, SearchEngine::default());
        let state = c.state();
        assert_eq!(state.current_url(), Some(&url("https://example.com")));
        assert_eq!(state.title(), Some("Example"));
        assert!(state.can_go_back());
        assert!(!state.can_go_forward());
        assert_invariants(&state);
    }

    #[test]
    fn test_refresh_and_cancel_are_forwarded() {
        let mut c = controller();
        c.refresh();
        c.cancel();
        c.cancel();
        assert_eq!(c.engine().reloads, 1);
        assert_eq!(c.engine().stops, 2);
    }

    #[test]
    fn test_back_without_history_is_noop() {
        let mut c = controller();
        let published = count_publications(&c);
        c.back();
        c.forward();
        assert_eq!(c.engine().backs, 0);
        assert_eq!(c.engine().forwards, 0);
        assert_eq!(published.get(), 0, "No state must be emitted");
    }

    #[test]
    fn test_back_and_forward_when_available() {
        let mut c = controller();
        c.engine_mut().history = BackForwardList {
            back: vec![entry("https://a.example")],
            current: Some(entry("https://b.example")),
            forward: vec![entry("https://c.example")],
        };
        c.back();
        c.forward();
        assert_eq!(c.engine().backs, 1);
        assert_eq!(c.engine().forwards, 1);
    }

    #[test]
    fn test_go_to_loads_request() {
        let mut c = controller();
        c.go_to(LoadRequest::new(url("https://example.com/page")));
        assert_eq!(c.engine().loads, vec![url("https://example.com/page")]);
    }

    #[test]
    fn test_go_to_same_url_is_noop() {
        let mut c = at("https://example.com/");
        let published = count_publications(&c);
        c.go_to(LoadRequest::new(url("https://example.com")));
        assert!(c.engine().loads.is_empty());
        assert_eq!(published.get(), 0);
    }

    #[test]
    fn test_go_to_text_resolves_bare_domain() {
        let mut c = controller();
        c.go_to_text("example.com");
        assert_eq!(c.engine().loads, vec![url("https://example.com")]);
    }

    #[test]
    fn test_go_to_text_keeps_explicit_scheme() {
        let mut c = controller();
        c.go_to_text("http://example.com");
        assert_eq!(c.engine().loads, vec![url("http://example.com")]);
    }

    #[test]
    fn test_go_to_text_searches_plain_text() {
        let mut c = controller();
        c.go_to_text("how to bake bread");
        assert_eq!(c.engine().loads.len(), 1);
        assert_eq!(
            c.engine().loads[0].as_str(),
            "https://www.google.com/search?q=how%20to%20bake%20bread"
        );
    }

    #[test]
    fn test_go_to_text_uses_configured_search_engine() {
        let mut c = NavigationController::new(
            FakeEngine::default(),
            SearchEngine::new("https://duckduckgo.com/?q="),
        );
        c.go_to_text("rust borrow checker");
        assert_eq!(
            c.engine().loads[0].as_str(),
            "https://duckduckgo.com/?q=rust%20borrow%20checker"
        );
    }

    #[test]
    fn test_go_to_text_same_url_is_noop() {
        let mut c = at("https://example.com/");
        let published = count_publications(&c);
        c.go_to_text("example.com");
        assert!(c.engine().loads.is_empty());
        assert_eq!(published.get(), 0);
    }

    #[test]
    fn test_go_to_text_encodes_whole_input() {
        let mut c = controller();
        c.go_to_text("  how to bake bread ");
        c.go_to_text("");
        let loads: Vec<&str> = c.engine().loads.iter().map(Url::as_str).collect();
        assert_eq!(
            loads,
            vec![
                "https://www.google.com/search?q=%20%20how%20to%20bake%20bread%20",
                "https://www.google.com/search?q=",
            ]
        );
    }

    #[test]
    fn test_go_to_text_with_invalid_endpoint_is_noop() {
        let mut c = NavigationController::new(FakeEngine::default(), SearchEngine::new("not a url "));
        let published = count_publications(&c);
        c.go_to_text("hello world");
        assert!(c.engine().loads.is_empty());
        assert_eq!(published.get(), 0);
    }

    #[test]
    fn test_notify_publishes_full_snapshot() {
        let mut c = controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        c.subscribe(move |s: &NavigationState| sink.borrow_mut().push(s.clone()));

        c.engine_mut().url = Some(url("https://example.com"));
        c.engine_mut().loading = true;
        c.engine_mut().progress = 0.3;
        c.notify(NavigationEvent::LoadStarted);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2, "Replay plus one publication");
        let last = seen.last().unwrap();
        assert_eq!(last.current_url(), Some(&url("https://example.com")));
        assert!(last.is_loading());
        assert_eq!(last.loading_progress(), Some(0.3));
        assert_invariants(last);
    }

    #[test]
    fn test_progress_clears_when_load_finishes() {
        let mut c = controller();
        c.engine_mut().loading = true;
        c.engine_mut().progress = 0.8;
        c.notify(NavigationEvent::ProgressChanged);
        assert_eq!(c.state().loading_progress(), Some(0.8));

        c.engine_mut().loading = false;
        c.notify(NavigationEvent::LoadFinished);
        let state = c.state();
        assert!(!state.is_loading());
        assert!(state.loading_progress().is_none());
    }

    #[test]
    fn test_failed_load_always_ends_not_loading() {
        let mut c = controller();
        c.engine_mut().url = Some(url("https://unreachable.example"));
        c.engine_mut().title = Some("Unreachable".into());
        c.engine_mut().loading = true;
        c.engine_mut().progress = 0.5;
        c.engine_mut().history.back = vec![entry("https://a.example")];
        c.notify(NavigationEvent::LoadStarted);

        // The engine still claims to be loading when it reports the failure.
        c.notify(NavigationEvent::LoadFailed);
        let state = c.state();
        assert!(!state.is_loading());
        assert!(state.loading_progress().is_none());
        assert_eq!(state.current_url(), Some(&url("https://unreachable.example")));
        assert_eq!(state.title(), Some("Unreachable"));
        assert!(state.can_go_back(), "History survives a failed load");
        assert_invariants(&state);
    }

    #[test]
    fn test_history_rebuilt_on_list_change() {
        let mut c = controller();
        c.engine_mut().history = BackForwardList::from_entries(
            vec![
                entry("https://a.example"),
                entry("https://b.example"),
                entry("https://c.example"),
            ],
            1,
        );
        c.notify(NavigationEvent::BackForwardListChanged);

        let state = c.state();
        assert_eq!(state.back_history().len(), 1);
        assert_eq!(state.back_history()[0].url(), &url("https://a.example"));
        assert_eq!(state.forward_history().len(), 1);
        assert_eq!(state.forward_history()[0].url(), &url("https://c.example"));
        assert_invariants(&state);
    }

    #[test]
    fn test_title_and_progress_events_keep_history_ids() {
        let mut c = controller();
        c.engine_mut().history.back = vec![entry("https://a.example")];
        c.notify(NavigationEvent::BackForwardListChanged);
        let id = c.state().back_history()[0].id();

        c.engine_mut().title = Some("New title".into());
        c.notify(NavigationEvent::TitleChanged);
        c.notify(NavigationEvent::ProgressChanged);
        assert_eq!(c.state().back_history()[0].id(), id);
        assert_eq!(c.state().title(), Some("New title"));

        c.notify(NavigationEvent::UrlChanged);
        assert_ne!(
            c.state().back_history()[0].id(),
            id,
            "Navigation events rebuild the lists"
        );
    }

    #[test]
    fn test_invariants_hold_across_event_sequence() {
        let mut c = controller();
        let events = [
            NavigationEvent::LoadStarted,
            NavigationEvent::LoadCommitted,
            NavigationEvent::ProgressChanged,
            NavigationEvent::TitleChanged,
            NavigationEvent::UrlChanged,
            NavigationEvent::BackForwardListChanged,
            NavigationEvent::LoadFinished,
            NavigationEvent::LoadFailed,
        ];
        for (i, event) in events.into_iter().enumerate() {
            c.engine_mut().loading = i % 2 == 0;
            c.engine_mut().progress = i as f64 / 10.0;
            if i % 3 == 0 {
                c.engine_mut().history.back.push(entry("https://a.example"));
            }
            c.notify(event);
            assert_invariants(&c.state());
        }
    }
}

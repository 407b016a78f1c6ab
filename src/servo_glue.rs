//! Couche d'intégration entre Servo et OMWeb.
//!
//! 1. **[`Waker`] / [`WakerEvent`]** : le pont `Send + Sync` entre les threads
//!    internes de Servo et le thread principal Winit.
//!
//! 2. **[`ServoEngine`]** : implémentation de [`WebEngine`] au-dessus d'une
//!    `WebView` Servo, pilotée par le [`NavigationController`].
//!
//! 3. **[`WebViewDelegate`] pour [`AppState`]** : traduit les callbacks Servo
//!    en [`NavigationEvent`] pour le contrôleur.
//!
//! [`NavigationController`]: crate::controller::NavigationController

use std::panic::{self, AssertUnwindSafe};

use servo::{LoadStatus, WebView, WebViewDelegate};
use tracing::{debug, error, warn};
use url::Url;
use winit::event_loop::{EventLoop, EventLoopProxy};

use crate::browser::AppState;
use crate::engine::{BackForwardEntry, BackForwardList, LoadRequest, NavigationEvent, WebEngine};

// ─────────────────────────────────────────────────────────────────────────────
// Waker : pont Servo → Winit
// ─────────────────────────────────────────────────────────────────────────────

/// Événement marqueur envoyé à travers l'`EventLoopProxy` de Winit.
///
/// La boucle Winit le reçoit dans `user_event()` et appelle
/// `servo.spin_event_loop()` en réponse.
#[derive(Debug)]
pub struct WakerEvent;

/// `Clone + Send + Sync` car `EventLoopProxy` l'est, ce qu'exige
/// `EventLoopWaker: 'static + Send + Sync`.
#[derive(Clone)]
pub struct Waker(EventLoopProxy<WakerEvent>);

impl Waker {
    pub fn new(event_loop: &EventLoop<WakerEvent>) -> Self {
        Self(event_loop.create_proxy())
    }
}

impl embedder_traits::EventLoopWaker for Waker {
    fn clone_box(&self) -> Box<dyn embedder_traits::EventLoopWaker> {
        Box::new(Self(self.0.clone()))
    }

    fn wake(&self) {
        if let Err(error) = self.0.send_event(WakerEvent) {
            warn!(?error, "Échec du réveil de la boucle d'événements Winit");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServoEngine : WebEngine au-dessus d'une WebView
// ─────────────────────────────────────────────────────────────────────────────

/// Servo ne renvoie qu'une liste d'URLs pour l'historique de session ; on la
/// garde en cache depuis `notify_history_changed`.
pub struct ServoEngine {
    webview: WebView,
    history: SessionHistory,
}

impl ServoEngine {
    pub fn new(webview: WebView) -> Self {
        Self {
            webview,
            history: SessionHistory::default(),
        }
    }

    pub fn webview(&self) -> &WebView {
        &self.webview
    }

    pub fn record_history(&mut self, entries: Vec<Url>, current: usize) {
        self.history = SessionHistory { entries, current };
    }
}

impl WebEngine for ServoEngine {
    fn url(&self) -> Option<Url> {
        self.webview.url()
    }

    fn title(&self) -> Option<String> {
        self.webview.page_title()
    }

    fn is_loading(&self) -> bool {
        self.webview.load_status() != LoadStatus::Complete
    }

    fn estimated_progress(&self) -> f64 {
        progress_for(self.webview.load_status())
    }

    fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    fn back_forward_list(&self) -> BackForwardList {
        self.history.list(self.title())
    }

    fn reload(&mut self) {
        self.webview.reload();
    }

    /// Pas d'arrêt natif côté Servo : on passe par le DOM.
    fn stop_loading(&mut self) {
        self.webview.evaluate_javascript("window.stop()", |result| {
            if let Err(error) = result {
                debug!(?error, "window.stop() failed");
            }
        });
    }

    fn go_back(&mut self) {
        self.webview.go_back(1);
    }

    fn go_forward(&mut self) {
        self.webview.go_forward(1);
    }

    fn load(&mut self, request: LoadRequest) {
        self.webview.load(request.into_url());
    }
}

/// Servo ne publie que trois étapes de chargement.
fn progress_for(status: LoadStatus) -> f64 {
    match status {
        LoadStatus::Started => 0.1,
        LoadStatus::HeadParsed => 0.5,
        LoadStatus::Complete => 1.0,
    }
}

fn event_for(status: LoadStatus) -> NavigationEvent {
    match status {
        LoadStatus::Started => NavigationEvent::LoadStarted,
        LoadStatus::HeadParsed => NavigationEvent::LoadCommitted,
        LoadStatus::Complete => NavigationEvent::LoadFinished,
    }
}

/// Dernier historique reçu de Servo : URLs et index de l'entrée courante.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SessionHistory {
    entries: Vec<Url>,
    current: usize,
}

impl SessionHistory {
    /// Only the current entry has a known title.
    fn list(&self, title: Option<String>) -> BackForwardList {
        let entries = self
            .entries
            .iter()
            .map(|url| BackForwardEntry::new(None, url.clone()))
            .collect();
        let mut list = BackForwardList::from_entries(entries, self.current);
        if let Some(entry) = list.current.as_mut() {
            entry.title = title;
        }
        list
    }

    // Même découpage que `list`, pour que l'état publié et les commandes
    // soient d'accord.
    fn can_go_back(&self) -> bool {
        !self.list(None).back.is_empty()
    }

    fn can_go_forward(&self) -> bool {
        !self.list(None).forward.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WebViewDelegate : callbacks Servo → contrôleur
// ─────────────────────────────────────────────────────────────────────────────

/// Exécute un callback delegate sans laisser une panique remonter dans Servo.
fn guarded(callback: &'static str, body: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(body)).is_err() {
        warn!(callback, "Panic in WebViewDelegate callback, recovered");
    }
}

impl WebViewDelegate for AppState {
    fn notify_new_frame_ready(&self, _webview: WebView) {
        guarded("new_frame_ready", || self.window.request_redraw());
    }

    fn notify_load_status_changed(&self, _webview: WebView, status: LoadStatus) {
        guarded("load_status_changed", || {
            debug!(?status, "Load status changed");
            self.with_controller(|c| c.notify(event_for(status)));
        });
    }

    fn notify_url_changed(&self, _webview: WebView, url: Url) {
        guarded("url_changed", || {
            debug!(%url, "URL changed");
            self.with_controller(|c| c.notify(NavigationEvent::UrlChanged));
        });
    }

    fn notify_page_title_changed(&self, _webview: WebView, _title: Option<String>) {
        guarded("page_title_changed", || {
            self.with_controller(|c| c.notify(NavigationEvent::TitleChanged));
        });
    }

    fn notify_history_changed(&self, _webview: WebView, entries: Vec<Url>, current: usize) {
        guarded("history_changed", || {
            self.with_controller(|c| {
                c.engine_mut().record_history(entries, current);
                c.notify(NavigationEvent::BackForwardListChanged);
            });
        });
    }

    fn notify_crashed(&self, _webview: WebView, reason: String, _backtrace: Option<String>) {
        guarded("crashed", || {
            error!(%reason, "WebView crashed");
            self.with_controller(|c| c.notify(NavigationEvent::LoadFailed));
        });
    }
}

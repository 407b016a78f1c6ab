//! Seam between the controller and the web engine that actually loads pages.
//!
//! [`WebEngine`] covers the handful of webview properties and commands the
//! chrome needs. [`crate::servo_glue::ServoEngine`] implements it over a
//! Servo `WebView`; tests use an in-memory fake.

use url::Url;

/// Request to load a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    url: Url,
}

impl LoadRequest {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn into_url(self) -> Url {
        self.url
    }
}

impl From<Url> for LoadRequest {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}

/// One entry as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackForwardEntry {
    pub title: Option<String>,
    pub url: Url,
}

impl BackForwardEntry {
    pub fn new(title: Option<String>, url: Url) -> Self {
        Self { title, url }
    }
}

/// The engine's authoritative session history, split around the current entry.
/// Both lists are ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackForwardList {
    pub back: Vec<BackForwardEntry>,
    pub current: Option<BackForwardEntry>,
    pub forward: Vec<BackForwardEntry>,
}

impl BackForwardList {
    /// Splits a flat history at `current`. An out-of-range index yields an
    /// empty forward list and no current entry.
    pub fn from_entries(entries: Vec<BackForwardEntry>, current: usize) -> Self {
        let mut entries = entries;
        if current >= entries.len() {
            return Self {
                back: entries,
                current: None,
                forward: Vec::new(),
            };
        }
        let forward = entries.split_off(current + 1);
        let current = entries.pop();
        Self {
            back: entries,
            current,
            forward,
        }
    }
}

/// Lifecycle notifications the engine reports to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    LoadStarted,
    /// The response was committed and the new document is being parsed.
    LoadCommitted,
    ProgressChanged,
    LoadFinished,
    LoadFailed,
    BackForwardListChanged,
    TitleChanged,
    UrlChanged,
}

impl NavigationEvent {
    /// Events that may move the session history.
    pub fn is_navigation(self) -> bool {
        !matches!(self, Self::ProgressChanged | Self::TitleChanged)
    }

    /// Events after which no load is in flight.
    pub fn ends_load(self) -> bool {
        matches!(self, Self::LoadFinished | Self::LoadFailed)
    }
}

/// Webview operations used by the navigation controller.
pub trait WebEngine {
    fn url(&self) -> Option<Url>;
    fn title(&self) -> Option<String>;
    fn is_loading(&self) -> bool;
    /// Estimated load progress in `[0, 1]`.
    fn estimated_progress(&self) -> f64;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn back_forward_list(&self) -> BackForwardList;

    fn reload(&mut self);
    fn stop_loading(&mut self);
    fn go_back(&mut self);
    fn go_forward(&mut self);
    fn load(&mut self, request: LoadRequest);
}

//! Navigation state snapshot published by the [`NavigationController`].
//!
//! A [`NavigationState`] is never edited after construction: the controller
//! builds a fresh value on every engine notification and replaces the
//! previous one wholesale.
//!
//! [`NavigationController`]: crate::controller::NavigationController

use std::fmt;

use url::Url;
use uuid::Uuid;

/// Stable identity of a [`HistoryItem`], usable as a list key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryItemId(Uuid);

impl HistoryItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HistoryItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a back or forward list.
///
/// Equality includes the id: two items pointing at the same page are still
/// distinct entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    id: HistoryItemId,
    title: Option<String>,
    url: Url,
}

impl HistoryItem {
    pub fn new(title: Option<String>, url: Url) -> Self {
        Self {
            id: HistoryItemId::new(),
            title,
            url,
        }
    }

    pub fn id(&self) -> HistoryItemId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Load status. Progress only exists while loading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum LoadPhase {
    #[default]
    Idle,
    Loading { progress: Option<f64> },
}

/// Snapshot of everything the chrome needs to render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationState {
    current_url: Option<Url>,
    title: Option<String>,
    phase: LoadPhase,
    back_history: Vec<HistoryItem>,
    forward_history: Vec<HistoryItem>,
}

impl NavigationState {
    /// A state for a page that is not loading and has no history.
    pub fn new(current_url: Option<Url>, title: Option<String>) -> Self {
        Self {
            current_url,
            title,
            ..Self::default()
        }
    }

    /// Marks the state as loading. `progress` is clamped to `[0, 1]`;
    /// non-finite values are dropped.
    pub fn loading(mut self, progress: Option<f64>) -> Self {
        let progress = progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0));
        self.phase = LoadPhase::Loading { progress };
        self
    }

    /// Same state with no load in flight.
    pub fn stopped(mut self) -> Self {
        self.phase = LoadPhase::Idle;
        self
    }

    /// Replaces both history lists at once.
    pub fn with_history(mut self, back: Vec<HistoryItem>, forward: Vec<HistoryItem>) -> Self {
        self.back_history = back;
        self.forward_history = forward;
        self
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading { .. })
    }

    pub fn loading_progress(&self) -> Option<f64> {
        match self.phase {
            LoadPhase::Loading { progress } => progress,
            LoadPhase::Idle => None,
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_history.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward_history.is_empty()
    }

    pub fn back_history(&self) -> &[HistoryItem] {
        &self.back_history
    }

    pub fn forward_history(&self) -> &[HistoryItem] {
        &self.forward_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_default_state_is_idle_and_empty() {
        let state = NavigationState::default();
        assert!(state.current_url().is_none());
        assert!(state.title().is_none());
        assert!(!state.is_loading());
        assert!(state.loading_progress().is_none());
        assert!(!state.can_go_back());
        assert!(!state.can_go_forward());
    }

    #[test]
    fn test_progress_only_present_while_loading() {
        let idle = NavigationState::new(Some(url("https://example.com")), None);
        assert!(idle.loading_progress().is_none());

        let loading = idle.clone().loading(Some(0.4));
        assert!(loading.is_loading());
        assert_eq!(loading.loading_progress(), Some(0.4));

        let unknown = idle.loading(None);
        assert!(unknown.is_loading());
        assert!(unknown.loading_progress().is_none());

        let stopped = loading.stopped();
        assert!(!stopped.is_loading());
        assert!(stopped.loading_progress().is_none());
    }

    #[test]
    fn test_progress_is_clamped() {
        let state = NavigationState::default().loading(Some(1.7));
        assert_eq!(state.loading_progress(), Some(1.0));

        let state = NavigationState::default().loading(Some(-0.2));
        assert_eq!(state.loading_progress(), Some(0.0));

        let state = NavigationState::default().loading(Some(f64::NAN));
        assert!(state.is_loading());
        assert!(state.loading_progress().is_none(), "NaN progress should be dropped");
    }

    #[test]
    fn test_back_forward_availability_follows_lists() {
        let back = vec![HistoryItem::new(None, url("https://a.example"))];
        let state = NavigationState::default().with_history(back, Vec::new());
        assert!(state.can_go_back());
        assert!(!state.can_go_forward());
        assert_eq!(state.back_history().len(), 1);
    }

    #[test]
    fn test_history_items_with_same_content_are_distinct() {
        let a = HistoryItem::new(Some("A".into()), url("https://a.example"));
        let b = HistoryItem::new(Some("A".into()), url("https://a.example"));
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone(), "A clone keeps its identity");
    }
}

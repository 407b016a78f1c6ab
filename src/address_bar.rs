//! Barre d'adresse — état local d'édition et contrôles.
//!
//! Ce module ne garde que de l'état d'interface transitoire : focus, tampon
//! d'édition avec curseur, et un indicateur de chargement local qui choisit
//! entre le bouton « recharger » et le bouton « annuler ». Toute la logique
//! de navigation est déléguée à un [`NavigationCommands`].
//!
//! Aucune dépendance graphique : [`AddressBar::view`] produit un modèle de
//! rendu que l'hôte dessine comme il veut.

use url::Url;

use crate::controller::NavigationCommands;
use crate::state::NavigationState;

/// Texte affiché quand le champ est vide.
pub const PLACEHOLDER: &str = "Search or URL...";

/// Normalise une URL pour l'affichage (prévention des attaques homographes).
///
/// - Les hôtes punycode (`xn--…`) reçoivent un marqueur d'avertissement visible.
/// - Les caractères invisibles (espaces de largeur nulle, BOM…) sont retirés.
fn normalize_url_for_display(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    if host.starts_with("xn--") || host.contains(".xn--") {
        return format!("⚠️  {url} (Punycode)");
    }

    url.as_str()
        .chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200D}'
                | '\u{2060}'
                | '\u{FEFF}'
                | '\u{034F}'
                | '\u{2028}'
                | '\u{2029}'
            )
        })
        .collect()
}

/// État du focus du champ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Pas de focus — le champ affiche l'URL courante.
    Unfocused,
    /// Vient d'être focusé : tout est sélectionné, la prochaine frappe remplace le texte.
    Focused,
    /// Édition caractère par caractère.
    Editing,
}

/// Contrôles cliquables de la barre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Bouton unique : recharger, ou annuler pendant un chargement.
    ReloadOrCancel,
    /// Efface le tampon d'édition.
    Clear,
    /// Bouton « … ».
    Menu,
}

/// Icône du bouton recharger/annuler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadButton {
    Reload,
    Cancel,
}

/// Intention utilisateur produite par la barre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBarIntent {
    Navigate(String),
    Refresh,
    Cancel,
    ShowMenu,
}

impl AddressBarIntent {
    /// Transmet l'intention à `commands`. Les intentions sans commande de
    /// navigation associée (`ShowMenu`) sont rendues à l'appelant.
    pub fn dispatch<C: NavigationCommands + ?Sized>(self, commands: &mut C) -> Option<Self> {
        match self {
            Self::Navigate(text) => commands.go_to_text(&text),
            Self::Refresh => commands.refresh(),
            Self::Cancel => commands.cancel(),
            Self::ShowMenu => return Some(Self::ShowMenu),
        }
        None
    }
}

/// Modèle de rendu de la barre pour un `NavigationState` donné.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressBarView {
    /// Texte du champ (URL normalisée ou saisie en cours).
    pub text: String,
    /// Placeholder à afficher quand `text` est vide.
    pub placeholder: &'static str,
    pub focused: bool,
    /// Curseur en nombre de caractères, seulement pendant l'édition.
    pub cursor: Option<usize>,
    pub reload_button: ReloadButton,
    pub show_clear: bool,
    pub title: Option<String>,
    pub progress: Option<f64>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// État local de la barre d'adresse.
pub struct AddressBar {
    /// Texte affiché / édité.
    text: String,
    /// Position du curseur en offset d'octets dans `text`.
    cursor: usize,
    focus: Focus,
    /// URL courante, mise à jour par [`AddressBar::sync`].
    current_url: Option<Url>,
    /// Indicateur local : choisit l'icône recharger/annuler.
    is_loading: bool,
}

impl Default for AddressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressBar {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            focus: Focus::Unfocused,
            current_url: None,
            is_loading: false,
        }
    }

    /// Applique un nouvel état publié. Le texte n'est remplacé que hors édition.
    pub fn sync(&mut self, state: &NavigationState) {
        self.is_loading = state.is_loading();
        self.current_url = state.current_url().cloned();
        match self.focus {
            Focus::Unfocused => self.show_current_url(),
            // Rien n'a encore été tapé : la sélection suit la nouvelle URL.
            Focus::Focused => self.select_current_url(),
            Focus::Editing => {}
        }
    }

    fn show_current_url(&mut self) {
        self.text = self
            .current_url
            .as_ref()
            .map(normalize_url_for_display)
            .unwrap_or_default();
        self.cursor = self.text.len();
    }

    /// Donne le focus au champ et sélectionne tout. La saisie commence sur
    /// l'URL brute, sans le marqueur d'avertissement.
    pub fn focus(&mut self) {
        if self.focus == Focus::Unfocused {
            self.select_current_url();
        }
        self.focus = Focus::Focused;
        self.cursor = self.text.len();
    }

    fn select_current_url(&mut self) {
        if let Some(ref url) = self.current_url {
            self.text = url.to_string();
        }
        self.cursor = self.text.len();
    }

    /// Retire le focus (Escape) et restaure l'URL courante.
    pub fn unfocus(&mut self) {
        self.focus = Focus::Unfocused;
        self.show_current_url();
    }

    /// Sort du mode « tout sélectionné » en vidant le champ.
    fn take_selection(&mut self) -> bool {
        if self.focus == Focus::Focused {
            self.text.clear();
            self.cursor = 0;
            self.focus = Focus::Editing;
            return true;
        }
        false
    }

    pub fn insert_char(&mut self, c: char) {
        if self.focus == Focus::Unfocused {
            return;
        }
        self.take_selection();
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert_char(c);
        }
    }

    /// Backspace.
    pub fn backspace(&mut self) {
        if self.focus == Focus::Unfocused || self.take_selection() {
            return;
        }
        if let Some((prev, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    /// Delete.
    pub fn delete(&mut self) {
        if self.focus == Focus::Unfocused || self.take_selection() {
            return;
        }
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.text.drain(self.cursor..self.cursor + c.len_utf8());
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.focus == Focus::Focused {
            self.focus = Focus::Editing;
            self.cursor = 0;
            return;
        }
        if let Some((prev, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.cursor = prev;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.focus == Focus::Focused {
            // le curseur est déjà en fin de texte
            self.focus = Focus::Editing;
            return;
        }
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn home(&mut self) {
        if self.focus == Focus::Focused {
            self.focus = Focus::Editing;
        }
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        if self.focus == Focus::Focused {
            self.focus = Focus::Editing;
        }
        self.cursor = self.text.len();
    }

    /// Ctrl+A.
    pub fn select_all(&mut self) {
        if self.focus != Focus::Unfocused {
            self.focus = Focus::Focused;
            self.cursor = self.text.len();
        }
    }

    /// Valide la saisie (Enter). Une saisie blanche ne produit rien et garde
    /// le focus. Le champ revient à l'URL courante ; le prochain `sync`
    /// affichera la destination.
    pub fn submit(&mut self) -> Option<AddressBarIntent> {
        if self.text.trim().is_empty() {
            return None;
        }
        let intent = AddressBarIntent::Navigate(std::mem::take(&mut self.text));
        self.unfocus();
        Some(intent)
    }

    /// Clic sur un contrôle.
    pub fn tap(&mut self, control: Control) -> Option<AddressBarIntent> {
        match control {
            Control::ReloadOrCancel if self.is_loading => Some(AddressBarIntent::Cancel),
            Control::ReloadOrCancel => Some(AddressBarIntent::Refresh),
            // Le bouton n'est visible que pendant l'édition.
            Control::Clear if self.focus == Focus::Unfocused => None,
            Control::Clear => {
                self.text.clear();
                self.cursor = 0;
                self.focus = Focus::Editing;
                None
            }
            Control::Menu => Some(AddressBarIntent::ShowMenu),
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focus != Focus::Unfocused
    }

    pub fn focus_state(&self) -> Focus {
        self.focus
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn display_text(&self) -> &str {
        &self.text
    }

    /// Position du curseur en octets.
    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }

    /// Nombre de caractères avant le curseur (pour le rendu).
    pub fn cursor_char_offset(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }

    /// Modèle de rendu pour `state`.
    pub fn view(&self, state: &NavigationState) -> AddressBarView {
        AddressBarView {
            text: self.text.clone(),
            placeholder: PLACEHOLDER,
            focused: self.is_focused(),
            cursor: self.is_focused().then(|| self.cursor_char_offset()),
            reload_button: if self.is_loading {
                ReloadButton::Cancel
            } else {
                ReloadButton::Reload
            },
            show_clear: self.is_focused() && !self.text.is_empty(),
            title: state.title().map(str::to_owned),
            progress: state.loading_progress(),
            can_go_back: state.can_go_back(),
            can_go_forward: state.can_go_forward(),
        }
    }
}

impl AddressBarView {
    /// Rend la barre sur une seule ligne (titre de fenêtre, logs).
    pub fn to_line(&self) -> String {
        let nav = format!(
            "{}{}",
            if self.can_go_back { "◀" } else { "◁" },
            if self.can_go_forward { "▶" } else { "▷" },
        );
        let button = match self.reload_button {
            ReloadButton::Reload => "⟳",
            ReloadButton::Cancel => "✕",
        };

        let field = if self.text.is_empty() {
            self.placeholder.to_string()
        } else if let Some(cursor) = self.cursor {
            let mut field: String = self.text.chars().take(cursor).collect();
            field.push('|');
            field.extend(self.text.chars().skip(cursor));
            field
        } else {
            self.text.clone()
        };

        let mut line = format!("{nav} {button} {field}");
        if let Some(progress) = self.progress {
            line.push_str(&format!(" [{:>3.0}%]", progress * 100.0));
        }
        if !self.focused
            && let Some(ref title) = self.title
        {
            line.push_str(" — ");
            line.push_str(title);
        }
        line
    }
}

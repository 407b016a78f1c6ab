//! Résolution de la saisie utilisateur : URL ou recherche ?
//!
//! Le texte tapé dans la barre d'adresse est scanné à la recherche d'un
//! lien (`linkify`). Le premier lien trouvé devient la destination, préfixé
//! par `https://` s'il n'a pas de schéma HTTP(S). Sans lien exploitable, on
//! construit une URL de recherche avec toute la saisie encodée.

use linkify::{LinkFinder, LinkKind};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;
use url::Url;

/// Moteur de recherche par défaut ; la requête est concaténée à la fin.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.google.com/search?q=";

/// Caractères laissés tels quels dans la valeur de requête (RFC 3986 « unreserved »).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Point d'entrée de recherche (préfixe d'URL auquel la requête encodée est ajoutée).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngine {
    endpoint: String,
}

impl SearchEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL de recherche pour `query`, ou `None` si le préfixe configuré
    /// ne forme pas une URL valide.
    pub fn query_url(&self, query: &str) -> Option<Url> {
        let encoded = utf8_percent_encode(query, QUERY_VALUE);
        match Url::parse(&format!("{}{encoded}", self.endpoint)) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(endpoint = %self.endpoint, error = %e, "Search endpoint is not a valid URL");
                None
            }
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_ENDPOINT)
    }
}

/// Destination résolue et la branche qui l'a produite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Un lien détecté dans la saisie.
    Link(Url),
    /// Une requête envoyée au moteur de recherche.
    Search(Url),
}

impl NavigationTarget {
    pub fn url(&self) -> &Url {
        match self {
            Self::Link(url) | Self::Search(url) => url,
        }
    }

    pub fn into_url(self) -> Url {
        match self {
            Self::Link(url) | Self::Search(url) => url,
        }
    }
}

/// Résout une saisie libre en destination.
///
/// - Le premier lien trouvé gagne ; `https://` est ajouté sans schéma HTTP(S).
/// - Sans lien (ou si le lien ne se parse pas), recherche sur `search` avec
///   la saisie entière, espaces compris. Une saisie vide donne une requête vide.
///
/// Les échecs de détection ne remontent jamais : on retombe sur la recherche.
/// `None` seulement si le préfixe de recherche n'est pas une URL valide.
pub fn resolve_input(input: &str, search: &SearchEngine) -> Option<NavigationTarget> {
    if let Some(url) = detect_link(input.trim()) {
        return Some(NavigationTarget::Link(url));
    }

    search.query_url(input).map(NavigationTarget::Search)
}

/// Premier lien de `text`, normalisé en URL HTTP(S).
fn detect_link(text: &str) -> Option<Url> {
    let mut finder = LinkFinder::new();
    finder.url_must_have_scheme(false).kinds(&[LinkKind::Url]);

    let link = finder.links(text).next()?;
    let candidate = link.as_str();
    let candidate = if has_http_scheme(candidate) {
        candidate.to_string()
    } else {
        format!("https://{candidate}")
    };

    match Url::parse(&candidate) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(candidate, error = %e, "Detected link is not a valid URL, searching instead");
            None
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let starts_with = |prefix: &str| {
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    starts_with("http://") || starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(input: &str) -> Option<NavigationTarget> {
        resolve_input(input, &SearchEngine::default())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_bare_domain_gets_https() {
        let target = resolve("example.com").unwrap();
        assert_eq!(target, NavigationTarget::Link(url("https://example.com")));
    }

    #[test]
    fn test_http_url_is_kept_unchanged() {
        let target = resolve("http://example.com").unwrap();
        assert_eq!(target.url(), &url("http://example.com"));
        assert_eq!(target.url().scheme(), "http", "http must not be upgraded");
    }

    #[test]
    fn test_https_url_with_path_and_query() {
        let target = resolve("https://www.rust-lang.org/learn?lang=fr").unwrap();
        assert_eq!(
            target,
            NavigationTarget::Link(url("https://www.rust-lang.org/learn?lang=fr"))
        );
    }

    #[test]
    fn test_uppercase_scheme_is_not_prefixed_again() {
        let target = resolve("HTTPS://example.com/a").unwrap();
        assert_eq!(target.url(), &url("https://example.com/a"));
    }

    #[test]
    fn test_link_inside_sentence_is_extracted() {
        let target = resolve("have a look at example.org please").unwrap();
        assert_eq!(target, NavigationTarget::Link(url("https://example.org")));
    }

    #[test]
    fn test_first_link_wins() {
        let target = resolve("example.org or example.net").unwrap();
        assert_eq!(target.url(), &url("https://example.org"));
    }

    #[test]
    fn test_plain_text_becomes_search() {
        let target = resolve("how to bake bread").unwrap();
        assert_eq!(
            target,
            NavigationTarget::Search(url(
                "https://www.google.com/search?q=how%20to%20bake%20bread"
            ))
        );
        assert_eq!(
            target.url().as_str(),
            "https://www.google.com/search?q=how%20to%20bake%20bread"
        );
    }

    #[test]
    fn test_search_encodes_reserved_characters() {
        let target = resolve("c++ & rust?").unwrap();
        assert_eq!(
            target.url().as_str(),
            "https://www.google.com/search?q=c%2B%2B%20%26%20rust%3F"
        );
    }

    #[test]
    fn test_search_encodes_non_ascii() {
        let target = resolve("café crème").unwrap();
        assert!(matches!(target, NavigationTarget::Search(_)));
        assert_eq!(
            target.url().query(),
            Some("q=caf%C3%A9%20cr%C3%A8me")
        );
    }

    #[test]
    fn test_email_is_not_treated_as_link() {
        let target = resolve("mail someone@example").unwrap();
        assert!(
            matches!(target, NavigationTarget::Search(_)),
            "Expected a search, got {target:?}"
        );
    }

    #[test]
    fn test_custom_search_endpoint() {
        let engine = SearchEngine::new("https://duckduckgo.com/?q=");
        let target = resolve_input("hello world", &engine).unwrap();
        assert_eq!(target.url().as_str(), "https://duckduckgo.com/?q=hello%20world");
    }

    #[test]
    fn test_invalid_search_endpoint_resolves_nothing() {
        let engine = SearchEngine::new("not a url ");
        assert!(resolve_input("hello world", &engine).is_none());
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let target = resolve("  how to bake bread ").unwrap();
        assert_eq!(
            target.url().as_str(),
            "https://www.google.com/search?q=%20%20how%20to%20bake%20bread%20"
        );
    }

    #[test]
    fn test_link_detection_ignores_surrounding_whitespace() {
        let target = resolve("  example.com  ").unwrap();
        assert_eq!(target, NavigationTarget::Link(url("https://example.com")));
    }

    #[test]
    fn test_empty_input_is_an_empty_search() {
        let target = resolve("").unwrap();
        assert!(matches!(target, NavigationTarget::Search(_)));
        assert_eq!(target.url().as_str(), "https://www.google.com/search?q=");

        let blank = resolve("   ").unwrap();
        assert_eq!(blank.url().as_str(), "https://www.google.com/search?q=%20%20%20");
    }

    #[test]
    fn test_non_http_link_gets_https_prefix_verbatim() {
        // Le schéma d'origine n'est pas remplacé : « ftp: » devient l'hôte.
        let target = resolve("ftp://example.com/x").unwrap();
        assert!(matches!(target, NavigationTarget::Link(_)), "got {target:?}");
        assert_eq!(target.url().host_str(), Some("ftp"));
        assert_eq!(target.url().as_str(), "https://ftp//example.com/x");
    }

    #[test]
    fn test_has_http_scheme() {
        assert!(has_http_scheme("http://a"));
        assert!(has_http_scheme("Https://a"));
        assert!(!has_http_scheme("httpbin.org"));
        assert!(!has_http_scheme("ftp://a"));
        assert!(!has_http_scheme("é"));
    }
}

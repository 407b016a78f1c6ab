//! # OMWeb — chrome de navigation
//!
//! Barre d'adresse et contrôleur de navigation au-dessus d'une webview, avec
//! un shell de démonstration construit sur Servo.
//!
//! ## Architecture des modules
//!
//! Cœur (sans dépendance au moteur) :
//!
//! - [`controller`] : traduit les commandes (refresh, back, go_to…) en
//!   opérations moteur et publie un [`state::NavigationState`] à chaque
//!   notification du moteur.
//! - [`intent`] : résout une saisie libre en lien ou en recherche.
//! - [`address_bar`] : état de la barre d'adresse (focus, édition, boutons).
//! - [`observable`] : `CurrentValue`, valeur courante + abonnés.
//! - [`state`] / [`engine`] : types de données et le trait [`engine::WebEngine`].
//!
//! Shell Servo :
//!
//! - [`browser`] : boucle d'événements Winit, pattern "Two-Phase App".
//! - [`servo_glue`] : `Waker`, `ServoEngine` et `WebViewDelegate`.
//! - [`rendering`], [`resources`], [`preferences`] : mise en place de Servo.
//! - [`config`] : configuration TOML.

pub mod address_bar;
pub mod browser;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod intent;
pub mod observable;
pub mod preferences;
pub mod rendering;
pub mod resources;
pub mod servo_glue;
pub mod state;

//! Point d'entrée d'OMWeb.
//!
//! Usage :
//!   omweb [URL | recherche] [--write-config]
//!
//! Exemples :
//!   cargo run                              → charge `general.default_url`
//!   cargo run -- https://servo.org         → charge servo.org
//!   cargo run -- wikipedia.org             → ajoute https:// automatiquement
//!   cargo run -- "rust borrow checker"     → recherche
//!   cargo run -- --write-config            → écrit config.toml et quitte

use std::env;
use std::error::Error;

use omweb::config::Config;
use omweb::intent::{NavigationTarget, resolve_input};
use url::Url;
use winit::event_loop::EventLoop;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    // ── 1. Provider crypto TLS ─────────────────────────────────────────
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "Échec de l'installation du provider crypto rustls")?;

    // ── 2. Logging / Tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ── 3. Configuration ───────────────────────────────────────────────
    let config = Config::load();
    if args.iter().any(|a| a == "--write-config") {
        let path = config.save()?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    #[cfg(debug_assertions)]
    tracing::warn!(
        "Running in DEBUG mode — pages will load very slowly. Use `cargo run --release` for normal speed."
    );

    // ── 4. Lecteur de ressources Servo ─────────────────────────────────
    omweb::resources::init()?;

    // ── 5. URL de départ ───────────────────────────────────────────────
    let url = start_url(&args, &config).ok_or("No valid start URL (check general.default_url)")?;

    // ── 6. Boucle d'événements Winit ───────────────────────────────────
    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = omweb::browser::App::new(&event_loop, config, url);

    Ok(event_loop.run_app(&mut app)?)
}

/// Premier argument hors flags, résolu comme dans la barre d'adresse.
/// Sans argument exploitable, on retombe sur `general.default_url`.
fn start_url(args: &[String], config: &Config) -> Option<Url> {
    let search = config.search.engine();
    if let Some(input) = args
        .iter()
        .find(|arg| !arg.starts_with("--") && !arg.trim().is_empty())
    {
        match resolve_input(input, &search) {
            Some(target) => return Some(target.into_url()),
            None => tracing::warn!(input = input.as_str(), "Cannot resolve start URL, using default"),
        }
    }

    let default = &config.general.default_url;
    Url::parse(default)
        .ok()
        .or_else(|| resolve_input(default, &search).map(NavigationTarget::into_url))
}

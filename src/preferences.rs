//! Servo engine preferences built from the `[servo]` config section.
//!
//! Thread pools are sized to the available CPU cores (clamped) unless the
//! config pins `layout_threads`.

use tracing::info;

use crate::config::ServoConfig;

/// Upper bound for auto-detected layout threads.
const MAX_AUTO_LAYOUT_THREADS: i64 = 8;

/// Builds Servo `Preferences` for the current machine.
#[allow(clippy::field_reassign_with_default)]
pub fn build_servo_preferences(config: &ServoConfig) -> servo::Preferences {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as i64)
        .unwrap_or(4);

    let mut prefs = servo::Preferences::default();

    // ── Thread pools ──────────────────────────────────────────────────────
    prefs.layout_threads = layout_threads(config.layout_threads, cpus);
    prefs.threadpools_async_runtime_workers_max = (cpus * 2).min(16);
    prefs.threadpools_image_cache_workers_max = cpus.min(8);
    prefs.threadpools_webrender_workers_max = (cpus / 2).clamp(2, 8);
    prefs.threadpools_resource_workers_max = cpus.min(8);

    // ── Cache & rendu ─────────────────────────────────────────────────────
    prefs.network_http_cache_size = config.cache_size;
    prefs.gfx_precache_shaders = config.precache_shaders;

    // Vide = on garde l'UA par défaut de Servo.
    if !config.user_agent.trim().is_empty() {
        prefs.user_agent = config.user_agent.clone();
    }

    info!(
        cpus,
        layout_threads = prefs.layout_threads,
        network_workers = prefs.threadpools_async_runtime_workers_max,
        cache_size = prefs.network_http_cache_size,
        "Servo preferences configured"
    );

    prefs
}

/// `0` (or any non-positive value) means auto-detect.
fn layout_threads(configured: i64, cpus: i64) -> i64 {
    if configured > 0 {
        configured
    } else {
        cpus.clamp(1, MAX_AUTO_LAYOUT_THREADS)
    }
}

//! Erreurs du shell (fenêtre, contexte GPU, boucle d'événements).
//!
//! Le cœur de navigation (contrôleur, barre d'adresse) ne renvoie jamais de
//! `Result` : seules les étapes de démarrage du shell peuvent échouer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("window handle unavailable: {0}")]
    Handle(#[from] winit::raw_window_handle::HandleError),

    #[error("Servo resources directory not found (set SERVO_RESOURCES_PATH)")]
    ResourcesNotFound,

    #[error("rendering context setup failed: {0}")]
    RenderingContext(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_context_message() {
        let err = ShellError::RenderingContext("no GL driver".into());
        assert_eq!(err.to_string(), "rendering context setup failed: no GL driver");
    }
}

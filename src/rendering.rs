//! Factory pour le contexte de rendu GPU.
//!
//! Isole la création du `WindowRenderingContext` (surfman/OpenGL) et du FBO
//! offscreen dans lequel Servo peint la page.

use std::rc::Rc;

use servo::{OffscreenRenderingContext, RenderingContext, WindowRenderingContext};
use winit::dpi::PhysicalSize;
use winit::raw_window_handle::{DisplayHandle, WindowHandle};

use crate::error::ShellError;

/// Crée un contexte de rendu hardware-acceleré lié à la fenêtre Winit.
///
/// Le contexte est rendu courant (`make_current`) avant d'être retourné,
/// ce qui est requis avant de le passer à `WebViewBuilder`.
pub fn create_rendering_context(
    display_handle: DisplayHandle<'_>,
    window_handle: WindowHandle<'_>,
    size: PhysicalSize<u32>,
) -> Result<Rc<WindowRenderingContext>, ShellError> {
    let rendering_context = WindowRenderingContext::new(display_handle, window_handle, size)
        .map_err(|e| ShellError::RenderingContext(format!("{e:?}")))?;

    rendering_context
        .make_current()
        .map_err(|e| ShellError::RenderingContext(format!("make_current: {e:?}")))?;

    Ok(Rc::new(rendering_context))
}

/// FBO de la taille de la fenêtre entière ; blitté à chaque redraw.
pub fn create_offscreen_context(
    window_context: &WindowRenderingContext,
    size: PhysicalSize<u32>,
) -> Rc<OffscreenRenderingContext> {
    Rc::new(window_context.offscreen_context(size))
}

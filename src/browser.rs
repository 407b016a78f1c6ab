//! Boucle d'événements Winit et cycle de vie du navigateur.
//!
//! ## Pattern "Two-Phase App"
//!
//! Winit 0.30 impose que les fenêtres soient créées dans `resumed()`, mais
//! Servo a besoin d'un handle de fenêtre pour son contexte de rendu :
//!
//! ```text
//! App::Initial { .. }  →  [resumed() appelé]  →  App::Running(Rc<AppState>)
//! ```
//!
//! ## Flux
//!
//! ```text
//! Threads Servo ── wake() ──▶ user_event() → servo.spin_event_loop()
//!                                  └─ WebViewDelegate → NavigationController::notify
//!                                       └─ NavigationState publié
//!                                            └─ AddressBar::sync → titre de fenêtre
//! Clavier ──▶ AddressBar / NavigationCommands ──▶ ServoEngine ──▶ WebView
//! ```
//!
//! La barre d'adresse est rendue dans le titre de la fenêtre ; la page occupe
//! toute la surface.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use euclid::Scale;
use servo::{InputEvent, WheelDelta, WheelEvent, WheelMode};
use servo::{MouseButton as ServoMouseButton, MouseButtonAction, MouseButtonEvent};
use servo::{MouseLeftViewportEvent, MouseMoveEvent};
use servo::{
    OffscreenRenderingContext, RenderingContext, Servo, ServoBuilder, WebViewBuilder,
    WindowRenderingContext,
};
use tracing::{error, info, warn};
use url::Url;
use webrender_api::units::DevicePoint;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use crate::address_bar::{AddressBar, AddressBarIntent, Control};
use crate::config::Config;
use crate::controller::{NavigationCommands, NavigationController};
use crate::error::ShellError;
use crate::preferences::build_servo_preferences;
use crate::rendering;
use crate::servo_glue::{ServoEngine, Waker, WakerEvent};
use crate::state::NavigationState;

/// Pixels par ligne pour les molettes en mode `LineDelta`.
const LINE_HEIGHT: f32 = 76.0;

// ─────────────────────────────────────────────────────────────────────────────
// AppState : état partagé entre Winit et Servo
// ─────────────────────────────────────────────────────────────────────────────

/// État partagé de l'application, créé lors de `resumed()`.
///
/// Encapsulé dans `Rc` : `WebViewDelegate` attend un `Rc<dyn WebViewDelegate>`
/// et tout vit sur le thread principal.
pub struct AppState {
    pub window: Window,
    pub servo: Servo,

    /// Contexte OpenGL de la fenêtre ; reçoit le blit du FBO.
    pub window_rendering_context: Rc<WindowRenderingContext>,

    /// FBO dans lequel Servo peint via `webview.paint()`.
    pub offscreen_context: Rc<OffscreenRenderingContext>,

    /// `None` tant que la WebView n'est pas construite (le delegate doit
    /// exister avant elle).
    pub controller: RefCell<Option<NavigationController<ServoEngine>>>,

    pub address_bar: RefCell<AddressBar>,

    /// Position courante du curseur en device pixels.
    pub cursor_position: Cell<DevicePoint>,

    pub modifiers: Cell<ModifiersState>,

    pub config: Config,
}

impl AppState {
    /// Exécute `f` sur le contrôleur s'il existe et n'est pas déjà emprunté.
    pub(crate) fn with_controller(&self, f: impl FnOnce(&mut NavigationController<ServoEngine>)) {
        match self.controller.try_borrow_mut() {
            Ok(mut slot) => {
                if let Some(controller) = slot.as_mut() {
                    f(controller);
                }
            }
            Err(_) => warn!("Navigation controller busy, call dropped"),
        }
    }

    fn navigation_state(&self) -> Option<NavigationState> {
        let slot = self.controller.try_borrow().ok()?;
        slot.as_ref().map(NavigationController::state)
    }

    /// Abonné du contrôleur : resynchronise la barre puis la redessine.
    fn on_navigation_state(&self, state: &NavigationState) {
        match self.address_bar.try_borrow_mut() {
            Ok(mut bar) => bar.sync(state),
            Err(_) => warn!("Address bar busy, state not synced"),
        }
        self.render_address_bar(state);
    }

    fn render_chrome(&self) {
        if let Some(state) = self.navigation_state() {
            self.render_address_bar(&state);
        }
    }

    fn render_address_bar(&self, state: &NavigationState) {
        let Ok(bar) = self.address_bar.try_borrow() else {
            return;
        };
        let line = bar.view(state).to_line();
        self.window
            .set_title(&format!("{} — {line}", self.config.general.window_title));
    }

    /// Les intentions que le contrôleur ne traite pas reviennent ici.
    fn dispatch(&self, intent: Option<AddressBarIntent>) {
        let Some(intent) = intent else {
            self.render_chrome();
            return;
        };
        let mut leftover = None;
        self.with_controller(|c| leftover = intent.dispatch(c));
        if let Some(AddressBarIntent::ShowMenu) = leftover {
            self.show_history_menu();
        }
        self.render_chrome();
    }

    /// Pas de menu graphique : l'historique part dans les logs.
    fn show_history_menu(&self) {
        let Some(state) = self.navigation_state() else {
            return;
        };
        for (i, item) in state.back_history().iter().enumerate() {
            info!(index = i, id = %item.id(), url = %item.url(), title = item.title(), "back");
        }
        if let Some(url) = state.current_url() {
            info!(url = %url, title = state.title(), "current");
        }
        for (i, item) in state.forward_history().iter().enumerate() {
            info!(index = i, id = %item.id(), url = %item.url(), title = item.title(), "forward");
        }
    }

    fn forward_input(&self, event: InputEvent) {
        let Ok(slot) = self.controller.try_borrow() else {
            return;
        };
        if let Some(controller) = slot.as_ref() {
            controller.engine().webview().notify_input_event(event);
        }
    }

    fn paint(&self) {
        if let Ok(slot) = self.controller.try_borrow()
            && let Some(controller) = slot.as_ref()
        {
            controller.engine().webview().paint();
        }

        self.window_rendering_context.prepare_for_rendering();
        if let Some(blit) = self.offscreen_context.render_to_parent_callback() {
            let size = self.window.inner_size();
            let gl = self.window_rendering_context.glow_gl_api();
            let target_rect = euclid::default::Rect::new(
                euclid::default::Point2D::new(0, 0),
                euclid::default::Size2D::new(size.width as i32, size.height as i32),
            );
            blit(&gl, target_rect);
        }
        self.window_rendering_context.present();
    }

    // ── Clavier ─────────────────────────────────────────────────────────

    fn handle_key(&self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let mods = self.modifiers.get();
        if self.handle_shortcut(&event.logical_key, mods) {
            return;
        }
        let focused = self
            .address_bar
            .try_borrow()
            .is_ok_and(|bar| bar.is_focused());
        if focused {
            self.handle_address_bar_key(&event.logical_key, mods);
        }
    }

    /// Raccourcis globaux (toujours actifs). Renvoie `true` si consommé.
    fn handle_shortcut(&self, key: &Key, mods: ModifiersState) -> bool {
        match key {
            Key::Character(c) if mods.control_key() && c.eq_ignore_ascii_case("l") => {
                self.address_bar.borrow_mut().focus();
                self.render_chrome();
            }
            Key::Character(c) if mods.control_key() && c.eq_ignore_ascii_case("r") => {
                self.with_controller(|nav| nav.refresh());
            }
            Key::Named(NamedKey::F5) => self.with_controller(|nav| nav.refresh()),
            Key::Named(NamedKey::ArrowLeft) if mods.alt_key() => {
                self.with_controller(|nav| nav.back());
            }
            Key::Named(NamedKey::ArrowRight) if mods.alt_key() => {
                self.with_controller(|nav| nav.forward());
            }
            Key::Character(c) if mods.alt_key() && c.eq_ignore_ascii_case("m") => {
                let intent = self.address_bar.borrow_mut().tap(Control::Menu);
                self.dispatch(intent);
            }
            Key::Named(NamedKey::Escape) => {
                let mut bar = self.address_bar.borrow_mut();
                if bar.is_focused() {
                    bar.unfocus();
                    drop(bar);
                    self.render_chrome();
                } else if bar.is_loading() {
                    let intent = bar.tap(Control::ReloadOrCancel);
                    drop(bar);
                    self.dispatch(intent);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_address_bar_key(&self, key: &Key, mods: ModifiersState) {
        let mut bar = self.address_bar.borrow_mut();
        let intent = match key {
            Key::Named(NamedKey::Enter) => bar.submit(),
            Key::Named(NamedKey::Backspace) => {
                bar.backspace();
                None
            }
            Key::Named(NamedKey::Delete) => {
                bar.delete();
                None
            }
            Key::Named(NamedKey::ArrowLeft) => {
                bar.move_cursor_left();
                None
            }
            Key::Named(NamedKey::ArrowRight) => {
                bar.move_cursor_right();
                None
            }
            Key::Named(NamedKey::Home) => {
                bar.home();
                None
            }
            Key::Named(NamedKey::End) => {
                bar.end();
                None
            }
            Key::Named(NamedKey::Space) => {
                bar.insert_char(' ');
                None
            }
            Key::Character(c) if mods.control_key() && c.eq_ignore_ascii_case("a") => {
                bar.select_all();
                None
            }
            Key::Character(c) if mods.control_key() && c.eq_ignore_ascii_case("k") => {
                bar.tap(Control::Clear)
            }
            Key::Character(c) if !mods.control_key() && !mods.alt_key() => {
                bar.insert_str(c);
                None
            }
            _ => None,
        };
        drop(bar);
        self.dispatch(intent);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App : enum deux phases
// ─────────────────────────────────────────────────────────────────────────────

pub enum App {
    /// Phase pré-initialisation : on attend que Winit appelle `resumed()`.
    Initial {
        waker: Waker,
        config: Config,
        initial_url: Url,
    },

    Running(Rc<AppState>),
}

impl App {
    pub fn new(event_loop: &EventLoop<WakerEvent>, config: Config, initial_url: Url) -> Self {
        Self::Initial {
            waker: Waker::new(event_loop),
            config,
            initial_url,
        }
    }
}

/// Construit la fenêtre, Servo, la WebView et le contrôleur.
fn start(
    event_loop: &ActiveEventLoop,
    waker: Waker,
    config: Config,
    initial_url: Url,
) -> Result<Rc<AppState>, ShellError> {
    // ── 1. Fenêtre ──────────────────────────────────────────────────────
    let display_handle = event_loop.display_handle()?;
    let window_attributes = Window::default_attributes()
        .with_title(config.general.window_title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ));
    let window = event_loop.create_window(window_attributes)?;
    let window_handle = window.window_handle()?;

    // ── 2. Contextes de rendu ───────────────────────────────────────────
    let inner_size = window.inner_size();
    let window_rendering_context =
        rendering::create_rendering_context(display_handle, window_handle, inner_size)?;
    let offscreen_context =
        rendering::create_offscreen_context(&window_rendering_context, inner_size);

    // ── 3. Servo ────────────────────────────────────────────────────────
    let servo = ServoBuilder::default()
        .preferences(build_servo_preferences(&config.servo))
        .event_loop_waker(Box::new(waker))
        .build();

    let search = config.search.engine();
    let app_state = Rc::new(AppState {
        window,
        servo,
        window_rendering_context,
        offscreen_context: offscreen_context.clone(),
        controller: RefCell::new(None),
        address_bar: RefCell::new(AddressBar::new()),
        cursor_position: Cell::new(DevicePoint::zero()),
        modifiers: Cell::new(ModifiersState::default()),
        config,
    });

    // ── 4. WebView + contrôleur ─────────────────────────────────────────
    info!(url = %initial_url, "Loading initial page");
    let scale_factor = app_state.window.scale_factor() as f32;
    let webview = WebViewBuilder::new(
        &app_state.servo,
        offscreen_context as Rc<dyn RenderingContext>,
    )
    .url(initial_url)
    .hidpi_scale_factor(Scale::new(scale_factor))
    .delegate(app_state.clone())
    .build();

    let controller = NavigationController::new(ServoEngine::new(webview), search);
    let weak = Rc::downgrade(&app_state);
    controller.subscribe(move |state| {
        if let Some(app) = weak.upgrade() {
            app.on_navigation_state(state);
        }
    });
    *app_state.controller.borrow_mut() = Some(controller);

    Ok(app_state)
}

fn servo_button(button: WinitMouseButton) -> ServoMouseButton {
    match button {
        WinitMouseButton::Left => ServoMouseButton::Left,
        WinitMouseButton::Right => ServoMouseButton::Right,
        WinitMouseButton::Middle => ServoMouseButton::Middle,
        WinitMouseButton::Back => ServoMouseButton::Back,
        WinitMouseButton::Forward => ServoMouseButton::Forward,
        WinitMouseButton::Other(id) => ServoMouseButton::Other(id),
    }
}

fn wheel_delta(delta: MouseScrollDelta) -> WheelDelta {
    let (x, y, mode) = match delta {
        MouseScrollDelta::LineDelta(dx, dy) => (
            f64::from(dx * LINE_HEIGHT),
            f64::from(dy * LINE_HEIGHT),
            WheelMode::DeltaLine,
        ),
        MouseScrollDelta::PixelDelta(delta) => (delta.x, delta.y, WheelMode::DeltaPixel),
    };
    WheelDelta { x, y, z: 0.0, mode }
}

// ─────────────────────────────────────────────────────────────────────────────
// ApplicationHandler : dispatch des événements Winit
// ─────────────────────────────────────────────────────────────────────────────

impl ApplicationHandler<WakerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let (waker, config, initial_url) = match self {
            Self::Initial {
                waker,
                config,
                initial_url,
            } => (waker.clone(), config.clone(), initial_url.clone()),
            Self::Running(_) => return,
        };

        match start(event_loop, waker, config, initial_url) {
            Ok(state) => *self = Self::Running(state),
            Err(e) => {
                error!(error = %e, "Browser startup failed");
                event_loop.exit();
            }
        }
    }

    /// Un `WakerEvent` arrive depuis les threads Servo.
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: WakerEvent) {
        if let Self::Running(state) = self {
            state.servo.spin_event_loop();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Self::Running(state) = self else {
            return;
        };
        // Toujours faire tourner la boucle Servo en premier.
        state.servo.spin_event_loop();

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::RedrawRequested => state.paint(),

            WindowEvent::Resized(new_size) => {
                state.window_rendering_context.resize(new_size);
                state.offscreen_context.resize(new_size);
                state.window.request_redraw();
            }

            WindowEvent::ModifiersChanged(new_modifiers) => {
                state.modifiers.set(new_modifiers.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let point = DevicePoint::new(position.x as f32, position.y as f32);
                state.cursor_position.set(point);
                state.forward_input(InputEvent::MouseMove(MouseMoveEvent::new(point.into())));
            }

            WindowEvent::CursorLeft { .. } => {
                state.forward_input(InputEvent::MouseLeftViewport(
                    MouseLeftViewportEvent::default(),
                ));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let pos = state.cursor_position.get();
                state.forward_input(InputEvent::Wheel(WheelEvent::new(
                    wheel_delta(delta),
                    pos.into(),
                )));
            }

            WindowEvent::MouseInput {
                state: btn_state,
                button,
                ..
            } => {
                // Clic dans la page → la barre perd le focus.
                if btn_state == ElementState::Pressed {
                    let unfocused = match state.address_bar.try_borrow_mut() {
                        Ok(mut bar) if bar.is_focused() => {
                            bar.unfocus();
                            true
                        }
                        _ => false,
                    };
                    if unfocused {
                        state.render_chrome();
                    }
                }

                let action = match btn_state {
                    ElementState::Pressed => MouseButtonAction::Down,
                    ElementState::Released => MouseButtonAction::Up,
                };
                let pos = state.cursor_position.get();
                state.forward_input(InputEvent::MouseButton(MouseButtonEvent::new(
                    action,
                    servo_button(button),
                    pos.into(),
                )));
            }

            WindowEvent::KeyboardInput { event, .. } => state.handle_key(&event),

            _ => (),
        }
    }
}

//! Platform layer: window, event loop and keyboard
//!
//! Everything runs on the event-loop thread in a fixed order per redraw:
//! sample keys → tick → rebuild sprites → upload/draw → present.

pub mod input;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::game::Game;
use crate::renderer::{AtlasImage, ShaderSources, SpriteRenderer};
use crate::settings::Settings;

pub use input::{KeyAction, KeyboardState};

const WINDOW_TITLE: &str = "Ballpit";

/// Window-dependent state, created on `resumed`
struct Running {
    window: Arc<Window>,
    renderer: SpriteRenderer,
}

struct App {
    settings: Settings,
    shaders: ShaderSources,
    atlas: AtlasImage,
    game: Game,
    keyboard: KeyboardState,
    running: Option<Running>,
    /// Set when the loop stopped because of an unrecoverable error
    fatal: Option<anyhow::Error>,
}

impl App {
    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let renderer = SpriteRenderer::new_blocking(
            window.clone(),
            (self.settings.width, self.settings.height),
            &self.shaders,
            &self.atlas,
        )
        .context("Failed to initialise renderer")?;

        let (tex_w, tex_h) = renderer.texture_size();
        self.game.set_texture_size(tex_w, tex_h);

        window.request_redraw();
        self.running = Some(Running { window, renderer });
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };

        let sprites = self.game.frame(&self.keyboard.tick_input());
        match running.renderer.render(sprites) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                running.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory"));
                return;
            }
            Err(e) => log::warn!("Frame skipped: {e}"),
        }

        running.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        if let Err(e) = self.init_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let action = self.keyboard.handle_key(event.physical_key, event.state);
                if action == Some(KeyAction::Quit) && event.state.is_pressed() {
                    log::info!("Escape pressed, exiting");
                    event_loop.exit();
                }
            }
            WindowEvent::Focused(false) => self.keyboard.release_all(),
            WindowEvent::Resized(size) => {
                if let Some(running) = &mut self.running {
                    running.renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Load assets, open the window and run until it closes
pub fn run(settings: Settings) -> Result<()> {
    let shaders = ShaderSources::load(&settings.vertex_shader_path(), &settings.fragment_shader_path())
        .context("Failed to load shaders")?;
    let atlas = AtlasImage::load(&settings.atlas_path()).context("Failed to load sprite atlas")?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let game = Game::new(&settings);
    let mut app = App {
        settings,
        shaders,
        atlas,
        game,
        keyboard: KeyboardState::new(),
        running: None,
        fatal: None,
    };

    event_loop.run_app(&mut app).context("Event loop failed")?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

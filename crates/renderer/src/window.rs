use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::backend::GraphicsContext;
use crate::frame::{initial_view_state, render_selected, view_at};
use crate::gpu::{VertexBuffer, WgpuContext, WgpuProgram};
use crate::link::ProgramSet;
use crate::types::RendererConfig;
use crate::view::{ViewCommand, ViewState};

/// Entry point that opens the window, builds the programs and drives the loop.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and runs until it is closed.
    ///
    /// Every program is compiled and linked before the first event is
    /// handled; a pipeline failure is returned without entering the loop.
    pub fn run(&mut self) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to initialize event loop")?;
        let (width, height) = self.config.surface_size;
        let window = WindowBuilder::new()
            .with_title(self.config.title.as_str())
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .context("failed to create window")?;
        let window = Arc::new(window);

        let mut session = Some(Session::new(window, &self.config)?);
        tracing::info!(
            width,
            height,
            title = %self.config.title,
            "renderer ready; D/Right advances, A/Left goes back"
        );

        event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Wait);

                if let Event::LoopExiting = event {
                    if let Some(session) = session.take() {
                        session.teardown();
                    }
                    return;
                }
                let Some(state) = session.as_mut() else {
                    return;
                };

                match event {
                    Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                        match event {
                            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                                elwt.exit();
                            }
                            WindowEvent::KeyboardInput { event, .. } => {
                                state.handle_key(&event);
                            }
                            WindowEvent::Resized(new_size) => {
                                state.ctx.resize(new_size);
                            }
                            WindowEvent::RedrawRequested => match state.render_frame() {
                                Ok(()) => {}
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                    let size = state.ctx.size();
                                    state.ctx.resize(size);
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    tracing::error!("surface out of memory; exiting");
                                    elwt.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    tracing::warn!("surface timeout; retrying next frame");
                                }
                                Err(other) => {
                                    tracing::warn!(error = ?other, "surface error; retrying next frame");
                                }
                            },
                            _ => {}
                        }
                    }
                    Event::AboutToWait => {
                        state.window.request_redraw();
                    }
                    _ => {}
                }
            })
            .map_err(|err| anyhow!("event loop error: {err}"))
    }
}

/// Everything that lives for the duration of the loop.
struct Session {
    window: Arc<Window>,
    ctx: WgpuContext,
    programs: ProgramSet<WgpuProgram>,
    vertices: VertexBuffer,
    views: ViewState,
}

impl Session {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let mut ctx = WgpuContext::new(window.clone())?;
        let programs = ProgramSet::build(&mut ctx, &config.sources)?;
        let vertices = ctx.create_vertex_buffer();
        Ok(Self {
            window,
            ctx,
            programs,
            vertices,
            views: initial_view_state(),
        })
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if let Some(command) = command_for_key(&event.logical_key, event.state, event.repeat) {
            self.views.apply(command);
            self.window.request_redraw();
        }
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.begin_frame()?;
        let viewport = self.ctx.viewport();
        render_selected(&mut self.ctx, &self.views, &self.programs, &self.vertices, viewport);
        self.ctx.end_frame();
        Ok(())
    }

    /// Releases programs, then the vertex buffer, then the device and surface.
    fn teardown(self) {
        let Session {
            window: _window,
            mut ctx,
            programs,
            vertices,
            views,
        } = self;
        tracing::debug!(view = view_at(views.current()).label, "shutting down");
        programs.destroy(&mut ctx);
        ctx.delete_buffer(vertices);
        drop(ctx);
    }
}

/// Maps a key event to a view transition. Only fresh presses count.
pub fn command_for_key(key: &Key, state: ElementState, repeat: bool) -> Option<ViewCommand> {
    if state != ElementState::Pressed || repeat {
        return None;
    }
    match key {
        Key::Named(NamedKey::ArrowRight) => Some(ViewCommand::Advance),
        Key::Named(NamedKey::ArrowLeft) => Some(ViewCommand::Retreat),
        Key::Character(value) if value.eq_ignore_ascii_case("d") => Some(ViewCommand::Advance),
        Key::Character(value) if value.eq_ignore_ascii_case("a") => Some(ViewCommand::Retreat),
        _ => None,
    }
}

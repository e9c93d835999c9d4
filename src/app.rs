use std::sync::Arc;
use std::time::Instant;

use canvas_automata::config::{
    DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH, MAX_SPEED, MIN_SPEED,
};
use canvas_automata::{
    create_simulation, Engine, Pixmap, Scheduler, Simulation, SimulationError, Tick, SIMULATIONS,
};
use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::gpu::{BlitPipeline, FrameTexture, GpuContext, GpuError};

/// How often the window title picks up fresh stats
const TITLE_REFRESH_MS: f64 = 250.0;

/// Run Life, the termite sorter or Langton's ant in a window
#[derive(Parser, Clone, Debug)]
#[command(name = "canvas-automata", version)]
pub struct Options {
    /// Simulation to start with: life, termites or ant
    #[arg(long = "sim", value_name = "NAME", default_value = "life")]
    pub simulation: String,
    /// Generations per second
    #[arg(
        long,
        value_name = "STEPS",
        value_parser = clap::value_parser!(u32).range((MIN_SPEED as i64)..=(MAX_SPEED as i64))
    )]
    pub speed: Option<u32>,
    /// Seed for a reproducible run
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
    /// Background colour as #rgb or #rrggbb
    #[arg(long, value_name = "COLOUR")]
    pub background: Option<String>,
}

fn build_simulation(
    id: &str,
    options: &Options,
    width: u32,
    height: u32,
) -> Result<Box<dyn Simulation>, SimulationError> {
    let mut engine = match options.seed {
        Some(seed) => Engine::with_seed(width, height, seed),
        None => Engine::new(width, height),
    };
    if let Some(colour) = &options.background {
        engine.set_background(colour);
    }
    let mut sim = create_simulation(id, engine)?;
    if let Some(speed) = options.speed {
        sim.set_speed(speed);
    }
    Ok(sim)
}

/// GPU side of the window: uploads the simulation's pixmap and blits it
struct Presenter {
    gpu: GpuContext,
    blit: BlitPipeline,
    frame: FrameTexture,
    bind_group: wgpu::BindGroup,
}

impl Presenter {
    fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new(window))?;
        let blit = BlitPipeline::new(&gpu.device, gpu.format());
        let frame = FrameTexture::new(&gpu.device, size.width, size.height);
        let bind_group = blit.bind(&gpu.device, frame.view());
        Ok(Self {
            gpu,
            blit,
            frame,
            bind_group,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    fn present(&mut self, pixmap: &Pixmap) {
        if pixmap.is_detached() {
            return;
        }
        if !self.frame.matches(pixmap) {
            self.frame = FrameTexture::new(&self.gpu.device, pixmap.width(), pixmap.height());
            self.bind_group = self.blit.bind(&self.gpu.device, self.frame.view());
        }
        self.frame.upload(&self.gpu.queue, pixmap);

        let output = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        self.blit.draw(&mut encoder, &view, &self.bind_group);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Application state
pub struct App {
    options: Options,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    sim: Box<dyn Simulation>,
    scheduler: Scheduler,
    clock: Instant,
    cursor: (f64, f64),
    last_title_ms: f64,
}

impl App {
    /// Fails only for an unknown simulation name
    pub fn new(options: Options) -> Result<Self, SimulationError> {
        let sim = build_simulation(
            &options.simulation,
            &options,
            DEFAULT_SURFACE_WIDTH,
            DEFAULT_SURFACE_HEIGHT,
        )?;
        Ok(Self {
            options,
            window: None,
            presenter: None,
            sim,
            scheduler: Scheduler::new(),
            clock: Instant::now(),
            cursor: (0.0, 0.0),
            last_title_ms: f64::NEG_INFINITY,
        })
    }

    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    fn redraw(&mut self) {
        let now = self.now_ms();
        if self.scheduler.tick(self.sim.as_mut(), now) == Tick::Skipped {
            return;
        }
        if let Some(presenter) = &mut self.presenter {
            presenter.present(self.sim.engine().surface());
        }
        if now - self.last_title_ms >= TITLE_REFRESH_MS {
            self.refresh_title();
            self.last_title_ms = now;
        }
    }

    fn refresh_title(&self) {
        if let Some(window) = &self.window {
            let stats = self.sim.get_stats();
            let state = if self.sim.is_running() { "" } else { " [paused]" };
            window.set_title(&format!(
                "canvas-automata - {} - gen {} - {} cells - {} FPS{}",
                self.sim.name(),
                stats.generation,
                stats.cell_count,
                stats.fps,
                state
            ));
        }
    }

    /// Replace the current simulation, carrying over speed, brightness,
    /// direction indicator and run state
    fn switch_simulation(&mut self, id: &str) {
        if self.sim.name() == id {
            return;
        }
        let engine = self.sim.engine();
        let (width, height) = (engine.surface().width(), engine.surface().height());
        let settings = engine.settings().clone();
        let running = self.sim.is_running();

        match build_simulation(id, &self.options, width, height) {
            Ok(mut sim) => {
                sim.set_speed(settings.speed());
                sim.set_brightness(settings.brightness());
                sim.set_show_direction_indicator(settings.show_direction_indicator);
                sim.init();
                if running {
                    sim.start();
                }
                log::info!("Switched to {}", sim.name());
                self.sim = sim;
            }
            Err(error) => log::error!("Cannot switch simulation: {}", error),
        }
    }

    fn change_agent_count(&mut self, delta: isize) {
        let count = self.sim.agent_count().saturating_add_signed(delta);
        match self.sim.set_agent_count(count) {
            Ok(()) => log::info!("Agents: {}", self.sim.agent_count()),
            Err(error) => log::warn!("{}", error),
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Space => {
                if self.sim.is_running() {
                    self.sim.pause();
                } else {
                    self.sim.start();
                }
            }
            KeyCode::KeyR => self.sim.reset(),
            KeyCode::KeyC => self.sim.clear(),

            KeyCode::Digit1 => self.switch_simulation(SIMULATIONS[0]),
            KeyCode::Digit2 => self.switch_simulation(SIMULATIONS[1]),
            KeyCode::Digit3 => self.switch_simulation(SIMULATIONS[2]),

            KeyCode::Equal | KeyCode::NumpadAdd => {
                let speed = self.sim.engine().settings().speed();
                let speed = self.sim.set_speed(speed + 1);
                log::info!("Speed: {} steps/s", speed);
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                let speed = self.sim.engine().settings().speed();
                let speed = self.sim.set_speed(speed.saturating_sub(1));
                log::info!("Speed: {} steps/s", speed);
            }

            KeyCode::BracketLeft => {
                let brightness = self.sim.engine().settings().brightness();
                let brightness = self.sim.set_brightness(brightness - 0.1);
                log::info!("Brightness: {:.1}", brightness);
            }
            KeyCode::BracketRight => {
                let brightness = self.sim.engine().settings().brightness();
                let brightness = self.sim.set_brightness(brightness + 0.1);
                log::info!("Brightness: {:.1}", brightness);
            }

            KeyCode::KeyD => {
                let show = !self.sim.engine().settings().show_direction_indicator;
                self.sim.set_show_direction_indicator(show);
                log::info!("Direction indicator: {}", if show { "ON" } else { "OFF" });
            }

            KeyCode::KeyA => {
                let animate = !self.sim.engine().settings().animate_colours;
                self.sim.engine_mut().set_animate_colours(animate);
                log::info!("Colour animation: {}", if animate { "ON" } else { "OFF" });
            }

            KeyCode::ArrowUp => self.change_agent_count(1),
            KeyCode::ArrowDown => self.change_agent_count(-1),

            _ => return,
        }
        self.refresh_title();
    }

    fn handle_mouse(&mut self, state: ElementState, button: MouseButton) {
        let (x, y) = self.cursor;
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => self.sim.handle_mouse_down(x, y),
            (MouseButton::Left, ElementState::Released) => self.sim.handle_mouse_up(),
            (MouseButton::Right, ElementState::Pressed) => {
                if let Err(error) = self.sim.add_actor_at(x, y) {
                    log::warn!("{}", error);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("Initializing {}...", self.sim.name());

        let window_attrs = Window::default_attributes()
            .with_title("canvas-automata - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(
                DEFAULT_SURFACE_WIDTH,
                DEFAULT_SURFACE_HEIGHT,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                log::error!("Failed to create window: {}", error);
                event_loop.exit();
                return;
            }
        };

        let presenter = match Presenter::new(window.clone()) {
            Ok(presenter) => presenter,
            Err(error) => {
                log::error!("{}", error);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.sim.engine_mut().surface_mut().set_size(size.width, size.height);
        self.sim.init();
        self.sim.start();

        log::info!("Controls:");
        log::info!("  Space: Start/pause");
        log::info!("  R: Reset, C: Clear");
        log::info!("  1/2/3: Life, termites, ant");
        log::info!("  +/-: Speed");
        log::info!("  [/]: Brightness");
        log::info!("  D: Toggle direction indicator");
        log::info!("  A: Toggle colour animation");
        log::info!("  Up/Down: Agent count");
        log::info!("  Left drag: Toggle cells, right click: Add agent");
        log::info!("  Escape: Quit");

        window.request_redraw();
        self.window = Some(window);
        self.presenter = Some(presenter);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                self.scheduler.stop();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && !event.repeat {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            self.scheduler.stop();
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                if self.sim.engine().is_stroking() {
                    self.sim.handle_mouse_move(position.x, position.y);
                }
            }
            WindowEvent::CursorLeft { .. } => self.sim.handle_mouse_up(),
            WindowEvent::MouseInput { state, button, .. } => self.handle_mouse(state, button),
            WindowEvent::Resized(new_size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(new_size);
                }
                if new_size.width > 0 && new_size.height > 0 {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    self.sim
                        .engine_mut()
                        .surface_mut()
                        .set_size(new_size.width, new_size.height);
                    self.sim.resize_preserve_state();
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

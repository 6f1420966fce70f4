use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};
use weber_core::{Player, ResponseKey};
use weber_experiment::{DotsPairGenerator, ExperimentConfig, JsonLinesSink, TrialStateMachine};
use weber_timing::{HighPrecisionTimer, Timer};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::view::WindowView;

type Machine = TrialStateMachine<
    DotsPairGenerator<StdRng>,
    WindowView,
    JsonLinesSink<BufWriter<File>>,
    HighPrecisionTimer,
    StdRng,
>;

/// Frames sampled before the display timing is reported.
const CALIBRATION_FRAMES: usize = 120;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    machine: Machine,
    paint_timer: HighPrecisionTimer,
    frame_timer: HighPrecisionTimer,
    last_frame: Option<Instant>,
    calibration_logged: bool,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    should_exit: bool,
}

impl App {
    pub fn new(
        config: ExperimentConfig,
        player: Player,
        sink: JsonLinesSink<BufWriter<File>>,
    ) -> Result<Self> {
        let generator = DotsPairGenerator::new(&config, config.rng(0))?;
        let view = WindowView::new(&config.canvas)?;
        let rng = config.rng(1);
        let machine = TrialStateMachine::new(
            config,
            generator,
            view,
            sink,
            HighPrecisionTimer::new(),
            rng,
            player,
        )?;

        Ok(Self {
            window: None,
            pixels: None,
            machine,
            paint_timer: HighPrecisionTimer::new(),
            frame_timer: HighPrecisionTimer::new(),
            last_frame: None,
            calibration_logged: false,
            current_size: None,
            scale_factor: 1.0,
            refresh_rate: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "press enter to start or escape to exit"
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Weber")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor = self.scale_factor,
            refresh_rate = ?self.refresh_rate,
            "display configuration"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.machine
            .view_mut()
            .renderer_mut()
            .resize(physical_size.width, physical_size.height)?;

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(window)) = (self.pixels.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };

        if let Some(title) = self.machine.view_mut().take_title() {
            window.set_title(&title);
        }

        let stats = self
            .machine
            .view_mut()
            .renderer_mut()
            .render_frame(pixels.frame_mut(), &mut self.paint_timer)?;
        pixels.render()?;

        if stats.dirty_count > 0 {
            debug!(
                clear_ms = stats.clear.as_secs_f64() * 1e3,
                paint_ms = stats.paint.as_secs_f64() * 1e3,
                copy_ms = stats.copy.as_secs_f64() * 1e3,
                total_ms = stats.total.as_secs_f64() * 1e3,
                dirty = stats.dirty_count,
                "frame"
            );
        }

        let now = Instant::now();
        if let Some(last) = self.last_frame.replace(now) {
            self.frame_timer.record_frame(now - last);
        }
        if !self.calibration_logged && self.frame_timer.frame_count() >= CALIBRATION_FRAMES {
            self.calibration_logged = true;
            let cal = self.frame_timer.calibration_stats();
            let paint = self.machine.view_mut().renderer_mut().paint_stats();
            info!(
                fps = cal.effective_fps,
                avg_ms = cal.average_frame_time_ns / 1e6,
                jitter_ms = cal.jitter_ns / 1e6,
                paint_avg_ms = paint.average_frame_time_ns / 1e6,
                paint_max_ms = paint.max_frame_time_ns / 1e6,
                "display timing"
            );
        }

        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let fired = self.machine.update()?;
        if fired > 0 {
            debug!(fired, phase = ?self.machine.phase(), "timers fired");
        }
        Ok(())
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyF => {
                self.machine.on_response_key(ResponseKey::First);
            }
            KeyCode::KeyJ => {
                self.machine.on_response_key(ResponseKey::Second);
            }
            KeyCode::Space => {
                if let Err(e) = self.machine.on_continue_key() {
                    error!("continue failed: {e}");
                    self.cleanup_and_exit(event_loop);
                }
            }
            KeyCode::Enter | KeyCode::NumpadEnter => {
                if !self.machine.start_session() {
                    self.machine.on_start_assessment_clicked();
                }
            }
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("failed to resize buffer: {e}");
            }
        }
        if let Err(e) = self
            .machine
            .view_mut()
            .renderer_mut()
            .resize(new_size.width, new_size.height)
        {
            warn!("failed to resize renderer: {e}");
        }
        debug!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        let player = self.machine.player();
        if self.machine.state().is_finished() {
            info!(
                rounds = player.num_rounds(),
                correct = player.num_correct(),
                "session closed"
            );
        } else {
            warn!(
                state = ?self.machine.state(),
                phase = ?self.machine.phase(),
                rounds = player.num_rounds(),
                "session abandoned before the finish screen"
            );
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.update().and_then(|()| self.render()) {
                    error!("frame failed: {e:#}");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

use anyhow::{Context, Result, anyhow};
use fitts_core::Point;
use fitts_experiment::{ExperimentEvent, ExperimentStateMachine};
use fitts_render::{FontArc, SkiaRenderer, icon_rgba};
use fitts_store::{RecordSink, export_workbook, open_in_viewer};
use fitts_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Icon, Window, WindowId},
};

use crate::config::AppConfig;

const ICON_SIZE: u32 = 64;

type Session = ExperimentStateMachine<Box<dyn RecordSink>, HighPrecisionTimer, ThreadRng>;

pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    experiment: Session,
    renderer: Option<SkiaRenderer>,
    font: Option<FontArc>,
    icon: Icon,
    cursor: Point,
    exported: bool,
    /// First fatal error seen inside the event loop
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(
        config: AppConfig,
        sink: Box<dyn RecordSink>,
        font: FontArc,
    ) -> Result<Self> {
        let timer = HighPrecisionTimer::new();
        let mut experiment =
            ExperimentStateMachine::new(config.experiment.clone(), sink, timer, rand::rng())?;
        if let Some(receipt) = &config.storage.consent_receipt {
            experiment = experiment.with_consent_receipt(receipt);
        }
        let icon = Icon::from_rgba(icon_rgba(ICON_SIZE)?, ICON_SIZE, ICON_SIZE)?;

        Ok(Self {
            config,
            window: None,
            pixels: None,
            experiment,
            renderer: None,
            font: Some(font),
            icon,
            cursor: Point::new(0.0, 0.0),
            exported: false,
            failure: None,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            participant = %self.experiment.participant_id(),
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "starting experiment, press Escape to quit"
        );

        event_loop.run_app(&mut self)?;

        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        if self.experiment.is_aborted() {
            info!(
                attempts = self.experiment.records().len(),
                "session quit before completion"
            );
        } else if let Some(summary) = self.experiment.summary() {
            info!(
                participant = %summary.participant_id,
                accuracy = summary.accuracy_percentage,
                "experiment completed"
            );
        }
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        let mut attributes = Window::default_attributes()
            .with_title("Fitts' Law Experiment")
            .with_resizable(false)
            .with_window_icon(Some(self.icon.clone()));
        if self.config.display.fullscreen {
            let monitor = monitor.ok_or_else(|| anyhow!("no monitor available"))?;
            if let Some(rate) = monitor.refresh_rate_millihertz() {
                info!(refresh_hz = rate as f64 / 1000.0, "display");
            }
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        } else {
            attributes = attributes.with_inner_size(PhysicalSize::new(
                self.config.display.width,
                self.config.display.height,
            ));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            "window created"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.renderer = Some(SkiaRenderer::new(size.width, size.height, self.font.take())?);
        self.experiment
            .set_screen_size(size.width as f64, size.height as f64)
            .context("display too small for the configured targets")?;

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pix), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let view = self.experiment.view();
        let timer = &self.experiment.timer;
        let frame_start = timer.now();
        let stats = renderer.render_frame(&view, pix.frame_mut(), timer)?;
        let now = timer.now();
        pix.render()?;
        trace!(
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            present_ms = timer.elapsed(now).as_secs_f64() * 1e3,
            shapes = stats.shapes,
            "frame"
        );

        let budget = Duration::from_secs_f64(1.0 / self.config.display.max_fps as f64);
        let spent = timer.elapsed(frame_start);
        if spent < budget {
            timer.sleep(budget - spent);
        }
        Ok(())
    }

    /// Feeds one event to the session; persistence errors end the run
    fn dispatch(&mut self, event: ExperimentEvent, event_loop: &ActiveEventLoop) {
        match self.experiment.handle_event(event.clone()) {
            Ok(handled) => {
                if handled {
                    debug!(?event, phase = ?self.experiment.phase, "event handled");
                }
            }
            Err(e) => {
                error!(error = %e, "session aborted");
                self.fail(anyhow::Error::new(e), event_loop);
                return;
            }
        }

        if self.experiment.summary().is_some() && !self.exported {
            self.exported = true;
            self.export();
        }
        if self.experiment.is_finished() {
            event_loop.exit();
        }
    }

    fn export(&self) {
        if !self.config.export.enabled {
            return;
        }
        let summaries: Vec<_> = self.experiment.summary().into_iter().cloned().collect();
        match export_workbook(
            &self.config.export.dir,
            self.experiment.records(),
            &summaries,
        ) {
            Ok(book) => {
                info!(dir = %book.dir.display(), "export written");
                if self.config.export.open_after {
                    if let Err(e) = open_in_viewer(&book.trial_sheet) {
                        warn!(error = %e, "could not open export");
                    }
                }
            }
            Err(e) => error!(error = %e, "export failed"),
        }
    }

    fn update(&mut self, event_loop: &ActiveEventLoop) {
        for event in self.experiment.update() {
            self.dispatch(event, event_loop);
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) -> Result<()> {
        if new_size.width == 0 || new_size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(new_size.width, new_size.height)?;
            pixels.resize_buffer(new_size.width, new_size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height)?;
        }
        self.experiment
            .set_screen_size(new_size.width as f64, new_size.height as f64)
            .context("display too small for the configured targets")?;
        debug!(width = new_size.width, height = new_size.height, "display resized");
        Ok(())
    }

    fn fail(&mut self, err: anyhow::Error, event_loop: &ActiveEventLoop) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                self.fail(e, event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.dispatch(ExperimentEvent::Quit, event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!(error = %e, "render failed");
                    self.fail(e, event_loop);
                    return;
                }
                self.update(event_loop);
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.dispatch(ExperimentEvent::PointerPressed(self.cursor), event_loop),
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.dispatch(ExperimentEvent::Quit, event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.handle_resize(size) {
                    error!(error = %e, "resize failed");
                    self.fail(e, event_loop);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    if let Err(e) = self.handle_resize(size) {
                        self.fail(e, event_loop);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.experiment.is_finished() || self.failure.is_some() {
            event_loop.exit();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        debug!("application resources released");
    }
}

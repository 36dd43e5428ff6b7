mod gpu;
mod slides;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::events::{PreparedImageCpu, SlideId, SurfaceCommand, ViewerEvent};
use crate::playlist::ShuffledCycle;
use crate::signal::CompletionHub;
use crate::tasks::loader::PhotoDecoder;
use crate::tasks::scheduler::{self, DisplaySurface};

use gpu::{GpuState, RenderOutcome, SlidePlane};
use slides::SlideAnimation;

const CURSOR_HIDE_DELAY: Duration = Duration::from_secs(1);
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy)]
pub struct ViewerOptions {
    pub start_fullscreen: bool,
    pub shuffle_seed: Option<u64>,
}

/// Production [`DisplaySurface`]: forwards slide mutations to the winit loop
/// as user events. Send failures mean the window is gone, which ends the
/// scheduler.
struct ViewerSurface {
    proxy: EventLoopProxy<ViewerEvent>,
}

impl ViewerSurface {
    fn send(&self, command: SurfaceCommand) -> Result<()> {
        self.proxy
            .send_event(ViewerEvent::Surface(command))
            .map_err(|_| anyhow!("display surface closed"))
    }
}

impl DisplaySurface for ViewerSurface {
    fn attach(&mut self, slide: SlideId, image: PreparedImageCpu) -> Result<()> {
        self.send(SurfaceCommand::Attach { slide, image })
    }

    fn begin_exit(&mut self, slide: SlideId) -> Result<()> {
        self.send(SurfaceCommand::BeginExit(slide))
    }

    fn detach(&mut self, slide: SlideId) -> Result<()> {
        self.send(SurfaceCommand::Detach(slide))
    }
}

/// Mouse idle tracking for the auto-hiding cursor. A report only counts as
/// movement when the position actually changed.
struct CursorIdle {
    last_move: Instant,
    last_position: Option<(f64, f64)>,
    hidden: bool,
}

impl CursorIdle {
    fn new(now: Instant) -> Self {
        Self {
            last_move: now,
            last_position: None,
            hidden: false,
        }
    }

    /// Returns true when the cursor was hidden and should be shown again.
    fn moved(&mut self, position: (f64, f64), now: Instant) -> bool {
        if self.last_position == Some(position) {
            return false;
        }
        self.last_position = Some(position);
        self.last_move = now;
        let was_hidden = self.hidden;
        self.hidden = false;
        was_hidden
    }

    /// Returns true exactly once when the idle delay elapses.
    fn should_hide(&mut self, now: Instant) -> bool {
        if !self.hidden && now.duration_since(self.last_move) >= CURSOR_HIDE_DELAY {
            self.hidden = true;
            return true;
        }
        false
    }
}

struct ActiveSlide {
    anim: SlideAnimation,
    plane: SlidePlane,
}

struct ViewerApp {
    hub: Arc<CompletionHub>,
    options: ViewerOptions,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    slides: Vec<ActiveSlide>,
    pending: VecDeque<SurfaceCommand>,
    cursor: CursorIdle,
    last_click: Option<Instant>,
}

impl ViewerApp {
    fn new(hub: Arc<CompletionHub>, options: ViewerOptions) -> Self {
        Self {
            hub,
            options,
            window: None,
            gpu: None,
            slides: Vec::new(),
            pending: VecDeque::new(),
            cursor: CursorIdle::new(Instant::now()),
            last_click: None,
        }
    }

    fn apply_command(&mut self, command: SurfaceCommand, now: Instant) {
        match command {
            SurfaceCommand::Attach { slide, image } => {
                let Some(gpu) = self.gpu.as_ref() else {
                    // GPU not up yet; replay after init.
                    self.pending.push_back(SurfaceCommand::Attach { slide, image });
                    return;
                };
                debug!(%slide, path = %image.path.display(), "attaching slide");
                let plane = gpu.create_plane(&image);
                self.slides.push(ActiveSlide {
                    anim: SlideAnimation::new(slide, now),
                    plane,
                });
            }
            SurfaceCommand::BeginExit(slide) => {
                match self.slides.iter_mut().find(|s| s.anim.id() == slide) {
                    Some(active) => active.anim.begin_exit(now),
                    None => warn!(%slide, "begin-exit for unknown slide"),
                }
            }
            SurfaceCommand::Detach(slide) => {
                let before = self.slides.len();
                self.slides.retain(|s| s.anim.id() != slide);
                if self.slides.len() == before {
                    warn!(%slide, "detach for unknown slide");
                }
            }
        }
        self.request_redraw();
    }

    fn drain_pending(&mut self, now: Instant) {
        while let Some(command) = self.pending.pop_front() {
            self.apply_command(command, now);
        }
    }

    /// Advance every slide's envelope and forward completion pulses.
    fn pump_completions(&mut self, now: Instant) {
        for active in &mut self.slides {
            if let Some(completion) = active.anim.tick(now) {
                debug!(slide = %active.anim.id(), ?completion, "animation complete");
                self.hub.notify(active.anim.id());
            }
        }
    }

    fn toggle_fullscreen(&self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.fullscreen().is_some() {
            window.set_fullscreen(None);
        } else {
            window.set_fullscreen(Some(Fullscreen::Borderless(window.current_monitor())));
        }
    }

    fn register_click(&mut self, now: Instant) {
        match self.last_click {
            Some(previous) if now.duration_since(previous) <= DOUBLE_CLICK_WINDOW => {
                self.last_click = None;
                self.toggle_fullscreen();
            }
            _ => self.last_click = Some(now),
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.pump_completions(now);

        let Some(gpu) = self.gpu.as_mut() else { return };
        let frame: Vec<(&SlidePlane, f32)> = self
            .slides
            .iter()
            .map(|s| (&s.plane, s.anim.alpha(now)))
            .collect();
        match gpu.render(&frame) {
            RenderOutcome::Presented | RenderOutcome::Skipped => {}
            RenderOutcome::NeedsReconfigure => {
                info!("render surface lost; reconfiguring");
                gpu.reconfigure();
            }
            RenderOutcome::Fatal => {
                error!("render surface out of memory; exiting");
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let attrs = WindowAttributes::default().with_title("fadeframe");
            let window = match event_loop.create_window(attrs) {
                Ok(window) => Arc::new(window),
                Err(err) => {
                    error!(error = %err, "failed to create window");
                    event_loop.exit();
                    return;
                }
            };
            if self.options.start_fullscreen {
                window.set_fullscreen(Some(Fullscreen::Borderless(window.current_monitor())));
            }
            self.window = Some(window);
        }

        if self.gpu.is_none() {
            let Some(window) = self.window.clone() else {
                return;
            };
            match GpuState::new(window) {
                Ok(gpu) => {
                    self.gpu = Some(gpu);
                    self.drain_pending(Instant::now());
                }
                Err(err) => {
                    error!(error = ?err, "failed to initialize GPU state");
                    event_loop.exit();
                    return;
                }
            }
        }

        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
                self.request_redraw();
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Released && !event.repeat {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::KeyF) => self.toggle_fullscreen(),
                        PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) => {
                            event_loop.exit();
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.register_click(Instant::now());
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.cursor.moved((position.x, position.y), Instant::now()) {
                    window.set_cursor_visible(true);
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Surface(command) => {
                self.apply_command(command, Instant::now());
            }
            ViewerEvent::Shutdown => {
                info!("shutdown requested");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.pump_completions(now);

        if self.cursor.should_hide(now) {
            if let Some(window) = self.window.as_ref() {
                window.set_cursor_visible(false);
            }
        }

        if self.slides.iter().any(|s| s.anim.is_animating()) {
            // Animations in flight: redraw at presentation pace.
            self.request_redraw();
        } else {
            // Idle (startup, or stalled mid-cycle): wake periodically for the
            // cursor timer and late surface commands.
            event_loop.set_control_flow(ControlFlow::WaitUntil(now + Duration::from_millis(100)));
        }
    }
}

/// Build the window and event loop, spawn the scheduler against it, and run
/// the slideshow until the window closes or Ctrl-C arrives.
pub fn run_windowed(images: Vec<PathBuf>, options: ViewerOptions) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build event loop")?;
    let proxy = event_loop.create_proxy();
    let hub = Arc::new(CompletionHub::new());
    let cancel = CancellationToken::new();

    let signal_task = {
        let proxy = proxy.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        info!("ctrl-c received; shutting down");
                        let _ = proxy.send_event(ViewerEvent::Shutdown);
                    }
                    Err(err) => warn!("ctrl-c handler failed: {err}"),
                },
            }
        })
    };

    let mut rng = match options.shuffle_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let cycle = ShuffledCycle::new(images, &mut rng)?;

    let scheduler_task = {
        let proxy = proxy.clone();
        let surface = ViewerSurface { proxy: proxy.clone() };
        let hub = hub.clone();
        tokio::spawn(async move {
            if let Err(err) = scheduler::run(surface, PhotoDecoder::new(), hub, cycle).await {
                error!("scheduler failed: {err:?}");
                let _ = proxy.send_event(ViewerEvent::Shutdown);
            }
        })
    };

    let mut app = ViewerApp::new(hub, options);
    let result = event_loop.run_app(&mut app);

    cancel.cancel();
    scheduler_task.abort();
    signal_task.abort();
    result.context("event loop failed")
}

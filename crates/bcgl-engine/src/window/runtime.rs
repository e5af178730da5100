use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::platform::WinitTranslator;
use crate::input::{EventQueue, EventSender, InputState};
use crate::logging::init_logging;
use crate::render::{Gfx, RenderContext, WgpuBackend, WgpuBackendInit};
use crate::time::FrameClock;

use super::config::Config;

/// Runtime context passed to the application.
///
/// Requests are applied after the current callback returns.
pub struct RuntimeCtx {
    exit_code: Option<i32>,
    events: EventSender,
}

impl RuntimeCtx {
    fn new(events: EventSender) -> Self {
        Self {
            exit_code: None,
            events,
        }
    }

    /// Ends the main loop; `Runtime::run` returns `code`.
    pub fn quit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Producer handle for the event queue. Events sent now are delivered
    /// next frame.
    pub fn events(&self) -> &EventSender {
        &self.events
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` to completion and returns its exit code.
    ///
    /// Errors cover event loop, window and GPU creation failures and fatal
    /// surface errors.
    pub fn run<A>(mut app: A) -> Result<i32>
    where
        A: App + 'static,
    {
        let mut config = Config::default();
        app.on_config(&mut config);
        init_logging(&config.logging);
        log::info!(
            "starting \"{}\" ({}x{}, {:?})",
            config.title,
            config.width,
            config.height,
            config.mode
        );

        app.on_create();

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);
        let ran = event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error");

        state.shutdown();
        state.app.on_destroy();

        ran?;
        if let Some(err) = state.error.take() {
            return Err(err);
        }
        log::info!("exit code {}", state.exit_code);
        Ok(state.exit_code)
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,
    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Everything that lives between `on_start` and `on_stop`.
///
/// Field order is drop order: the render context goes before the window.
struct Session {
    gfx: Gfx,
    entry: WindowEntry,
    input: InputState,
    clock: FrameClock,
    queue: EventQueue,
    sender: EventSender,
    translator: WinitTranslator,
}

impl Session {
    fn create(event_loop: &ActiveEventLoop, config: &Config) -> Result<Self> {
        let window = event_loop
            .create_window(config.window_attributes())
            .context("failed to create window")?;

        let gpu_init = config.gpu_init();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let gfx = entry.with_gpu(|gpu| {
            let size = gpu.size();
            let backend = WgpuBackend::new(
                gpu.device().clone(),
                gpu.queue().clone(),
                WgpuBackendInit {
                    color_format: gpu.surface_format(),
                    sample_count: gpu.sample_count(),
                    width: size.width,
                    height: size.height,
                },
            );
            RenderContext::new(backend, size.width, size.height)
        })?;

        let size = entry.with_gpu(|gpu| gpu.size());
        let (sender, queue) = EventQueue::new();

        Ok(Self {
            gfx,
            entry,
            input: InputState::new(size.width as i32, size.height as i32),
            clock: FrameClock::new(),
            queue,
            sender,
            translator: WinitTranslator::new(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.entry.with_gpu_mut(|gpu| gpu.resize(size));
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.gfx.backend_mut().resize(size.width, size.height);
        self.gfx.set_viewport(size.width, size.height);
    }

    /// Drives one frame. Returns the exit code once the app asks to stop.
    fn frame<A: App>(&mut self, app: &mut A) -> Result<Option<i32>> {
        let time = self.clock.tick();
        let mut runtime = RuntimeCtx::new(self.sender.clone());
        let mut control = AppControl::Continue;

        let Session {
            gfx,
            entry,
            input,
            queue,
            ..
        } = self;

        for ev in queue.pull() {
            input.apply_event(ev);
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    window: entry.borrow_window(),
                },
                gfx: &mut *gfx,
                input: &*input,
                time,
                runtime: &mut runtime,
            };
            if app.on_event(&mut ctx, *ev) == AppControl::Exit {
                control = AppControl::Exit;
                break;
            }
        }

        if control == AppControl::Continue && runtime.exit_code.is_none() {
            match entry.borrow_gpu().begin_frame() {
                Ok(frame) => {
                    gfx.backend_mut().begin_frame(frame.view.clone());
                    let background = gfx.background();
                    gfx.clear(background);

                    {
                        let mut ctx = FrameCtx {
                            window: WindowCtx {
                                window: entry.borrow_window(),
                            },
                            gfx: &mut *gfx,
                            input: &*input,
                            time,
                            runtime: &mut runtime,
                        };
                        control = app.on_update(&mut ctx, time.dt);
                    }

                    gfx.backend_mut().end_frame();
                    entry.borrow_window().pre_present_notify();
                    entry.borrow_gpu().present(frame);
                }
                Err(err) => {
                    log::debug!("surface unavailable: {err}");
                    let action = entry.with_gpu_mut(|gpu| gpu.handle_surface_error(err));
                    if action == SurfaceErrorAction::Fatal {
                        anyhow::bail!("fatal surface error");
                    }
                }
            }
        }

        gfx.collect_garbage();
        input.reset_frame();

        Ok(match (runtime.exit_code, control) {
            (Some(code), _) => Some(code),
            (None, AppControl::Exit) => Some(0),
            (None, AppControl::Continue) => None,
        })
    }
}

struct AppState<A>
where
    A: App + 'static,
{
    config: Config,
    app: A,
    session: Option<Session>,
    exit_requested: bool,
    exit_code: i32,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: Config, app: A) -> Self {
        Self {
            config,
            app,
            session: None,
            exit_requested: false,
            exit_code: 0,
            error: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop, code: i32) {
        if !self.exit_requested {
            self.exit_requested = true;
            self.exit_code = code;
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.request_exit(event_loop, 1);
    }

    /// Runs `on_stop` and releases the render context and window.
    fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            self.app.on_stop(&mut session.gfx);
            session.gfx.collect_garbage();
            drop(session);
            log::debug!("render context and window released");
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.exit_requested {
            return;
        }

        match Session::create(event_loop, &self.config) {
            Ok(mut session) => {
                self.app.on_start(&mut session.gfx);
                session.clock.reset();
                session.entry.with_window(|w| w.request_redraw());
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(session) = &self.session {
            session.entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };

        let sender = &session.sender;
        session.translator.translate(&event, |ev| {
            sender.send(ev);
        });

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop, 0),

            WindowEvent::Resized(size) => {
                session.resize(size);
                session.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = session.entry.with_window(|w| w.inner_size());
                session.resize(size);
            }

            WindowEvent::Occluded(false) => session.clock.reset(),

            WindowEvent::RedrawRequested => match session.frame(&mut self.app) {
                Ok(Some(code)) => self.request_exit(event_loop, code),
                Ok(None) => {}
                Err(err) => self.fail(event_loop, err),
            },

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

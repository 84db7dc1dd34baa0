//! Event-loop driver: creates the window, waits for assets, then runs frames.

use std::sync::Arc;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::assets::{AssetManager, AssetSource, PendingLoad};
use crate::bootstrap::{Bootstrap, DebugHandle, MODEL_ASSET};
use crate::config::{DebugFlag, RenderConfig};
use crate::geometry::Primitive;
use crate::render_app::RenderApp;

/// What to run besides the render configuration.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub debug: DebugFlag,
    /// Geometry shown as the rotating mesh.
    pub model: AssetSource,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            debug: DebugFlag::default(),
            model: AssetSource::Primitive(Primitive::DEFAULT_KNOT),
        }
    }
}

enum AppState {
    /// Waiting for the event loop to resume so a window can be created.
    Pending,
    /// Window hidden, assets loading on a worker thread.
    Loading { app: RenderApp, load: PendingLoad },
    Running { app: RenderApp, handle: DebugHandle },
    Exiting,
}

struct GlintApp {
    config: RenderConfig,
    options: RunOptions,
    bootstrap: Bootstrap,
    state: AppState,
    error: Option<anyhow::Error>,
}

impl GlintApp {
    fn new(config: RenderConfig, options: RunOptions) -> Self {
        Self {
            bootstrap: Bootstrap::new(options.debug),
            config,
            options,
            state: AppState::Pending,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!(error = %format!("{error:#}"), "shutting down");
        self.error = Some(error);
        self.state = AppState::Exiting;
        event_loop.exit();
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let config = &self.config;
        let attributes = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .with_transparent(config.alpha)
            .with_visible(false);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let mut app = RenderApp::new(window, config.clone())?;
        self.bootstrap.begin(&mut app)?;

        let load = AssetManager::new()
            .queue(MODEL_ASSET, self.options.model.clone())
            .load();
        Ok(AppState::Loading { app, load })
    }
}

impl ApplicationHandler for GlintApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Pending) {
            return;
        }
        match self.create(event_loop) {
            Ok(state) => self.state = state,
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            tracing::info!("window closed");
            event_loop.exit();
            return;
        }

        let app = match &mut self.state {
            AppState::Loading { app, .. } | AppState::Running { app, .. } => app,
            AppState::Pending | AppState::Exiting => return,
        };
        app.handle_event(&event);

        if let WindowEvent::RedrawRequested = event
            && let Err(err) = app.frame()
        {
            self.fail(event_loop, err.into());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Loading { load, .. } = &mut self.state else {
            return;
        };
        let Some(result) = load.poll() else {
            return;
        };

        let AppState::Loading { mut app, .. } =
            std::mem::replace(&mut self.state, AppState::Exiting)
        else {
            return;
        };

        match self.bootstrap.complete(&mut app, result) {
            Ok(handle) => {
                if let Some(param) = &handle.angular_velocity {
                    tracing::debug!(value = param.get(), "angular velocity bound to panel");
                }
                self.state = AppState::Running { app, handle };
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Err(err) => self.fail(event_loop, err.into()),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let AppState::Running { handle, .. } = &self.state {
            tracing::debug!(
                attached = ?handle.attached,
                angular_velocity = handle.angular_velocity.as_ref().map(|p| p.get()),
                "exiting"
            );
        }
    }
}

/// Open the window, load the model and run the demo until the window closes.
///
/// A failed asset load ends the run with that error; there is no retry.
pub fn run(config: RenderConfig, options: RunOptions) -> anyhow::Result<()> {
    config.validate().context("invalid render configuration")?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    // Poll while loading so the pending load is checked every iteration
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GlintApp::new(config, options);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

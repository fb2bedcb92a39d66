mod cli;
mod config;
mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use gallery_client::{GalleryClient, IdentityStore};
use gallery_core::{default_frame_slots, GalleryData, UrlFetcher};
use gallery_viewport::GalleryView;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use cli::{Args, Command};
use config::ViewerConfig;
use input::{InputAction, InputState};

/// Where gallery data comes from for this session.
enum GallerySource {
    File(PathBuf),
    Api(GalleryClient),
    Empty,
}

impl GallerySource {
    fn from_config(config: &ViewerConfig) -> Self {
        match (&config.gallery_file, &config.api_base_url) {
            (Some(path), _) => GallerySource::File(path.clone()),
            (None, Some(api)) => GallerySource::Api(GalleryClient::new(api.clone())),
            (None, None) => GallerySource::Empty,
        }
    }

    /// Never fails: unreadable sources give an empty gallery.
    fn load(&self) -> GalleryData {
        match self {
            GallerySource::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => GalleryData::from_json(&text).unwrap_or_else(|e| {
                    log::warn!("Invalid gallery file {}: {}", path.display(), e);
                    GalleryData::default()
                }),
                Err(e) => {
                    log::warn!("Could not read gallery file {}: {}", path.display(), e);
                    GalleryData::default()
                }
            },
            GallerySource::Api(client) => client.fetch_gallery(),
            GallerySource::Empty => {
                log::info!("No gallery source configured; showing empty frames");
                GalleryData::new(Vec::new(), default_frame_slots())
            }
        }
    }

    fn fetcher(&self, config: &ViewerConfig) -> UrlFetcher {
        let mut fetcher = UrlFetcher::new();
        if let Some(api) = &config.api_base_url {
            fetcher = fetcher.with_base_url(api.clone());
        }
        if let GallerySource::File(path) = self {
            if let Some(dir) = path.parent() {
                fetcher = fetcher.with_base_dir(dir);
            }
        }
        fetcher
    }
}

/// Application state
struct App {
    config: ViewerConfig,
    source: GallerySource,
    window: Option<Arc<Window>>,
    view: Option<GalleryView>,
    input: InputState,
    last_frame_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let source = GallerySource::from_config(&config);
        Self {
            config,
            source,
            window: None,
            view: None,
            input: InputState::new(),
            last_frame_time: Instant::now(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Virtual Gallery")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let fetcher = Arc::new(self.source.fetcher(&self.config));
        let mut view = pollster::block_on(GalleryView::new(
            window.clone(),
            self.config.renderer_config(),
            fetcher,
        ))?;
        view.controls.auto_rotate = self.config.auto_rotate;
        view.mount(&self.source.load());

        self.window = Some(window);
        self.view = Some(view);
        self.last_frame_time = Instant::now();

        log::info!("Window and gallery view initialized");
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        let (Some(view), Some(window)) = (&mut self.view, &self.window) else {
            return;
        };
        view.update(delta_time);

        if let Err(e) = view.render(window) {
            // Check if it's a surface error we can handle
            if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                match surface_err {
                    wgpu::SurfaceError::Lost => {
                        // Surface lost, reconfigure
                        let size = view.renderer.size;
                        view.resize(size);
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        log::error!("Out of memory!");
                        event_loop.exit();
                    }
                    _ => {
                        log::error!("Surface error: {:?}", surface_err);
                    }
                }
            } else {
                log::error!("Render error: {:?}", e);
            }
        }

        // Request next frame
        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("Failed to start viewer: {:#}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let (Some(view), Some(window)) = (&mut self.view, &self.window) {
            if view.handle_window_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                if let Some(view) = &mut self.view {
                    view.unmount();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(view) = &mut self.view {
                    view.resize((physical_size.width, physical_size.height));
                    log::debug!("Resized to {}x{}", physical_size.width, physical_size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => {
                let Some(view) = &mut self.view else {
                    return;
                };
                if self.input.handle(&other, view) == InputAction::Refresh {
                    view.rebuild(&self.source.load());
                }
            }
        }
    }
}

fn require_api(flag: Option<String>, config: &ViewerConfig) -> Result<GalleryClient> {
    let api = flag
        .or_else(|| config.api_base_url.clone())
        .context("no backend URL: pass --api or set api_base_url in the config")?;
    Ok(GalleryClient::new(api))
}

fn run_viewer(mut config: ViewerConfig, api: Option<String>, gallery: Option<PathBuf>) -> Result<()> {
    config.override_sources(api, gallery);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_join(config: &ViewerConfig, identity: &IdentityStore, api: Option<String>) -> Result<()> {
    if let Some(user_id) = identity.load()? {
        println!("Already joined as {}", user_id);
        return Ok(());
    }
    let client = require_api(api, config)?;
    let user_id = client.join()?;
    identity.save(&user_id)?;
    println!("Joined the gallery as {}", user_id);
    Ok(())
}

fn run_upload(
    config: &ViewerConfig,
    identity: &IdentityStore,
    api: Option<String>,
    frame: &str,
    path: &Path,
) -> Result<()> {
    let client = require_api(api, config)?;
    let user_id = identity
        .load()?
        .context("no user id saved: run `gallery_viewer join` first")?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let gallery = client.try_fetch_gallery()?;
    let receipt = client.upload_image(&gallery, &user_id, frame, &filename, &bytes)?;
    println!("Uploaded {} to {}: {}", filename, receipt.frame_id, receipt.url);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = ViewerConfig::load(args.config.as_deref())?;
    let identity = IdentityStore::new(config.identity_path(args.config.as_deref()));

    match args.command_or_default() {
        Command::View { api, gallery } => {
            log::info!("Starting Virtual Gallery viewer");
            run_viewer(config, api, gallery)
        }
        Command::Join { api } => run_join(&config, &identity, api),
        Command::Upload { api, frame, path } => {
            run_upload(&config, &identity, api, &frame, &path)
        }
        Command::Whoami => {
            match identity.load()? {
                Some(user_id) => println!("{}", user_id),
                None => println!("Not joined yet"),
            }
            Ok(())
        }
    }
}

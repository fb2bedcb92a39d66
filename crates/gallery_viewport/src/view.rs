//! One window's worth of gallery: renderer, GPU scene, camera, controls and
//! overlay, owned together and handed explicitly to every handler.

use std::sync::Arc;

use anyhow::Result;
use gallery_core::{GalleryData, GalleryScene, ImageFetcher, ReleaseStats};
use gallery_math::{Camera, OrbitControls};
use winit::window::Window;

use crate::overlay::{Overlay, OverlayStatus};
use crate::{GpuScene, Renderer, RendererConfig};

pub struct GalleryView {
    pub renderer: Renderer,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub overlay: Overlay,
    gpu_scene: GpuScene,
    gallery: Option<GalleryScene>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl GalleryView {
    /// Bootstrap the renderer for `window`. Nothing is mounted yet.
    pub async fn new(
        window: Arc<Window>,
        settings: RendererConfig,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self> {
        let renderer = Renderer::new(window, settings).await?;
        let gpu_scene = GpuScene::new(&renderer);
        let camera = Camera::gallery_entry(renderer.size.0 as f32 / renderer.size.1 as f32);
        let controls = OrbitControls::new(&camera);

        Ok(Self {
            renderer,
            camera,
            controls,
            overlay: Overlay::new(),
            gpu_scene,
            gallery: None,
            fetcher,
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.gallery.is_some()
    }

    pub fn gallery(&self) -> Option<&GalleryScene> {
        self.gallery.as_ref()
    }

    /// Build the room, placeholders and texture loads for `data`. Any
    /// previous gallery is torn down first.
    pub fn mount(&mut self, data: &GalleryData) {
        if self.gallery.is_some() {
            self.unmount();
        }

        let gallery = GalleryScene::mount(data, self.fetcher.clone());
        let report = self.gpu_scene.sync(&mut self.renderer, gallery.scene());
        log::info!(
            "Mounted gallery view: {} groups, {} nodes uploaded",
            report.groups,
            report.nodes
        );
        self.gallery = Some(gallery);
    }

    /// Release the scene graph and every GPU resource built for it.
    /// Calling this with nothing mounted does nothing.
    pub fn unmount(&mut self) -> ReleaseStats {
        let Some(mut gallery) = self.gallery.take() else {
            return ReleaseStats::default();
        };
        let scene_stats = gallery.unmount();
        let gpu_stats = self.gpu_scene.dispose();
        log::info!(
            "Unmounted gallery view: released {} meshes, {} textures on the GPU",
            gpu_stats.geometries,
            gpu_stats.textures
        );
        scene_stats
    }

    /// Full teardown and rebuild with new data.
    pub fn rebuild(&mut self, data: &GalleryData) {
        log::info!(
            "Rebuilding gallery with {} images and {} frame positions",
            data.images.len(),
            data.frame_positions.len()
        );
        self.unmount();
        self.mount(data);
    }

    /// Keep the renderer output and camera aspect in step with the window.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 == 0 || new_size.1 == 0 {
            return;
        }
        self.renderer.resize(new_size);
        self.camera.set_viewport_size(new_size.0, new_size.1);
    }

    pub fn handle_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.renderer.handle_egui_event(window, event)
    }

    /// Per-frame update: apply finished texture loads, upload new groups,
    /// advance the controls.
    pub fn update(&mut self, delta_time: f32) {
        if let Some(gallery) = self.gallery.as_mut() {
            if gallery.poll() > 0 {
                self.gpu_scene.sync(&mut self.renderer, gallery.scene());
            }
        }
        self.controls.update(&mut self.camera, delta_time);
        self.overlay.update(delta_time);
    }

    fn status(&self) -> OverlayStatus {
        let counts = self
            .gallery
            .as_ref()
            .map(|gallery| gallery.counts())
            .unwrap_or_default();
        OverlayStatus {
            auto_rotate: self.controls.auto_rotate,
            loads_done: counts.loads_done(),
            loads_total: counts.loads_total(),
            paintings: counts.paintings,
            placeholders: counts.placeholders,
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<()> {
        let status = self.status();
        let overlay = &mut self.overlay;
        let controls = &mut self.controls;

        self.renderer
            .render(window, &self.gpu_scene, &self.camera, |ctx| {
                if overlay.show(ctx, &status).toggle_auto_rotate {
                    let on = controls.toggle_auto_rotate();
                    log::info!("Auto-rotate {}", if on { "on" } else { "off" });
                }
            })
    }
}

impl Drop for GalleryView {
    fn drop(&mut self) {
        self.unmount();
    }
}

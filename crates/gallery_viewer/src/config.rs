//! Viewer configuration, read from an optional JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gallery_math::Vec3;
use gallery_viewport::RendererConfig;
use serde::Deserialize;

const IDENTITY_FILE_NAME: &str = "gallery_identity.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub api_base_url: Option<String>,
    pub gallery_file: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub exposure: f32,
    pub shadows: bool,
    pub shadow_map_size: u32,
    pub auto_rotate: bool,
    /// Defaults to `gallery_identity.json` next to the config file
    pub identity_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            gallery_file: None,
            window_width: 1280,
            window_height: 720,
            exposure: 1.2,
            shadows: true,
            shadow_map_size: 1024,
            auto_rotate: true,
            identity_file: None,
        }
    }
}

impl ViewerConfig {
    /// Load `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Where the user id lives: explicit setting, else beside the config
    /// file, else the working directory.
    pub fn identity_path(&self, config_path: Option<&Path>) -> PathBuf {
        if let Some(path) = &self.identity_file {
            return path.clone();
        }
        config_path
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""))
            .join(IDENTITY_FILE_NAME)
    }

    /// Command-line flags win over file values.
    pub fn override_sources(&mut self, api: Option<String>, gallery: Option<PathBuf>) {
        if api.is_some() {
            self.api_base_url = api;
        }
        if gallery.is_some() {
            self.gallery_file = gallery;
        }
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            exposure: self.exposure,
            shadows: self.shadows,
            shadow_map_size: self.shadow_map_size,
            clear_color: Vec3::ONE,
        }
    }
}

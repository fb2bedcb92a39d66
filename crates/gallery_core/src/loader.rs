//! Background artwork loading.
//!
//! Each request runs as its own task on the rayon pool: fetch the bytes,
//! decode them, and send a [`LoadOutcome`] back over a channel. The render
//! loop drains the channel with [`TextureLoader::poll`] and applies the
//! outcomes to the scene itself, so no task ever touches scene state.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crate::texture::{TextureError, TextureImage, TextureResult};

/// Upper bound on a single download.
const MAX_DOWNLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// Source of encoded image bytes.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> TextureResult<Vec<u8>>;
}

/// Fetches `http(s)://` URLs with ureq and everything else from disk.
///
/// Root-relative URLs (`/uploads/a.png`) are joined onto `base_url` when
/// one is set; other relative paths are resolved against `base_dir`.
pub struct UrlFetcher {
    agent: ureq::Agent,
    base_url: Option<String>,
    base_dir: Option<PathBuf>,
}

impl Default for UrlFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .build(),
            base_url: None,
            base_dir: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    fn fetch_http(&self, url: &str) -> TextureResult<Vec<u8>> {
        let response = self.agent.get(url).call().map_err(|e| TextureError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut data = Vec::new();
        response
            .into_reader()
            .take(MAX_DOWNLOAD_BYTES)
            .read_to_end(&mut data)?;
        Ok(data)
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl ImageFetcher for UrlFetcher {
    fn fetch(&self, url: &str) -> TextureResult<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url);
        }
        if let (Some(base), true) = (&self.base_url, url.starts_with('/')) {
            return self.fetch_http(&format!("{base}{url}"));
        }

        let path = self.resolve_path(url.strip_prefix("file://").unwrap_or(url));
        std::fs::read(&path).map_err(|e| TextureError::Fetch {
            url: url.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// Fetch and decode in one step.
pub fn load_texture(fetcher: &dyn ImageFetcher, url: &str) -> TextureResult<TextureImage> {
    let bytes = fetcher.fetch(url)?;
    TextureImage::decode(&bytes, url)
}

/// Per-image load state; `Textured` and `Errored` are terminal.
#[derive(Clone, Debug)]
pub enum LoadState {
    Pending,
    Textured(Arc<TextureImage>),
    Errored(String),
}

impl LoadState {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }
}

/// Result of one background load.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Caller-chosen request index
    pub index: usize,
    /// Loader generation the request was issued in
    pub generation: u64,
    pub result: TextureResult<TextureImage>,
}

/// Fires loads onto the rayon pool and collects their outcomes.
pub struct TextureLoader {
    fetcher: Arc<dyn ImageFetcher>,
    sender: Sender<LoadOutcome>,
    receiver: Receiver<LoadOutcome>,
    generation: u64,
    in_flight: usize,
}

impl TextureLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            fetcher,
            sender,
            receiver,
            generation: 0,
            in_flight: 0,
        }
    }

    /// Start loading `url`; the outcome comes back tagged with `index`.
    pub fn request(&mut self, index: usize, url: &str) {
        let fetcher = self.fetcher.clone();
        let sender = self.sender.clone();
        let generation = self.generation;
        let url = url.to_string();

        log::debug!("Loading image {} (request {})", url, index);
        self.in_flight += 1;

        rayon::spawn(move || {
            let result = load_texture(fetcher.as_ref(), &url);
            // Receiver gone means the loader was dropped; nothing to report to
            let _ = sender.send(LoadOutcome {
                index,
                generation,
                result,
            });
        });
    }

    /// Forget all outstanding requests. Their outcomes are discarded when
    /// they arrive; the tasks themselves run to completion.
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.in_flight = 0;
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn accept(&mut self, outcome: LoadOutcome) -> Option<LoadOutcome> {
        if outcome.generation != self.generation {
            log::debug!("Discarding stale load outcome {}", outcome.index);
            return None;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Drain every outcome that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.receiver.try_recv() {
            if let Some(outcome) = self.accept(outcome) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Block until the next current outcome arrives or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        loop {
            match self.receiver.recv_timeout(timeout) {
                Ok(outcome) => {
                    if let Some(outcome) = self.accept(outcome) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

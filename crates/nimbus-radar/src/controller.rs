//! Radar animation controller.
//!
//! Owns the frame sequence for the active location: keeps one tile layer per
//! frame attached to the map, exactly one of them visible, and advances the
//! visible frame on a timer. Manual stepping restarts the timer so the next
//! automatic advance happens a full interval later.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::map::{tile_url, LayerId, TileMap};
use crate::meta::{RadarFrame, RadarMetadata};

/// Shown while no frame sequence is loaded.
const LABEL_IDLE: &str = "–";
/// Shown when the metadata feed returned no frames.
const LABEL_NO_DATA: &str = "Keine Radardaten";
/// Shown when the metadata fetch failed.
const LABEL_UNAVAILABLE: &str = "Radar nicht verfügbar";

/// Tuning knobs for the radar animation.
#[derive(Debug, Clone)]
pub struct RadarOptions {
    /// Base URL of the tile server.
    pub tile_base_url: String,
    /// Zoom level used when centering on a location.
    pub zoom: u8,
    /// Opacity of the currently visible frame layer.
    pub visible_opacity: f32,
    /// Delay between automatic frame advances.
    pub animation_interval: Duration,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self {
            tile_base_url: "https://tilecache.rainviewer.com".to_string(),
            zoom: 6,
            visible_opacity: 0.85,
            animation_interval: Duration::from_secs(3),
        }
    }
}

struct Inner<M> {
    map: M,
    options: RadarOptions,
    frames: Vec<RadarFrame>,
    layers: Vec<LayerId>,
    cursor: usize,
    label: String,
    loaded_for: Option<String>,
    timer: Option<CancellationToken>,
}

impl<M: TileMap> Inner<M> {
    /// Make the cursor frame visible and every other frame transparent, and
    /// refresh the timestamp label.
    fn render(&mut self) {
        for (index, layer) in self.layers.iter().enumerate() {
            let opacity = if index == self.cursor {
                self.options.visible_opacity
            } else {
                0.0
            };
            self.map.set_opacity(*layer, opacity);
        }

        self.label = match self.frames.get(self.cursor) {
            Some(frame) => format_frame_time(frame.time),
            None => LABEL_IDLE.to_string(),
        };
    }

    /// Detach all frame layers and forget the loaded sequence.
    fn clear_frames(&mut self) {
        for layer in self.layers.drain(..) {
            self.map.remove_layer(layer);
        }
        self.frames.clear();
        self.cursor = 0;
        self.loaded_for = None;
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }
}

/// Format a frame capture time for the label, e.g. "04.05. 14:30".
fn format_frame_time(epoch_secs: i64) -> String {
    match chrono::DateTime::from_timestamp(epoch_secs, 0) {
        Some(time) => time.format("%d.%m. %H:%M").to_string(),
        None => LABEL_IDLE.to_string(),
    }
}

/// Handle to the radar animation state. Clones share the same state; the
/// timer task holds one.
pub struct RadarController<M> {
    inner: Arc<Mutex<Inner<M>>>,
}

impl<M> Clone for RadarController<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: TileMap + Send + 'static> RadarController<M> {
    pub fn new(map: M, options: RadarOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                map,
                options,
                frames: Vec::new(),
                layers: Vec::new(),
                cursor: 0,
                label: LABEL_IDLE.to_string(),
                loaded_for: None,
                timer: None,
            })),
        }
    }

    /// Center on a location and, if a sequence for a different location is
    /// loaded, drop it so stale frames never show over the new position.
    pub fn prepare_for(&self, location_id: &str, latitude: f64, longitude: f64) {
        let mut inner = self.inner.lock();
        let zoom = inner.options.zoom;
        inner.map.set_view(latitude, longitude, zoom);

        if inner.loaded_for.as_deref() != Some(location_id) {
            inner.cancel_timer();
            inner.clear_frames();
            inner.label = LABEL_IDLE.to_string();
        }
    }

    /// Replace the frame sequence with freshly fetched metadata.
    ///
    /// The cursor lands on the newest frame and the animation timer restarts.
    #[tracing::instrument(skip(self, metadata))]
    pub fn load_frames(&self, metadata: &RadarMetadata, location_id: &str) {
        let mut inner = self.inner.lock();
        inner.cancel_timer();
        inner.clear_frames();

        let frames = metadata.frames_in_order();
        if frames.is_empty() {
            tracing::info!("No radar frames available");
            inner.label = LABEL_NO_DATA.to_string();
            return;
        }

        tracing::debug!("Loading {} radar frames", frames.len());
        for frame in &frames {
            let url = tile_url(&inner.options.tile_base_url, &frame.path);
            let layer = inner.map.add_layer(&url, 0.0);
            inner.layers.push(layer);
        }
        inner.cursor = frames.len() - 1;
        inner.frames = frames;
        inner.loaded_for = Some(location_id.to_string());
        inner.render();
        drop(inner);

        self.start_timer();
    }

    /// Step the visible frame forward (`1`) or back (`-1`), wrapping at both
    /// ends, and restart the timer.
    pub fn step(&self, direction: i32) {
        {
            let mut inner = self.inner.lock();
            let len = inner.frames.len();
            if len == 0 {
                return;
            }
            inner.cursor =
                (inner.cursor as i64 + i64::from(direction)).rem_euclid(len as i64) as usize;
            inner.render();
        }
        self.start_timer();
    }

    /// Record that the metadata fetch failed. Any loaded sequence keeps
    /// playing; only an empty display gets the failure label.
    pub fn mark_unavailable(&self) {
        let mut inner = self.inner.lock();
        if inner.frames.is_empty() {
            inner.label = LABEL_UNAVAILABLE.to_string();
        }
    }

    /// Stop the animation and detach all layers.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.cancel_timer();
        inner.clear_frames();
        inner.label = LABEL_IDLE.to_string();
    }

    /// Current timestamp label.
    pub fn label(&self) -> String {
        self.inner.lock().label.clone()
    }

    /// Index of the visible frame.
    pub fn cursor(&self) -> usize {
        self.inner.lock().cursor
    }

    /// Number of loaded frames.
    pub fn frame_count(&self) -> usize {
        self.inner.lock().frames.len()
    }

    /// Whether the auto-advance timer is running.
    pub fn has_active_timer(&self) -> bool {
        self.inner
            .lock()
            .timer
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Cancel any running timer and spawn a fresh one. At most one timer task
    /// is live at a time.
    fn start_timer(&self) {
        let token = CancellationToken::new();
        let interval = {
            let mut inner = self.inner.lock();
            inner.cancel_timer();
            inner.timer = Some(token.clone());
            inner.options.animation_interval
        };

        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; the visible frame was just
            // rendered, so swallow it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut inner = controller.inner.lock();
                        let len = inner.frames.len();
                        if len == 0 {
                            break;
                        }
                        inner.cursor = (inner.cursor + 1) % len;
                        inner.render();
                    }
                }
            }
        });
    }
}

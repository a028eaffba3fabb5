//! Tile map capability.
//!
//! The dashboard does not render tiles itself; it consumes a map view as a
//! capability: add a tile layer at an opacity, change a layer's opacity,
//! remove a layer, pan to coordinates. Frontends plug in their own
//! implementation; tests and the terminal binary use [`HeadlessMap`].

use parking_lot::Mutex;
use std::sync::Arc;

/// Fixed tile request suffix: 256px tiles, color scheme 2, smoothed + snow.
const TILE_SUFFIX: &str = "/256/{z}/{x}/{y}/2/1_1.png";

/// Handle for one attached tile layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

impl LayerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Map view capability consumed by the radar controller.
pub trait TileMap: Send {
    /// Pan the view to the given coordinates.
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8);

    /// Attach a tile layer and return its handle.
    fn add_layer(&mut self, url: &str, opacity: f32) -> LayerId;

    /// Change the opacity of an attached layer.
    fn set_opacity(&mut self, layer: LayerId, opacity: f32);

    /// Detach a layer.
    fn remove_layer(&mut self, layer: LayerId);
}

/// Build the tile URL template for one radar frame.
///
/// The `{z}/{x}/{y}` placeholders are left for the map implementation to
/// resolve per tile.
pub fn tile_url(tile_base_url: &str, frame_path: &str) -> String {
    format!("{}{}{}", tile_base_url, frame_path, TILE_SUFFIX)
}

#[derive(Debug, Default)]
struct MapState {
    next_id: u64,
    center: Option<(f64, f64, u8)>,
    layers: Vec<(LayerId, String, f32)>,
}

/// In-memory map view: tracks layers and opacities without drawing anything.
///
/// Used by the terminal frontend and by tests that assert on layer state.
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    state: Arc<Mutex<MapState>>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently attached layers.
    pub fn layer_count(&self) -> usize {
        self.state.lock().layers.len()
    }

    /// Handles of layers with non-zero opacity.
    pub fn visible_layers(&self) -> Vec<LayerId> {
        self.state
            .lock()
            .layers
            .iter()
            .filter(|(_, _, opacity)| *opacity > 0.0)
            .map(|(id, _, _)| *id)
            .collect()
    }

    /// Opacity of an attached layer, if present.
    pub fn opacity(&self, layer: LayerId) -> Option<f32> {
        self.state
            .lock()
            .layers
            .iter()
            .find(|(id, _, _)| *id == layer)
            .map(|(_, _, opacity)| *opacity)
    }

    /// URL of an attached layer, if present.
    pub fn layer_url(&self, layer: LayerId) -> Option<String> {
        self.state
            .lock()
            .layers
            .iter()
            .find(|(id, _, _)| *id == layer)
            .map(|(_, url, _)| url.clone())
    }

    /// Current view center and zoom.
    pub fn center(&self) -> Option<(f64, f64, u8)> {
        self.state.lock().center
    }
}

impl TileMap for HeadlessMap {
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        tracing::debug!("Map view -> {:.4}, {:.4} @ z{}", latitude, longitude, zoom);
        self.state.lock().center = Some((latitude, longitude, zoom));
    }

    fn add_layer(&mut self, url: &str, opacity: f32) -> LayerId {
        let mut state = self.state.lock();
        let id = LayerId::new(state.next_id);
        state.next_id += 1;
        state.layers.push((id, url.to_string(), opacity));
        id
    }

    fn set_opacity(&mut self, layer: LayerId, opacity: f32) {
        let mut state = self.state.lock();
        if let Some(entry) = state.layers.iter_mut().find(|(id, _, _)| *id == layer) {
            entry.2 = opacity;
        }
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.state.lock().layers.retain(|(id, _, _)| *id != layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_template() {
        let url = tile_url("https://tilecache.example.com", "/v2/radar/1714564800");
        assert_eq!(
            url,
            "https://tilecache.example.com/v2/radar/1714564800/256/{z}/{x}/{y}/2/1_1.png"
        );
    }

    #[test]
    fn test_headless_map_tracks_layers() {
        let map = HeadlessMap::new();
        let mut handle = map.clone();

        let a = handle.add_layer("a", 0.0);
        let b = handle.add_layer("b", 0.85);
        assert_eq!(map.layer_count(), 2);
        assert_eq!(map.visible_layers(), vec![b]);

        handle.set_opacity(a, 0.85);
        handle.set_opacity(b, 0.0);
        assert_eq!(map.visible_layers(), vec![a]);

        handle.remove_layer(a);
        assert_eq!(map.layer_count(), 1);
        assert_eq!(map.opacity(a), None);
    }

    #[test]
    fn test_headless_map_recenters() {
        let map = HeadlessMap::new();
        let mut handle = map.clone();
        handle.set_view(52.52, 13.41, 6);
        handle.set_view(48.14, 11.58, 6);
        assert_eq!(map.center(), Some((48.14, 11.58, 6)));
    }
}

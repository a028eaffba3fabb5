//! Precipitation radar for Nimbus
//!
//! Manages an ordered sequence of time-stamped tile frames over a map view:
//! fetching frame metadata, stepping through frames, auto-advancing on a
//! timer, and keeping exactly one frame layer visible at a time.

pub mod controller;
pub mod map;
pub mod meta;

pub use controller::{RadarController, RadarOptions};
pub use map::{tile_url, HeadlessMap, LayerId, TileMap};
pub use meta::{RadarError, RadarFrame, RadarMetaClient, RadarMetadata};

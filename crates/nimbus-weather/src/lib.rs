//! Weather data layer for Nimbus
//!
//! Domain types plus the Open-Meteo-shaped provider clients: place search,
//! forecast, weather warnings, and device geolocation.

pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use geocode::{GeocodeClient, PlaceCandidate};
pub use location::{resolve_device_location, GeolocationSource};
pub use provider::{ForecastClient, WarningsClient};
pub use types::*;

//! Nimbus application layer
//!
//! Ties the weather and radar crates together: the session orchestrator that
//! reacts to user actions, the pure view projection, and the offline asset
//! cache.

pub mod assets;
pub mod session;
pub mod view;

pub use assets::{AssetCache, AssetError};
pub use session::{Session, ViewState};

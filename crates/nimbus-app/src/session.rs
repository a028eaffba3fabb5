//! Session orchestration.
//!
//! All user actions funnel through [`Session`]: selecting a location, place
//! search, favorites, device geolocation, and the display range. The session
//! applies location changes optimistically, fetches forecast and warnings in
//! parallel, and commits results only when both arrive and the location is
//! still the active one.

use std::sync::Arc;

use parking_lot::Mutex;

use nimbus_core::{StateStore, FAVORITES_KEY, LAST_LOCATION_KEY};
use nimbus_radar::{RadarController, RadarMetaClient, TileMap};
use nimbus_weather::{
    resolve_device_location, DisplayRange, Favorites, ForecastClient, ForecastSnapshot,
    GeocodeClient, GeolocationSource, Location, PlaceCandidate, WarningEntry, WarningsClient,
};

/// Everything a frontend needs to draw the dashboard.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub active: Option<Location>,
    pub forecast: Option<ForecastSnapshot>,
    pub warnings: Vec<WarningEntry>,
    pub favorites: Favorites,
    pub range: DisplayRange,
    pub status: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active: None,
            forecast: None,
            warnings: Vec::new(),
            favorites: Favorites::default(),
            range: DisplayRange::default(),
            status: "Bereit.".to_string(),
        }
    }
}

pub struct Session<M> {
    state: Arc<Mutex<ViewState>>,
    store: StateStore,
    geocode: GeocodeClient,
    forecast: ForecastClient,
    warnings: WarningsClient,
    radar_meta: RadarMetaClient,
    radar: RadarController<M>,
}

impl<M: TileMap + Send + 'static> Session<M> {
    pub fn new(
        store: StateStore,
        geocode: GeocodeClient,
        forecast: ForecastClient,
        warnings: WarningsClient,
        radar_meta: RadarMetaClient,
        radar: RadarController<M>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::default())),
            store,
            geocode,
            forecast,
            warnings,
            radar_meta,
            radar,
        }
    }

    /// Snapshot of the current view state.
    pub fn state(&self) -> ViewState {
        self.state.lock().clone()
    }

    pub fn radar(&self) -> &RadarController<M> {
        &self.radar
    }

    /// Restore persisted favorites and re-select the last active location.
    pub async fn startup(&self) {
        let favorites = self
            .store
            .load::<Vec<Location>>(FAVORITES_KEY)
            .map(Favorites::new)
            .unwrap_or_default();
        self.state.lock().favorites = favorites;

        if let Some(last) = self.store.load::<Location>(LAST_LOCATION_KEY) {
            self.select_location(last).await;
        }
    }

    /// Make a location the active one and refresh all data for it.
    ///
    /// The active location and the "loading" status apply immediately; the
    /// fetched data commits only if this location is still active when the
    /// responses arrive, and only if forecast and warnings both succeeded.
    #[tracing::instrument(skip(self, location), fields(id = %location.id))]
    pub async fn select_location(&self, location: Location) {
        {
            let mut state = self.state.lock();
            state.active = Some(location.clone());
            state.status = format!("Lade Wetterdaten für {} …", location.name);
        }
        if !self.store.save(LAST_LOCATION_KEY, &location) {
            tracing::warn!("Could not persist last location");
        }

        let (forecast, warnings) = tokio::join!(
            self.forecast.fetch(
                location.latitude,
                location.longitude,
                location.timezone.as_deref(),
            ),
            self.warnings.fetch(location.latitude, location.longitude),
        );

        let committed = {
            let mut state = self.state.lock();
            if state.active.as_ref() != Some(&location) {
                tracing::debug!("Discarding stale responses for {}", location.name);
                return;
            }
            match (forecast, warnings) {
                (Ok(snapshot), Ok(warnings)) => {
                    state.forecast = Some(snapshot);
                    state.warnings = warnings;
                    state.status = format!("Daten aktualisiert für {}.", location.name);
                    true
                }
                (Err(e), _) => {
                    tracing::warn!("Forecast fetch failed: {}", e);
                    state.status = e.user_message().to_string();
                    false
                }
                (_, Err(e)) => {
                    tracing::warn!("Warnings fetch failed: {}", e);
                    state.status = e.user_message().to_string();
                    false
                }
            }
        };

        // The radar follows committed data only; a failed selection leaves
        // the previous location's frames playing.
        if committed {
            self.update_radar(&location).await;
        }
    }

    /// Promote a search candidate to the active location.
    pub async fn select_candidate(&self, candidate: PlaceCandidate) {
        self.select_location(candidate.into_location()).await;
    }

    /// Free-text place search. The candidates are returned for the frontend
    /// to offer; the result count lands in the status line.
    pub async fn search(&self, query: &str) -> Vec<PlaceCandidate> {
        let query = query.trim();
        if query.is_empty() {
            self.state.lock().status = "Bitte gib einen Ort ein.".to_string();
            return Vec::new();
        }

        self.state.lock().status = "Suche Orte …".to_string();
        match self.geocode.search(query).await {
            Ok(candidates) => {
                let mut state = self.state.lock();
                state.status = if candidates.is_empty() {
                    "Keine Treffer gefunden.".to_string()
                } else {
                    format!("{} Treffer gefunden.", candidates.len())
                };
                candidates
            }
            Err(e) => {
                tracing::warn!("Place search failed: {}", e);
                self.state.lock().status = "Suche fehlgeschlagen.".to_string();
                Vec::new()
            }
        }
    }

    /// Resolve the device position and select it as the active location.
    pub async fn locate<G: GeolocationSource>(&self, source: &G) {
        self.state.lock().status = "Hole Standort …".to_string();
        match resolve_device_location(source).await {
            Ok(location) => self.select_location(location).await,
            Err(e) => {
                tracing::warn!("Geolocation failed: {}", e);
                self.state.lock().status = e.user_message().to_string();
            }
        }
    }

    /// Flip favorite membership of the active location. Without an active
    /// location this does nothing.
    pub fn toggle_favorite(&self) {
        let favorites = {
            let mut state = self.state.lock();
            let Some(active) = state.active.clone() else {
                tracing::debug!("Favorite toggle without active location ignored");
                return;
            };
            let added = state.favorites.toggle(active);
            state.status = if added {
                "Favorit gespeichert.".to_string()
            } else {
                "Favorit entfernt.".to_string()
            };
            state.favorites.clone()
        };

        if !self.store.save(FAVORITES_KEY, &favorites) {
            tracing::warn!("Could not persist favorites");
        }
    }

    pub fn set_range(&self, range: DisplayRange) {
        self.state.lock().range = range;
    }

    /// Clear a dismissible notice.
    pub fn dismiss_status(&self) {
        self.state.lock().status = "Bereit.".to_string();
    }

    async fn update_radar(&self, location: &Location) {
        self.radar
            .prepare_for(&location.id, location.latitude, location.longitude);

        match self.radar_meta.fetch().await {
            Ok(metadata) => {
                let still_active = self.state.lock().active.as_ref() == Some(location);
                if still_active {
                    self.radar.load_frames(&metadata, &location.id);
                } else {
                    tracing::debug!("Discarding stale radar frames for {}", location.name);
                }
            }
            Err(e) => {
                tracing::warn!("Radar metadata fetch failed: {}", e);
                self.radar.mark_unavailable();
            }
        }
    }
}

use anyhow::Result;

use nimbus_app::assets::PRECACHE_PATHS;
use nimbus_app::{view, AssetCache, Session};
use nimbus_core::{Config, StateStore};
use nimbus_radar::{HeadlessMap, RadarController, RadarMetaClient, RadarOptions};
use nimbus_weather::{
    ForecastClient, GeocodeClient, GeolocationSource, LocationError, WarningsClient,
};

/// Position fix from the `NIMBUS_POSITION` environment variable
/// (`"lat,lon"`). A stand-in until a platform positioning backend exists.
struct EnvPosition;

impl GeolocationSource for EnvPosition {
    async fn current_position(&self) -> Result<(f64, f64), LocationError> {
        let raw = std::env::var("NIMBUS_POSITION")
            .map_err(|_| LocationError::ServiceUnavailable)?;
        let (lat, lon) = raw
            .split_once(',')
            .ok_or_else(|| LocationError::Other(format!("bad position '{raw}'")))?;
        let latitude = lat
            .trim()
            .parse()
            .map_err(|_| LocationError::Other(format!("bad latitude '{lat}'")))?;
        let longitude = lon
            .trim()
            .parse()
            .map_err(|_| LocationError::Other(format!("bad longitude '{lon}'")))?;
        Ok((latitude, longitude))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    nimbus_core::init()?;

    let (config, _validation) = Config::load_validated()?;

    if let Some(asset_base_url) = &config.endpoints.asset_base_url {
        let cache = AssetCache::new(asset_base_url, config.config_dir.join("cache"));
        cache.activate()?;
        cache.prefetch(PRECACHE_PATHS).await;
    }

    let radar = RadarController::new(
        HeadlessMap::new(),
        RadarOptions {
            tile_base_url: config.endpoints.tile_base_url.clone(),
            zoom: config.radar.zoom,
            visible_opacity: config.radar.visible_opacity,
            animation_interval: std::time::Duration::from_secs(
                config.radar.animation_interval_secs,
            ),
        },
    );

    let session = Session::new(
        StateStore::open_default(),
        GeocodeClient::new_with_base_url(
            &config.forecast.language,
            &config.endpoints.geocode_url,
        ),
        ForecastClient::new_with_base_url(&config.endpoints.forecast_url),
        WarningsClient::new_with_base_url(&config.endpoints.warnings_url),
        RadarMetaClient::new_with_base_url(config.endpoints.radar_meta_url.clone()),
        radar,
    );

    tracing::info!("Nimbus started");
    session.startup().await;

    // A query on the command line searches and selects the first hit;
    // otherwise fall back to the environment position, then to whatever
    // startup restored.
    if let Some(query) = std::env::args().nth(1) {
        let candidates = session.search(&query).await;
        if let Some(first) = candidates.into_iter().next() {
            session.select_candidate(first).await;
        }
    } else if session.state().active.is_none() {
        session.locate(&EnvPosition).await;
    }

    let state = session.state();
    print!(
        "{}",
        view::render_text(
            &state,
            &session.radar().label(),
            config.forecast.hourly_window,
            config.forecast.daily_window,
        )
    );

    session.radar().shutdown();
    Ok(())
}

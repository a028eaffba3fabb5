use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Upstream data provider endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Radar view settings
    #[serde(default)]
    pub radar: RadarConfig,

    /// Forecast display settings
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// Query endpoints for the external data providers.
///
/// All four are plain HTTPS JSON endpoints consumed without authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Place search (free-text name -> candidates)
    pub geocode_url: String,

    /// Forecast by coordinates
    pub forecast_url: String,

    /// Active weather warnings by coordinates
    pub warnings_url: String,

    /// Radar tile-layer metadata (past + nowcast frames)
    pub radar_meta_url: String,

    /// Base for per-frame tile templates
    pub tile_base_url: String,

    /// Optional mirror for static UI assets, cached for offline use
    #[serde(default)]
    pub asset_base_url: Option<String>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocode_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            warnings_url: "https://api.open-meteo.com/v1/warnings".to_string(),
            radar_meta_url: "https://api.rainviewer.com/public/weather-maps.json".to_string(),
            tile_base_url: "https://tilecache.rainviewer.com".to_string(),
            asset_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarConfig {
    /// Auto-advance interval between frames, in seconds
    #[serde(default = "default_animation_interval")]
    pub animation_interval_secs: u64,

    /// Map zoom level when centering on a location
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Opacity of the frame layer at the cursor; all others are 0.0
    #[serde(default = "default_visible_opacity")]
    pub visible_opacity: f32,
}

fn default_animation_interval() -> u64 {
    3
}

fn default_zoom() -> u8 {
    6
}

fn default_visible_opacity() -> f32 {
    0.85
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            animation_interval_secs: default_animation_interval(),
            zoom: default_zoom(),
            visible_opacity: default_visible_opacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Language for place search results
    #[serde(default = "default_language")]
    pub language: String,

    /// Number of hourly entries shown from the current hour
    #[serde(default = "default_hourly_window")]
    pub hourly_window: usize,

    /// Number of daily entries shown
    #[serde(default = "default_daily_window")]
    pub daily_window: usize,
}

fn default_language() -> String {
    "de".to_string()
}

fn default_hourly_window() -> usize {
    24
}

fn default_daily_window() -> usize {
    7
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            hourly_window: default_hourly_window(),
            daily_window: default_daily_window(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nimbus");

        Self {
            config_dir,
            endpoints: EndpointsConfig::default(),
            radar: RadarConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.endpoints.geocode_url, "endpoints.geocode_url", &mut result);
        self.validate_url(&self.endpoints.forecast_url, "endpoints.forecast_url", &mut result);
        self.validate_url(&self.endpoints.warnings_url, "endpoints.warnings_url", &mut result);
        self.validate_url(
            &self.endpoints.radar_meta_url,
            "endpoints.radar_meta_url",
            &mut result,
        );
        self.validate_url(
            &self.endpoints.tile_base_url,
            "endpoints.tile_base_url",
            &mut result,
        );
        if let Some(asset_base_url) = &self.endpoints.asset_base_url {
            self.validate_url(asset_base_url, "endpoints.asset_base_url", &mut result);
        }

        if self.radar.animation_interval_secs == 0 {
            result.add_error(
                "radar.animation_interval_secs",
                "Animation interval must be greater than 0",
            );
        } else if self.radar.animation_interval_secs > 60 {
            result.add_warning(
                "radar.animation_interval_secs",
                "Animation interval is unusually slow (>60s)",
            );
        }

        if !(0.0..=1.0).contains(&self.radar.visible_opacity) {
            result.add_error(
                "radar.visible_opacity",
                "Opacity must be between 0.0 and 1.0",
            );
        }

        if self.radar.zoom > 12 {
            result.add_warning("radar.zoom", "Zoom beyond tile provider maximum (12)");
        }

        if self.forecast.hourly_window == 0 {
            result.add_warning("forecast.hourly_window", "Hourly forecast display disabled");
        }

        if self.forecast.daily_window == 0 {
            result.add_warning("forecast.daily_window", "Daily forecast display disabled");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("nimbus");

        Ok(config_dir.join("config.toml"))
    }
}

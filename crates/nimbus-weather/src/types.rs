use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A resolved place, selected from search results or device geolocation.
///
/// Identity is the `id` field alone; two locations with equal ids compare
/// equal regardless of the display fields. Instances are never mutated after
/// construction, a change of place is a replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub country: String,
    pub admin1: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Location {}

impl Location {
    /// Build a location from a device geolocation fix.
    ///
    /// The id is derived from the rounded coordinates so that repeated fixes
    /// from roughly the same spot resolve to the same identity.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            id: format!("geo-{:.2}-{:.2}", latitude, longitude),
            name: "Mein Standort".to_string(),
            country: String::new(),
            admin1: None,
            latitude,
            longitude,
            timezone: Some("auto".to_string()),
        }
    }

    /// Display name pieces: name, region (when distinct), country.
    pub fn display_pieces(&self) -> Vec<&str> {
        let mut pieces = vec![self.name.as_str()];
        if let Some(admin1) = &self.admin1 {
            if admin1 != &self.name {
                pieces.push(admin1.as_str());
            }
        }
        if !self.country.is_empty() {
            pieces.push(self.country.as_str());
        }
        pieces
    }
}

/// Insertion-ordered favorites collection, unique by location id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Favorites(Vec<Location>);

impl Favorites {
    pub fn new(locations: Vec<Location>) -> Self {
        let mut favorites = Self::default();
        for location in locations {
            if !favorites.contains(&location.id) {
                favorites.0.push(location);
            }
        }
        favorites
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|fav| fav.id == id)
    }

    /// Flip membership for the given location.
    ///
    /// Returns `true` when the location is a favorite afterwards. Removal
    /// keeps the remaining entries in their original order.
    pub fn toggle(&mut self, location: Location) -> bool {
        if let Some(index) = self.0.iter().position(|fav| fav.id == location.id) {
            self.0.remove(index);
            false
        } else {
            self.0.push(location);
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Location] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Current-conditions reading from the forecast provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
}

/// One hour of the forecast, all readings index-aligned by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HourEntry {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub precipitation_probability: f64,
    pub precipitation: f64,
    pub weathercode: i32,
    pub windspeed: f64,
    pub windgusts: f64,
}

/// One day of the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_sum: f64,
    pub precipitation_probability_max: f64,
    pub windspeed_max: f64,
    pub weathercode: i32,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

/// A point-in-time forecast fetch result.
///
/// Replaced wholesale on every successful fetch, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub current: CurrentConditions,
    pub hourly: Vec<HourEntry>,
    pub daily: Vec<DayEntry>,
}

impl ForecastSnapshot {
    /// Index of the hourly entry matching the current reading's timestamp.
    ///
    /// Falls back to index 0 when the timestamp is absent from the hourly
    /// sequence, matching the provider's occasional off-grid current time.
    pub fn current_hour_index(&self) -> usize {
        self.hourly
            .iter()
            .position(|hour| hour.time == self.current.time)
            .unwrap_or(0)
    }
}

/// One active weather advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct WarningEntry {
    pub severity: String,
    pub title: String,
    pub description: String,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub source: Option<String>,
}

/// Forecast display range selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayRange {
    #[default]
    Hourly,
    Daily,
}

/// Human-readable label for a WMO weather code.
pub fn weather_code_label(code: i32) -> &'static str {
    match code {
        0 => "Klar",
        1 => "Überwiegend klar",
        2 => "Teilweise bewölkt",
        3 => "Bewölkt",
        45 => "Nebel",
        48 => "Reifnebel",
        51 => "Leichter Niesel",
        53 => "Mäßiger Niesel",
        55 => "Starker Niesel",
        56 => "Leichter Eisniesel",
        57 => "Starker Eisniesel",
        61 => "Leichter Regen",
        63 => "Regen",
        65 => "Starker Regen",
        66 => "Eisregen",
        67 => "Starker Eisregen",
        71 => "Leichter Schneefall",
        73 => "Schneefall",
        75 => "Starker Schneefall",
        77 => "Schneekörner",
        80 => "Leichte Regenschauer",
        81 => "Regenschauer",
        82 => "Starke Regenschauer",
        85 => "Leichte Schneeschauer",
        86 => "Schneeschauer",
        95 => "Gewitter",
        96 => "Gewitter mit Hagel",
        99 => "Schweres Gewitter",
        _ => "Unbekannt",
    }
}

/// Display glyph for a WMO weather code.
pub fn weather_code_glyph(code: i32) -> &'static str {
    match code {
        0 => "○",
        1 => "◐",
        2 => "◑",
        3 => "●",
        45 | 48 => "≋",
        51..=57 => "☂",
        61 | 63 | 65 | 80 | 81 | 82 => "☔",
        66 | 67 => "☃",
        71 | 73 | 75 | 85 | 86 => "✼",
        77 => "✵",
        95 | 96 | 99 => "⚡",
        _ => "∙",
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    /// Dismissible notice text for the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Standortfreigabe wurde verweigert.",
            LocationError::ServiceUnavailable => "Geolokalisierung nicht verfügbar.",
            LocationError::Timeout | LocationError::Other(_) => {
                "Konnte Standort nicht bestimmen."
            }
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned status {status}")]
    Api { status: u16 },
    #[error("Response decode error: {0}")]
    Decode(String),
    #[error("Response shape invalid: {0}")]
    Shape(String),
}

impl WeatherError {
    /// Dismissible notice text for the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(_) | WeatherError::Api { .. } => {
                "Etwas ist schiefgelaufen. Bitte erneut versuchen."
            }
            WeatherError::Decode(_) | WeatherError::Shape(_) => {
                "Unerwartete Antwort vom Wetterdienst."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn location(id: &str, name: &str) -> Location {
        Location {
            id: id.to_string(),
            name: name.to_string(),
            country: "Deutschland".to_string(),
            admin1: None,
            latitude: 52.52,
            longitude: 13.41,
            timezone: Some("Europe/Berlin".to_string()),
        }
    }

    #[test]
    fn test_location_equality_is_by_id_only() {
        let a = location("2950159", "Berlin");
        let mut b = location("2950159", "Berlin-Mitte");
        b.latitude = 0.0;
        assert_eq!(a, b);

        let c = location("2911298", "Hamburg");
        assert_ne!(a, c);
    }

    #[test]
    fn test_geolocated_id_is_derived_from_rounded_coordinates() {
        let a = Location::from_coordinates(52.5201, 13.4094);
        let b = Location::from_coordinates(52.5233, 13.4101);
        assert_eq!(a.id, "geo-52.52-13.41");
        // Nearby fixes collapse onto the same identity.
        assert_eq!(a.id, b.id);

        let c = Location::from_coordinates(52.5301, 13.4198);
        assert_eq!(c.id, "geo-52.53-13.42");
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_favorites_toggle_adds_and_removes() {
        let mut favorites = Favorites::default();
        assert!(favorites.toggle(location("1", "Berlin")));
        assert!(favorites.contains("1"));
        assert!(!favorites.toggle(location("1", "Berlin")));
        assert!(!favorites.contains("1"));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_favorites_double_toggle_restores_membership() {
        let mut favorites = Favorites::default();
        favorites.toggle(location("1", "Berlin"));
        let before = favorites.len();

        favorites.toggle(location("2", "Hamburg"));
        favorites.toggle(location("2", "Hamburg"));
        assert_eq!(favorites.len(), before);
        assert!(favorites.contains("1"));
        assert!(!favorites.contains("2"));
    }

    #[test]
    fn test_favorites_never_hold_duplicate_ids() {
        let mut favorites = Favorites::default();
        for _ in 0..5 {
            favorites.toggle(location("1", "Berlin"));
            favorites.toggle(location("2", "Hamburg"));
            favorites.toggle(location("1", "Berlin"));
        }
        let ids: Vec<&str> = favorites.iter().map(|l| l.id.as_str()).collect();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);
    }

    #[test]
    fn test_favorites_removal_preserves_order() {
        let mut favorites = Favorites::default();
        favorites.toggle(location("1", "Berlin"));
        favorites.toggle(location("2", "Hamburg"));
        favorites.toggle(location("3", "München"));

        favorites.toggle(location("2", "Hamburg"));
        let ids: Vec<&str> = favorites.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_favorites_new_drops_duplicates_from_stored_data() {
        let favorites =
            Favorites::new(vec![location("1", "Berlin"), location("1", "Berlin (alt)")]);
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_current_hour_index_matches_timestamp() {
        let t0 = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let t1 = t0 + chrono::Duration::hours(1);

        let hour = |time| HourEntry {
            time,
            temperature: 10.0,
            apparent_temperature: 9.0,
            humidity: 60.0,
            precipitation_probability: 0.0,
            precipitation: 0.0,
            weathercode: 0,
            windspeed: 5.0,
            windgusts: 8.0,
        };

        let snapshot = ForecastSnapshot {
            current: CurrentConditions {
                time: t1,
                temperature: 11.0,
                windspeed: 5.0,
                weathercode: 0,
            },
            hourly: vec![hour(t0), hour(t1)],
            daily: vec![],
        };
        assert_eq!(snapshot.current_hour_index(), 1);
    }

    #[test]
    fn test_current_hour_index_falls_back_to_zero() {
        let t0 = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let snapshot = ForecastSnapshot {
            current: CurrentConditions {
                time: t0 + chrono::Duration::minutes(30),
                temperature: 11.0,
                windspeed: 5.0,
                weathercode: 0,
            },
            hourly: vec![HourEntry {
                time: t0,
                temperature: 10.0,
                apparent_temperature: 9.0,
                humidity: 60.0,
                precipitation_probability: 0.0,
                precipitation: 0.0,
                weathercode: 0,
                windspeed: 5.0,
                windgusts: 8.0,
            }],
            daily: vec![],
        };
        assert_eq!(snapshot.current_hour_index(), 0);
    }

    #[test]
    fn test_weather_code_labels() {
        assert_eq!(weather_code_label(0), "Klar");
        assert_eq!(weather_code_label(63), "Regen");
        assert_eq!(weather_code_label(95), "Gewitter");
        assert_eq!(weather_code_label(42), "Unbekannt");
    }

    #[test]
    fn test_weather_code_glyphs() {
        assert_eq!(weather_code_glyph(0), "○");
        assert_eq!(weather_code_glyph(81), "☔");
        assert_eq!(weather_code_glyph(42), "∙");
    }
}

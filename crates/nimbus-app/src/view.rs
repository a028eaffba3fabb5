//! Text projection of the session state.
//!
//! Everything here is a pure function of the state it is handed; nothing is
//! fetched or mutated. A graphical frontend would replace this module and
//! keep the session untouched.

use nimbus_weather::{
    weather_code_glyph, weather_code_label, DisplayRange, Favorites, ForecastSnapshot,
    WarningEntry,
};

use chrono::NaiveDateTime;

use crate::session::ViewState;

pub fn format_temperature(value: f64) -> String {
    format!("{}°C", value.round() as i64)
}

pub fn format_wind(value: f64) -> String {
    format!("{} km/h", value.round() as i64)
}

pub fn format_percentage(value: f64) -> String {
    format!("{} %", value.round() as i64)
}

/// Current conditions summary, enriched with feels-like, humidity and gusts
/// from the hourly entry matching the current reading.
pub fn current_lines(snapshot: &ForecastSnapshot) -> Vec<String> {
    let current = &snapshot.current;
    let mut lines = vec![format!(
        "{} {}  {}  Wind {}",
        weather_code_glyph(current.weathercode),
        weather_code_label(current.weathercode),
        format_temperature(current.temperature),
        format_wind(current.windspeed),
    )];

    if let Some(hour) = snapshot.hourly.get(snapshot.current_hour_index()) {
        lines.push(format!(
            "Gefühlt {}  Luftfeuchte {}  Böen {}",
            format_temperature(hour.apparent_temperature),
            format_percentage(hour.humidity),
            format_wind(hour.windgusts),
        ));
    }

    if let Some(today) = snapshot.daily.first() {
        lines.push(format!(
            "Sonnenaufgang {}  Sonnenuntergang {}",
            today.sunrise.format("%H:%M"),
            today.sunset.format("%H:%M"),
        ));
    }
    lines
}

/// Warning onset/expires values arrive as provider timestamps; anything
/// unparseable is shown as-is.
fn format_warning_time(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|time| time.format("%d.%m. %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Hourly rows starting at the current hour.
pub fn hourly_lines(snapshot: &ForecastSnapshot, window: usize) -> Vec<String> {
    let start = snapshot.current_hour_index();
    snapshot
        .hourly
        .iter()
        .skip(start)
        .take(window)
        .map(|hour| {
            format!(
                "{}  {} {}  Regen {}",
                hour.time.format("%H:%M"),
                weather_code_glyph(hour.weathercode),
                format_temperature(hour.temperature),
                format_percentage(hour.precipitation_probability),
            )
        })
        .collect()
}

pub fn daily_lines(snapshot: &ForecastSnapshot, window: usize) -> Vec<String> {
    snapshot
        .daily
        .iter()
        .take(window)
        .map(|day| {
            format!(
                "{}  {} {} / {}  Regen {}",
                day.date.format("%a %d.%m."),
                weather_code_glyph(day.weathercode),
                format_temperature(day.temperature_max),
                format_temperature(day.temperature_min),
                format_percentage(day.precipitation_probability_max),
            )
        })
        .collect()
}

pub fn warning_lines(warnings: &[WarningEntry]) -> Vec<String> {
    if warnings.is_empty() {
        return vec!["Keine Warnungen aktiv.".to_string()];
    }

    let mut lines = Vec::new();
    for warning in warnings {
        let mut line = format!("[{}] {}", warning.severity.to_uppercase(), warning.title);
        if !warning.description.is_empty() {
            line.push_str(": ");
            line.push_str(&warning.description);
        }
        lines.push(line);

        let mut meta = Vec::new();
        if let Some(onset) = &warning.onset {
            meta.push(format!("ab {}", format_warning_time(onset)));
        }
        if let Some(expires) = &warning.expires {
            meta.push(format!("bis {}", format_warning_time(expires)));
        }
        if let Some(source) = &warning.source {
            meta.push(format!("Quelle: {}", source));
        }
        if !meta.is_empty() {
            lines.push(meta.join(" · "));
        }
    }
    lines
}

pub fn favorite_lines(favorites: &Favorites) -> Vec<String> {
    if favorites.is_empty() {
        return vec!["Noch keine Favoriten.".to_string()];
    }
    favorites
        .iter()
        .map(|fav| fav.display_pieces().join(", "))
        .collect()
}

/// Render the whole dashboard as text.
pub fn render_text(
    state: &ViewState,
    radar_label: &str,
    hourly_window: usize,
    daily_window: usize,
) -> String {
    let mut out = String::new();

    if let Some(active) = &state.active {
        out.push_str(&active.display_pieces().join(", "));
        out.push('\n');
    }
    out.push_str(&state.status);
    out.push('\n');

    if let Some(snapshot) = &state.forecast {
        out.push_str("\n== Aktuell ==\n");
        for line in current_lines(snapshot) {
            out.push_str(&line);
            out.push('\n');
        }

        match state.range {
            DisplayRange::Hourly => {
                out.push_str("\n== Stündlich ==\n");
                for line in hourly_lines(snapshot, hourly_window) {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            DisplayRange::Daily => {
                out.push_str("\n== Täglich ==\n");
                for line in daily_lines(snapshot, daily_window) {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }

        out.push_str("\n== Warnungen ==\n");
        for line in warning_lines(&state.warnings) {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out.push_str("\n== Radar ==\n");
    out.push_str(radar_label);
    out.push('\n');

    out.push_str("\n== Favoriten ==\n");
    for line in favorite_lines(&state.favorites) {
        out.push_str(&line);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::NaiveDate;
    use nimbus_weather::{CurrentConditions, DayEntry, HourEntry, Location};

    fn hour(time: chrono::NaiveDateTime, temperature: f64) -> HourEntry {
        HourEntry {
            time,
            temperature,
            apparent_temperature: temperature - 2.0,
            humidity: 71.0,
            precipitation_probability: 40.0,
            precipitation: 0.1,
            weathercode: 61,
            windspeed: 14.0,
            windgusts: 31.0,
        }
    }

    fn snapshot() -> ForecastSnapshot {
        let t0 = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let hourly: Vec<HourEntry> = (0..48)
            .map(|i| hour(t0 + chrono::Duration::hours(i), 10.0 + i as f64 * 0.1))
            .collect();
        let daily = vec![DayEntry {
            date: t0.date(),
            temperature_max: 17.6,
            temperature_min: 8.2,
            precipitation_sum: 1.4,
            precipitation_probability_max: 55.0,
            windspeed_max: 22.0,
            weathercode: 80,
            sunrise: t0,
            sunset: t0,
        }];
        ForecastSnapshot {
            current: CurrentConditions {
                time: t0 + chrono::Duration::hours(3),
                temperature: 11.4,
                windspeed: 13.5,
                weathercode: 61,
            },
            hourly,
            daily,
        }
    }

    #[test]
    fn test_formatting_rounds_to_whole_units() {
        assert_eq!(format_temperature(11.4), "11°C");
        assert_eq!(format_temperature(-0.2), "0°C");
        assert_eq!(format_wind(13.5), "14 km/h");
        assert_eq!(format_percentage(40.0), "40 %");
    }

    #[test]
    fn test_current_lines_use_matching_hour() {
        let lines = current_lines(&snapshot());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Leichter Regen"));
        assert!(lines[0].contains("11°C"));
        // Hour 3: apparent = 10.3 - 2.0
        assert!(lines[1].contains("Gefühlt 8°C"));
        assert!(lines[1].contains("71 %"));
        assert!(lines[2].contains("Sonnenaufgang 12:00"));
        assert!(lines[2].contains("Sonnenuntergang 12:00"));
    }

    #[test]
    fn test_hourly_window_starts_at_current_hour() {
        let lines = hourly_lines(&snapshot(), 24);
        assert_eq!(lines.len(), 24);
        assert!(lines[0].starts_with("15:00"));
    }

    #[test]
    fn test_hourly_window_is_clipped_at_the_end() {
        let lines = hourly_lines(&snapshot(), 100);
        assert_eq!(lines.len(), 45);
    }

    #[test]
    fn test_daily_lines() {
        let lines = daily_lines(&snapshot(), 7);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("18°C / 8°C"));
        assert!(lines[0].contains("55 %"));
    }

    #[test]
    fn test_warning_lines_empty_placeholder() {
        assert_eq!(warning_lines(&[]), vec!["Keine Warnungen aktiv."]);

        let warnings = vec![WarningEntry {
            severity: "Orange".to_string(),
            title: "Sturmböen".to_string(),
            description: "Bis 90 km/h".to_string(),
            onset: None,
            expires: None,
            source: None,
        }];
        assert_eq!(warning_lines(&warnings), vec!["[ORANGE] Sturmböen: Bis 90 km/h"]);
    }

    #[test]
    fn test_warning_meta_line_shows_window_and_source() {
        let warnings = vec![WarningEntry {
            severity: "Severe".to_string(),
            title: "Sturm".to_string(),
            description: String::new(),
            onset: Some("2024-05-01T12:00".to_string()),
            expires: Some("2024-05-01T20:00".to_string()),
            source: Some("DWD".to_string()),
        }];

        let lines = warning_lines(&warnings);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[SEVERE] Sturm");
        assert_eq!(lines[1], "ab 01.05. 12:00 · bis 01.05. 20:00 · Quelle: DWD");
    }

    #[test]
    fn test_warning_meta_keeps_unparseable_timestamps_verbatim() {
        let warnings = vec![WarningEntry {
            severity: "Info".to_string(),
            title: "Hinweis".to_string(),
            description: String::new(),
            onset: Some("heute".to_string()),
            expires: None,
            source: None,
        }];

        let lines = warning_lines(&warnings);
        assert_eq!(lines[1], "ab heute");
    }

    #[test]
    fn test_render_text_switches_range() {
        let mut state = ViewState {
            active: Some(Location::from_coordinates(52.52, 13.41)),
            forecast: Some(snapshot()),
            ..ViewState::default()
        };

        let hourly = render_text(&state, "–", 24, 7);
        assert!(hourly.contains("== Stündlich =="));
        assert!(!hourly.contains("== Täglich =="));

        state.range = DisplayRange::Daily;
        let daily = render_text(&state, "–", 24, 7);
        assert!(daily.contains("== Täglich =="));
        assert!(!daily.contains("== Stündlich =="));
    }

    #[test]
    fn test_render_text_without_forecast_still_shows_radar_and_favorites() {
        let state = ViewState::default();
        let text = render_text(&state, "Keine Radardaten", 24, 7);
        assert!(text.contains("Keine Radardaten"));
        assert!(text.contains("Noch keine Favoriten."));
        assert!(!text.contains("== Aktuell =="));
    }
}

//! Forecast and warnings providers.
//!
//! Both endpoints return parallel-array JSON; the forecast payload is
//! converted into per-timestamp records here so that index alignment is
//! enforced structurally instead of by convention.

use serde::Deserialize;
use tracing::instrument;

use crate::types::{
    CurrentConditions, DayEntry, ForecastSnapshot, HourEntry, WarningEntry, WeatherError,
};
use chrono::{NaiveDate, NaiveDateTime};

const FORECAST_API_BASE: &str = "https://api.open-meteo.com/v1/forecast";
const WARNINGS_API_BASE: &str = "https://api.open-meteo.com/v1/warnings";

const HOURLY_FIELDS: &str = "temperature_2m,apparent_temperature,relativehumidity_2m,\
precipitation_probability,precipitation,weathercode,windspeed_10m,windgusts_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,\
precipitation_probability_max,windspeed_10m_max,weathercode,sunrise,sunset";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWire,
    hourly: HourlyWire,
    daily: DailyWire,
}

#[derive(Debug, Deserialize)]
struct CurrentWire {
    time: String,
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct HourlyWire {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    apparent_temperature: Vec<f64>,
    relativehumidity_2m: Vec<f64>,
    precipitation_probability: Vec<Option<f64>>,
    precipitation: Vec<f64>,
    weathercode: Vec<i32>,
    windspeed_10m: Vec<f64>,
    windgusts_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyWire {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_sum: Vec<f64>,
    precipitation_probability_max: Vec<Option<f64>>,
    windspeed_10m_max: Vec<f64>,
    weathercode: Vec<i32>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| WeatherError::Decode(format!("bad timestamp '{}': {}", value, e)))
}

fn parse_date(value: &str) -> Result<NaiveDate, WeatherError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| WeatherError::Decode(format!("bad date '{}': {}", value, e)))
}

fn check_len(name: &str, len: usize, expected: usize) -> Result<(), WeatherError> {
    if len == expected {
        Ok(())
    } else {
        Err(WeatherError::Shape(format!(
            "{} has {} entries, expected {}",
            name, len, expected
        )))
    }
}

impl ForecastResponse {
    fn into_snapshot(self) -> Result<ForecastSnapshot, WeatherError> {
        let hours = self.hourly.time.len();
        check_len("hourly.temperature_2m", self.hourly.temperature_2m.len(), hours)?;
        check_len(
            "hourly.apparent_temperature",
            self.hourly.apparent_temperature.len(),
            hours,
        )?;
        check_len(
            "hourly.relativehumidity_2m",
            self.hourly.relativehumidity_2m.len(),
            hours,
        )?;
        check_len(
            "hourly.precipitation_probability",
            self.hourly.precipitation_probability.len(),
            hours,
        )?;
        check_len("hourly.precipitation", self.hourly.precipitation.len(), hours)?;
        check_len("hourly.weathercode", self.hourly.weathercode.len(), hours)?;
        check_len("hourly.windspeed_10m", self.hourly.windspeed_10m.len(), hours)?;
        check_len("hourly.windgusts_10m", self.hourly.windgusts_10m.len(), hours)?;

        let days = self.daily.time.len();
        check_len(
            "daily.temperature_2m_max",
            self.daily.temperature_2m_max.len(),
            days,
        )?;
        check_len(
            "daily.temperature_2m_min",
            self.daily.temperature_2m_min.len(),
            days,
        )?;
        check_len("daily.precipitation_sum", self.daily.precipitation_sum.len(), days)?;
        check_len(
            "daily.precipitation_probability_max",
            self.daily.precipitation_probability_max.len(),
            days,
        )?;
        check_len("daily.windspeed_10m_max", self.daily.windspeed_10m_max.len(), days)?;
        check_len("daily.weathercode", self.daily.weathercode.len(), days)?;
        check_len("daily.sunrise", self.daily.sunrise.len(), days)?;
        check_len("daily.sunset", self.daily.sunset.len(), days)?;

        let mut hourly = Vec::with_capacity(hours);
        for i in 0..hours {
            hourly.push(HourEntry {
                time: parse_timestamp(&self.hourly.time[i])?,
                temperature: self.hourly.temperature_2m[i],
                apparent_temperature: self.hourly.apparent_temperature[i],
                humidity: self.hourly.relativehumidity_2m[i],
                precipitation_probability: self.hourly.precipitation_probability[i]
                    .unwrap_or(0.0),
                precipitation: self.hourly.precipitation[i],
                weathercode: self.hourly.weathercode[i],
                windspeed: self.hourly.windspeed_10m[i],
                windgusts: self.hourly.windgusts_10m[i],
            });
        }

        let mut daily = Vec::with_capacity(days);
        for i in 0..days {
            daily.push(DayEntry {
                date: parse_date(&self.daily.time[i])?,
                temperature_max: self.daily.temperature_2m_max[i],
                temperature_min: self.daily.temperature_2m_min[i],
                precipitation_sum: self.daily.precipitation_sum[i],
                precipitation_probability_max: self.daily.precipitation_probability_max[i]
                    .unwrap_or(0.0),
                windspeed_max: self.daily.windspeed_10m_max[i],
                weathercode: self.daily.weathercode[i],
                sunrise: parse_timestamp(&self.daily.sunrise[i])?,
                sunset: parse_timestamp(&self.daily.sunset[i])?,
            });
        }

        Ok(ForecastSnapshot {
            current: CurrentConditions {
                time: parse_timestamp(&self.current_weather.time)?,
                temperature: self.current_weather.temperature,
                windspeed: self.current_weather.windspeed,
                weathercode: self.current_weather.weathercode,
            },
            hourly,
            daily,
        })
    }
}

pub struct ForecastClient {
    client: reqwest::Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new() -> Self {
        Self::new_with_base_url(FORECAST_API_BASE)
    }

    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch a forecast snapshot for the given coordinates.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: Option<&str>,
    ) -> Result<ForecastSnapshot, WeatherError> {
        let url = format!(
            "{}?latitude={}&longitude={}&current_weather=true&hourly={}&daily={}&timezone={}",
            self.base_url,
            latitude,
            longitude,
            HOURLY_FIELDS,
            DAILY_FIELDS,
            urlencoding::encode(timezone.unwrap_or("auto")),
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(e.to_string()))?;

        body.into_snapshot()
    }
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct WarningsResponse {
    warnings: Option<Vec<WarningWire>>,
}

#[derive(Debug, Deserialize)]
struct WarningWire {
    severity: Option<String>,
    severity_level: Option<String>,
    level: Option<String>,
    event: Option<String>,
    title: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
    onset: Option<String>,
    expires: Option<String>,
    source: Option<String>,
}

impl WarningWire {
    fn into_entry(self) -> WarningEntry {
        WarningEntry {
            severity: self
                .severity
                .or(self.severity_level)
                .or(self.level)
                .unwrap_or_else(|| "Info".to_string()),
            title: self
                .event
                .or(self.title)
                .unwrap_or_else(|| "Warnung".to_string()),
            description: self.description.or(self.instruction).unwrap_or_default(),
            onset: self.onset,
            expires: self.expires,
            source: self.source,
        }
    }
}

pub struct WarningsClient {
    client: reqwest::Client,
    base_url: String,
}

impl WarningsClient {
    pub fn new() -> Self {
        Self::new_with_base_url(WARNINGS_API_BASE)
    }

    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch active warnings for the given coordinates.
    ///
    /// An empty collection is the common case, not an error.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<WarningEntry>, WeatherError> {
        let url = format!(
            "{}?latitude={}&longitude={}&timezone=auto",
            self.base_url, latitude, longitude,
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        let body: WarningsResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(e.to_string()))?;

        Ok(body
            .warnings
            .unwrap_or_default()
            .into_iter()
            .map(WarningWire::into_entry)
            .collect())
    }
}

impl Default for WarningsClient {
    fn default() -> Self {
        Self::new()
    }
}

//! Radar frame metadata client.

use serde::Deserialize;

/// Radar errors
#[derive(Debug, thiserror::Error)]
pub enum RadarError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Radar metadata request failed with status {status}")]
    Api { status: u16 },

    #[error("Failed to decode radar metadata: {0}")]
    Decode(String),
}

/// One radar frame: a capture time and the tile path to render it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RadarFrame {
    /// Capture time as Unix epoch seconds.
    pub time: i64,
    /// Server-relative tile path prefix for this frame.
    pub path: String,
}

/// Frame metadata: observed frames plus short-term forecast frames.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RadarMetadata {
    #[serde(default)]
    pub past: Vec<RadarFrame>,
    #[serde(default)]
    pub nowcast: Vec<RadarFrame>,
}

impl RadarMetadata {
    /// All frames in chronological order: past first, then nowcast.
    pub fn frames_in_order(&self) -> Vec<RadarFrame> {
        let mut past = self.past.clone();
        past.sort_by_key(|frame| frame.time);
        let mut nowcast = self.nowcast.clone();
        nowcast.sort_by_key(|frame| frame.time);
        past.extend(nowcast);
        past
    }
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    radar: Option<RadarMetadata>,
}

/// Client for the radar frame metadata feed
#[derive(Debug, Clone)]
pub struct RadarMetaClient {
    client: reqwest::Client,
    meta_url: String,
}

impl RadarMetaClient {
    pub fn new(meta_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            meta_url: meta_url.into(),
        }
    }

    /// Create a client with a custom metadata URL (useful for testing)
    pub fn new_with_base_url(meta_url: impl Into<String>) -> Self {
        Self::new(meta_url)
    }

    /// Fetch the current frame metadata.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self) -> Result<RadarMetadata, RadarError> {
        let response = self.client.get(&self.meta_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Radar metadata request failed: {}", status);
            return Err(RadarError::Api {
                status: status.as_u16(),
            });
        }

        let body: MetaResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Decode(e.to_string()))?;

        let metadata = body.radar.unwrap_or_default();
        tracing::debug!(
            "Fetched radar metadata: {} past, {} nowcast frames",
            metadata.past.len(),
            metadata.nowcast.len()
        );
        Ok(metadata)
    }
}

//! Device geolocation with a bounded wait.

use std::time::Duration;

use crate::types::{Location, LocationError};

/// How long to wait for a position fix before giving up.
const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of device position fixes.
///
/// Implementations are platform- or deployment-specific; the session only
/// requires a single bounded call.
pub trait GeolocationSource {
    fn current_position(
        &self,
    ) -> impl std::future::Future<Output = Result<(f64, f64), LocationError>> + Send;
}

/// Resolve the device position to a location, waiting at most the fixed
/// geolocation timeout.
pub async fn resolve_device_location<G: GeolocationSource>(
    source: &G,
) -> Result<Location, LocationError> {
    let (latitude, longitude) =
        match tokio::time::timeout(GEOLOCATION_TIMEOUT, source.current_position()).await {
            Ok(result) => result?,
            Err(_) => return Err(LocationError::Timeout),
        };

    tracing::info!("Resolved device position: {:.2}, {:.2}", latitude, longitude);
    Ok(Location::from_coordinates(latitude, longitude))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    struct FixedSource(f64, f64);

    impl GeolocationSource for FixedSource {
        async fn current_position(&self) -> Result<(f64, f64), LocationError> {
            Ok((self.0, self.1))
        }
    }

    struct StalledSource;

    impl GeolocationSource for StalledSource {
        async fn current_position(&self) -> Result<(f64, f64), LocationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok((0.0, 0.0))
        }
    }

    struct DeniedSource;

    impl GeolocationSource for DeniedSource {
        async fn current_position(&self) -> Result<(f64, f64), LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    #[tokio::test]
    async fn test_resolve_builds_geo_location() {
        let location = resolve_device_location(&FixedSource(52.5201, 13.4094))
            .await
            .unwrap();
        assert_eq!(location.id, "geo-52.52-13.41");
        assert_eq!(location.timezone.as_deref(), Some("auto"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_times_out() {
        let result = resolve_device_location(&StalledSource).await;
        assert!(matches!(result, Err(LocationError::Timeout)));
    }

    #[tokio::test]
    async fn test_resolve_propagates_denial() {
        let result = resolve_device_location(&DeniedSource).await;
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
    }
}

use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};

use crate::models::GeoPoint;

/// Acquisition outcomes mirror the platform's geolocation failure kinds; the
/// caller branches on them (only `PermissionDenied` offers the catalog mode).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeoError {
    #[error("permissão de localização negada")]
    PermissionDenied,
    #[error("localização indisponível")]
    PositionUnavailable,
    #[error("tempo esgotado ao obter localização")]
    Timeout,
    #[error("geolocalização não suportada neste ambiente")]
    NotSupported,
}

pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_FIX_AGE: Duration = Duration::from_secs(300);

pub trait LocationProvider {
    fn current_position(
        &self,
    ) -> impl std::future::Future<Output = Result<GeoPoint, GeoError>>;
}

/// Wraps a provider with an acquisition timeout and a maximum fix age: a fix
/// newer than the max age is reused without touching the provider again.
pub struct CachedLocator<P> {
    provider: P,
    acquire_timeout: Duration,
    max_fix_age: Duration,
    last_fix: Mutex<Option<(Instant, GeoPoint)>>,
}

impl<P: LocationProvider> CachedLocator<P> {
    pub fn new(provider: P) -> Self {
        Self::with_limits(provider, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_FIX_AGE)
    }

    pub fn with_limits(provider: P, acquire_timeout: Duration, max_fix_age: Duration) -> Self {
        Self {
            provider,
            acquire_timeout,
            max_fix_age,
            last_fix: Mutex::new(None),
        }
    }

    pub async fn locate(&self) -> Result<GeoPoint, GeoError> {
        let mut last = self.last_fix.lock().await;
        if let Some((acquired_at, fix)) = *last {
            if acquired_at.elapsed() <= self.max_fix_age {
                return Ok(fix);
            }
        }

        let fix = timeout(self.acquire_timeout, self.provider.current_position())
            .await
            .map_err(|_| GeoError::Timeout)??;
        *last = Some((Instant::now(), fix));
        Ok(fix)
    }
}

/// Deployment-pinned coordinates. The service has no device GPS; operators
/// pin the served region via environment, and absence reads as unsupported.
pub struct EnvLocator {
    fix: Option<GeoPoint>,
}

impl EnvLocator {
    pub fn from_env() -> Self {
        let latitude = read_coord("FIXED_LATITUDE");
        let longitude = read_coord("FIXED_LONGITUDE");
        let fix = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Self { fix }
    }

    pub fn pinned(fix: GeoPoint) -> Self {
        Self { fix: Some(fix) }
    }
}

fn read_coord(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

impl LocationProvider for EnvLocator {
    async fn current_position(&self) -> Result<GeoPoint, GeoError> {
        self.fix.ok_or(GeoError::NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    const SAO_LUIS: GeoPoint = GeoPoint {
        latitude: -2.5307,
        longitude: -44.3068,
    };

    #[derive(Clone)]
    struct ScriptedProvider {
        calls: Arc<AtomicUsize>,
        outcome: Result<GeoPoint, GeoError>,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn ok() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                outcome: Ok(SAO_LUIS),
                delay: Duration::ZERO,
            }
        }

        fn failing(error: GeoError) -> Self {
            Self {
                outcome: Err(error),
                ..Self::ok()
            }
        }
    }

    impl LocationProvider for ScriptedProvider {
        async fn current_position(&self) -> Result<GeoPoint, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome
        }
    }

    #[tokio::test]
    async fn fresh_fix_is_reused_without_a_second_acquisition() {
        let provider = ScriptedProvider::ok();
        let locator = CachedLocator::new(provider.clone());

        let first = locator.locate().await.expect("first fix");
        let second = locator.locate().await.expect("cached fix");

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_fix_triggers_reacquisition() {
        let provider = ScriptedProvider::ok();
        let locator =
            CachedLocator::with_limits(provider.clone(), DEFAULT_ACQUIRE_TIMEOUT, Duration::ZERO);

        locator.locate().await.expect("first fix");
        locator.locate().await.expect("second fix");

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_provider_maps_to_timeout() {
        let provider = ScriptedProvider {
            delay: Duration::from_millis(50),
            ..ScriptedProvider::ok()
        };
        let locator =
            CachedLocator::with_limits(provider, Duration::from_millis(5), DEFAULT_MAX_FIX_AGE);

        assert_eq!(locator.locate().await, Err(GeoError::Timeout));
    }

    #[tokio::test]
    async fn provider_error_kinds_are_preserved() {
        for kind in [
            GeoError::PermissionDenied,
            GeoError::PositionUnavailable,
            GeoError::NotSupported,
        ] {
            let locator = CachedLocator::new(ScriptedProvider::failing(kind));
            assert_eq!(locator.locate().await, Err(kind));
        }
    }

    #[tokio::test]
    async fn failed_acquisition_is_not_cached() {
        let provider = ScriptedProvider::failing(GeoError::PositionUnavailable);
        let locator = CachedLocator::new(provider.clone());

        let _ = locator.locate().await;
        let _ = locator.locate().await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pinned_locator_returns_its_fix() {
        let locator = EnvLocator::pinned(SAO_LUIS);
        assert_eq!(locator.current_position().await, Ok(SAO_LUIS));
    }
}

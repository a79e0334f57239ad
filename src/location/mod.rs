//! Location cache
//!
//! Resolves the user's coordinates with a strict preference order: a recent
//! cached value, then a bounded device query, then a fixed fallback.
//! [`LocationCache::get_location`] never fails — device errors and timeouts
//! fall through to the next source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::Result;

/// Fallback coordinate used when no cache and no device reading exist
/// (Warsaw city centre, matching the demo's home market)
pub const FALLBACK_COORD: (f64, f64) = (52.2297, 21.0122);

/// How long a captured location stays valid
const CACHE_TTL_MINUTES: i64 = 30;

/// Bound on the device geolocation query
const DEVICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed name of the single persisted cache entry
const CACHE_FILE: &str = "location.json";

/// A captured coordinate with its capture time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// When the coordinate was captured
    #[serde(rename = "ts")]
    pub captured_at: DateTime<Utc>,
}

impl Location {
    /// Capture a coordinate now
    #[must_use]
    pub fn captured_now(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            captured_at: Utc::now(),
        }
    }

    /// The fixed fallback coordinate, stamped with the current time
    #[must_use]
    pub fn fallback() -> Self {
        Self::captured_now(FALLBACK_COORD.0, FALLBACK_COORD.1)
    }

    /// Whether this capture is still within the given TTL
    #[must_use]
    pub fn is_fresh(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.captured_at < ttl
    }
}

/// Device geolocation capability
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Query the device for its current position
    ///
    /// # Errors
    ///
    /// Returns an error when the device has no position available
    async fn current_position(&self) -> Result<(f64, f64)>;
}

/// Time-bounded location resolution over a persisted single-entry cache
pub struct LocationCache {
    provider: Box<dyn GeolocationProvider>,
    cache_path: PathBuf,
    ttl: chrono::Duration,
    device_timeout: Duration,
    cached: Mutex<Option<Location>>,
}

impl LocationCache {
    /// Create a cache persisting under the given data directory
    #[must_use]
    pub fn new(provider: Box<dyn GeolocationProvider>, data_dir: &Path) -> Self {
        Self {
            provider,
            cache_path: data_dir.join(CACHE_FILE),
            ttl: chrono::Duration::minutes(CACHE_TTL_MINUTES),
            device_timeout: DEVICE_TIMEOUT,
            cached: Mutex::new(None),
        }
    }

    /// Override the cache TTL (tests and non-default deployments)
    #[must_use]
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the device query bound
    #[must_use]
    pub const fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    /// Resolve the current location. Never fails.
    ///
    /// Order: fresh cached value, then a bounded device query (cached on
    /// success), then the fixed fallback (not cached).
    pub async fn get_location(&self) -> Location {
        let mut cached = self.cached.lock().await;

        if cached.is_none() {
            *cached = read_entry(&self.cache_path);
        }
        if let Some(loc) = cached.as_ref() {
            if loc.is_fresh(self.ttl) {
                tracing::debug!(lat = loc.lat, lng = loc.lng, "using cached location");
                return *loc;
            }
        }

        match tokio::time::timeout(self.device_timeout, self.provider.current_position()).await {
            Ok(Ok((lat, lng))) => {
                let loc = Location::captured_now(lat, lng);
                *cached = Some(loc);
                write_entry(&self.cache_path, &loc);
                tracing::debug!(lat, lng, "device location captured");
                loc
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "device geolocation failed, using fallback");
                Location::fallback()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.device_timeout.as_secs(),
                    "device geolocation timed out, using fallback"
                );
                Location::fallback()
            }
        }
    }
}

/// Read the persisted entry; corrupt or unreadable files count as absent
fn read_entry(path: &Path) -> Option<Location> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(loc) => Some(loc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt location cache");
            None
        }
    }
}

/// Persist the entry; write failures are logged, never propagated
fn write_entry(path: &Path, loc: &Location) {
    let write = || -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(loc)?)?;
        Ok(())
    };
    if let Err(e) = write() {
        tracing::warn!(path = %path.display(), error = %e, "failed to persist location cache");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::Error;

    /// Provider with a scripted outcome, counting how often it is queried
    struct StubProvider {
        result: Option<(f64, f64)>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GeolocationProvider for StubProvider {
        async fn current_position(&self) -> Result<(f64, f64)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .ok_or_else(|| Error::CapabilityUnavailable("no geolocation".to_string()))
        }
    }

    /// Provider whose query never resolves
    struct HangingProvider;

    #[async_trait]
    impl GeolocationProvider for HangingProvider {
        async fn current_position(&self) -> Result<(f64, f64)> {
            futures::future::pending().await
        }
    }

    fn stub(result: Option<(f64, f64)>) -> (Box<StubProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(StubProvider {
                result,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, calls) = stub(Some((50.06, 19.94)));
        let cache = LocationCache::new(provider, dir.path());

        let first = cache.get_location().await;
        let second = cache.get_location().await;

        assert_eq!(first.lat, second.lat);
        assert_eq!(first.lng, second.lng);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_when_device_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, _) = stub(None);
        let cache = LocationCache::new(provider, dir.path());

        let loc = cache.get_location().await;
        assert_eq!((loc.lat, loc.lng), FALLBACK_COORD);
    }

    #[tokio::test]
    async fn test_fallback_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, _) = stub(None);
        let cache = LocationCache::new(provider, dir.path());

        let _ = cache.get_location().await;
        assert!(!dir.path().join(CACHE_FILE).exists());
    }

    #[tokio::test]
    async fn test_device_timeout_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocationCache::new(Box::new(HangingProvider), dir.path())
            .with_device_timeout(Duration::from_millis(20));

        let loc = cache.get_location().await;
        assert_eq!((loc.lat, loc.lng), FALLBACK_COORD);
    }

    #[tokio::test]
    async fn test_persisted_entry_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let (provider, _) = stub(Some((50.06, 19.94)));
            let cache = LocationCache::new(provider, dir.path());
            let _ = cache.get_location().await;
        }

        // A fresh instance must serve the persisted entry without a device query
        let (provider, calls) = stub(Some((0.0, 0.0)));
        let cache = LocationCache::new(provider, dir.path());
        let loc = cache.get_location().await;

        assert_eq!((loc.lat, loc.lng), (50.06, 19.94));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_entry_triggers_device_query() {
        let dir = tempfile::tempdir().unwrap();
        let stale = Location {
            lat: 1.0,
            lng: 2.0,
            captured_at: Utc::now() - chrono::Duration::hours(1),
        };
        write_entry(&dir.path().join(CACHE_FILE), &stale);

        let (provider, calls) = stub(Some((50.06, 19.94)));
        let cache = LocationCache::new(provider, dir.path());
        let loc = cache.get_location().await;

        assert_eq!((loc.lat, loc.lng), (50.06, 19.94));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE), "not json").unwrap();

        let (provider, _) = stub(Some((50.06, 19.94)));
        let cache = LocationCache::new(provider, dir.path());
        let loc = cache.get_location().await;

        assert_eq!((loc.lat, loc.lng), (50.06, 19.94));
    }
}

//! IATA code to coordinate resolution with a process-wide additive cache.

use crate::models::{normalize_iata, Airport, AirportMap};
use dashmap::DashMap;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Transport(String),
    #[error("lookup service returned status {0}")]
    Status(u16),
    #[error("lookup response could not be decoded: {0}")]
    Decode(String),
    #[error("lookup is not configured: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("failed to resolve {requested} airport code(s)")]
    Lookup {
        requested: usize,
        #[source]
        source: LookupError,
    },
}

/// External batched airport lookup.
///
/// Codes the service does not know are left out of the response.
pub trait AirportLookup {
    fn lookup(
        &self,
        codes: &[String],
    ) -> impl Future<Output = Result<Vec<Airport>, LookupError>> + Send;
}

/// Resolved airports shared by every map in the process.
///
/// Entries are never evicted and never overwritten once present.
#[derive(Debug, Clone, Default)]
pub struct AirportCache {
    entries: Arc<DashMap<String, Airport>>,
}

impl AirportCache {
    /// An isolated cache, mostly useful in tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Self {
        static CACHE: OnceLock<AirportCache> = OnceLock::new();
        CACHE.get_or_init(AirportCache::new).clone()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<Airport> {
        self.entries.get(code).map(|entry| entry.value().clone())
    }

    /// The cached subset of `codes`.
    pub fn get_many(&self, codes: &[String]) -> AirportMap {
        codes
            .iter()
            .filter_map(|code| self.get(code).map(|airport| (code.clone(), airport)))
            .collect()
    }

    /// Insert airports that are not cached yet. Returns how many were added.
    pub fn merge<I>(&self, airports: I) -> usize
    where
        I: IntoIterator<Item = Airport>,
    {
        let mut added = 0;
        for airport in airports {
            let Some(code) = normalize_iata(&airport.iata_code) else {
                continue;
            };
            if !airport.coordinate.is_finite() {
                tracing::warn!("Ignoring airport {} with invalid coordinates", code);
                continue;
            }
            self.entries.entry(code.clone()).or_insert_with(|| {
                added += 1;
                Airport {
                    iata_code: code,
                    ..airport
                }
            });
        }
        added
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves IATA codes through the cache, falling back to one batched lookup.
pub struct AirportResolver<L> {
    lookup: L,
    cache: AirportCache,
}

impl<L: AirportLookup> AirportResolver<L> {
    /// Resolver backed by the process-wide cache.
    pub fn new(lookup: L) -> Self {
        Self::with_cache(lookup, AirportCache::global())
    }

    pub fn with_cache(lookup: L, cache: AirportCache) -> Self {
        Self { lookup, cache }
    }

    pub fn cache(&self) -> &AirportCache {
        &self.cache
    }

    /// Resolve from the cache only.
    pub fn cached<I, S>(&self, codes: I) -> AirportMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.get_many(&unique_codes(codes))
    }

    /// Resolve `codes`, fetching the ones not cached in a single request.
    ///
    /// Codes the lookup does not know are absent from the result.
    pub async fn resolve<I, S>(&self, codes: I) -> Result<AirportMap, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = unique_codes(codes);
        let missing: Vec<String> = codes
            .iter()
            .filter(|code| !self.cache.contains(code))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(self.cache.get_many(&codes));
        }

        tracing::debug!(
            "Looking up {} airport(s), {} already cached",
            missing.len(),
            codes.len() - missing.len()
        );

        let found = self
            .lookup
            .lookup(&missing)
            .await
            .map_err(|source| ResolveError::Lookup {
                requested: missing.len(),
                source,
            })?;

        let added = self.cache.merge(found);
        if added < missing.len() {
            tracing::debug!(
                "Airport lookup returned {} of {} requested code(s)",
                added,
                missing.len()
            );
        }

        Ok(self.cache.get_many(&codes))
    }
}

/// Normalized codes in first-seen order, without duplicates.
pub(crate) fn unique_codes<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter_map(|code| normalize_iata(code.as_ref()))
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeLookup {
        known: Vec<Airport>,
        calls: AtomicUsize,
        requested: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl FakeLookup {
        fn new(known: Vec<Airport>) -> Self {
            Self {
                known,
                calls: AtomicUsize::new(0),
                requested: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    impl AirportLookup for FakeLookup {
        async fn lookup(&self, codes: &[String]) -> Result<Vec<Airport>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(codes.to_vec());
            if self.fail {
                return Err(LookupError::Status(500));
            }
            Ok(self
                .known
                .iter()
                .filter(|airport| codes.contains(&airport.iata_code))
                .cloned()
                .collect())
        }
    }

    fn airports() -> Vec<Airport> {
        vec![
            Airport::new("JFK", 40.6413, -73.7781),
            Airport::new("LHR", 51.47, -0.4543),
            Airport::new("CDG", 49.0097, 2.5479),
        ]
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let resolver = AirportResolver::with_cache(FakeLookup::new(airports()), AirportCache::new());

        let first = resolver.resolve(["JFK", "LHR", "jfk"]).await.unwrap();
        let second = resolver.resolve(["LHR", "JFK"]).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(resolver.lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn only_missing_codes_are_requested() {
        let resolver = AirportResolver::with_cache(FakeLookup::new(airports()), AirportCache::new());
        resolver.resolve(["JFK"]).await.unwrap();
        let result = resolver.resolve(["JFK", "CDG", "LHR"]).await.unwrap();

        assert_eq!(result.len(), 3);
        let requested = resolver.lookup.requested.lock().unwrap();
        assert_eq!(requested[1], vec!["CDG".to_string(), "LHR".to_string()]);
    }

    #[tokio::test]
    async fn unknown_code_is_absent_not_an_error() {
        let resolver = AirportResolver::with_cache(FakeLookup::new(Vec::new()), AirportCache::new());
        let result = resolver.resolve(["AAA"]).await.unwrap();
        assert!(!result.contains_key("AAA"));
    }

    #[tokio::test]
    async fn lookup_failure_keeps_cached_entries() {
        let cache = AirportCache::new();
        cache.merge(airports());
        let mut lookup = FakeLookup::new(Vec::new());
        lookup.fail = true;
        let resolver = AirportResolver::with_cache(lookup, cache);

        let err = resolver.resolve(["JFK", "SFO"]).await.unwrap_err();
        assert!(matches!(err, ResolveError::Lookup { requested: 1, .. }));
        assert!(resolver.cached(["JFK", "SFO"]).contains_key("JFK"));
    }

    #[test]
    fn merge_never_overwrites() {
        let cache = AirportCache::new();
        assert_eq!(cache.merge([Airport::new("jfk", 40.6413, -73.7781)]), 1);
        assert_eq!(cache.merge([Airport::new("JFK", 0.0, 0.0)]), 0);
        let jfk = cache.get("JFK").unwrap();
        assert_eq!(jfk.coordinate.latitude, 40.6413);
        assert_eq!(jfk.iata_code, "JFK");
    }

    #[test]
    fn global_cache_is_shared() {
        let a = AirportCache::global();
        let b = AirportCache::global();
        a.merge([Airport::new("ZZG", 1.0, 2.0)]);
        assert!(b.contains("ZZG"));
    }
}

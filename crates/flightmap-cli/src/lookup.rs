//! Airport resolution that gives way to Ctrl-C.

use flightmap_core::{AirportLookup, AirportMap, AirportResolver, ResolveError};
use tokio::sync::broadcast;

/// Resolve `codes`, or return `None` if shutdown fires first.
pub async fn resolve_until_shutdown<L: AirportLookup>(
    resolver: &AirportResolver<L>,
    codes: &[String],
    shutdown: &mut broadcast::Receiver<()>,
) -> Option<Result<AirportMap, ResolveError>> {
    tokio::select! {
        _ = shutdown.recv() => {
            tracing::info!("Airport lookup interrupted");
            None
        }
        resolved = resolver.resolve(codes) => Some(resolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightmap_core::{Airport, AirportCache, LookupError};
    use std::time::Duration;

    struct SlowLookup {
        delay: Duration,
    }

    impl AirportLookup for SlowLookup {
        async fn lookup(&self, codes: &[String]) -> Result<Vec<Airport>, LookupError> {
            tokio::time::sleep(self.delay).await;
            Ok(codes
                .iter()
                .filter(|code| code.as_str() == "CDG")
                .map(|_| Airport::new("CDG", 49.0097, 2.5479))
                .collect())
        }
    }

    fn resolver(delay: Duration) -> AirportResolver<SlowLookup> {
        AirportResolver::with_cache(SlowLookup { delay }, AirportCache::new())
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_slow_lookup() {
        let resolver = resolver(Duration::from_secs(60));
        let (tx, mut rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        let outcome = resolve_until_shutdown(&resolver, &["CDG".to_string()], &mut rx).await;

        assert!(outcome.is_none());
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_completes_without_shutdown() {
        let resolver = resolver(Duration::from_millis(50));
        let (_tx, mut rx) = broadcast::channel(1);

        let outcome = resolve_until_shutdown(&resolver, &["CDG".to_string()], &mut rx).await;

        let airports = outcome.unwrap().unwrap();
        assert!(airports.contains_key("CDG"));
    }
}

//! Shared handler state.

use flightmap_core::{AirportCache, AirportLookup, AirportResolver};

pub struct AppState<L> {
    pub resolver: AirportResolver<L>,
}

impl<L: AirportLookup> AppState<L> {
    /// State backed by the process-wide airport cache.
    pub fn new(lookup: L) -> Self {
        Self {
            resolver: AirportResolver::new(lookup),
        }
    }

    pub fn with_cache(lookup: L, cache: AirportCache) -> Self {
        Self {
            resolver: AirportResolver::with_cache(lookup, cache),
        }
    }
}

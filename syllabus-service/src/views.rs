//! Staleness tracking for logical views.
//!
//! The extraction script writes into the database behind the application's
//! back, so renderers caching derived data cannot rely on write-path hooks.
//! Instead, each logical view path carries a generation counter; bumping it
//! tells consumers their cached state is stale.

use dashmap::DashMap;

pub const VIEW_DASHBOARD: &str = "/";
pub const VIEW_BROWSE: &str = "/browse";
pub const VIEW_MANAGE: &str = "/manage";

/// Generation counters keyed by logical view path
#[derive(Debug, Default)]
pub struct ViewCache {
    generations: DashMap<String, u64>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation of a view; unknown views start at 0
    pub fn generation(&self, path: &str) -> u64 {
        self.generations.get(path).map(|g| *g).unwrap_or(0)
    }

    /// Mark the given views stale
    pub fn invalidate(&self, paths: &[&str]) {
        for path in paths {
            *self.generations.entry(path.to_string()).or_insert(0) += 1;
        }
    }
}

//! Centralized configuration, grounded on the teacher's `config.rs`
//! `QuiverConfig::from_env()` pattern: a single place to collect tunables
//! instead of scattering env lookups through the relation layer.

use crate::consts::DEFAULT_PAGE_SIZE;

/// Relation-wide tunables. `split_threshold_numerator` exposes the literal
/// `1024` from spec.md §4.5's split predicate
/// (`ntups mod floor(numerator / (10 * nattrs)) == 0`) so tests can shrink
/// the threshold without touching the formula itself.
#[derive(Clone, Debug)]
pub struct RelationConfig {
    pub page_size: u32,
    pub split_threshold_numerator: u32,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            split_threshold_numerator: 1024,
        }
    }
}

impl RelationConfig {
    /// Load configuration from environment variables, falling back to
    /// [`Default`] for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MALHF_PAGE_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.page_size = n;
            }
        }

        if let Ok(v) = std::env::var("MALHF_SPLIT_THRESHOLD_NUMERATOR") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.split_threshold_numerator = n;
            }
        }

        cfg
    }

    /// `floor(numerator / (10 * nattrs))`, clamped to at least 1 so the
    /// split predicate's modulo never divides by zero for large `nattrs`.
    pub fn split_threshold(&self, nattrs: u32) -> u32 {
        (self.split_threshold_numerator / (10 * nattrs)).max(1)
    }
}

// Loader defaults and environment overrides.
use std::time::Duration;

pub(crate) const DEFAULT_MAX_CACHED_BOUNDS: usize = 5;
pub(crate) const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.7;
pub(crate) const DEFAULT_BUFFER_RATIO: f64 = 0.5;
pub(crate) const DEFAULT_MAX_FEATURES: usize = 10_000;
pub(crate) const DEFAULT_LOAD_CHUNK_SIZE: usize = 8;
// Roughly one suburb per cell at community-map zoom levels.
pub(crate) const DEFAULT_CELL_SIZE: f64 = 0.05;
pub(crate) const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Tunables for the viewport feature cache and loader.
///
/// Defaults suit the community map views; each field can be overridden via
/// `EMBER_*` environment variables through [`LoaderConfig::from_env`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Bound on the number of cached viewport entries (LRU beyond this).
    pub max_cached_bounds: usize,
    /// Fractional overlap at which a cached viewport satisfies a new request
    /// without any network access.
    pub overlap_threshold: f64,
    /// Margin added around the visible viewport before fetching, as a
    /// fraction of the viewport's own size per side.
    pub buffer_ratio: f64,
    /// Hard cap on features handed to the renderer per load.
    pub max_features: usize,
    /// Number of cells fetched per fan-out batch; the feature cap is checked
    /// between batches.
    pub load_chunk_size: usize,
    /// Cell edge length in degrees.
    pub cell_size: f64,
    /// Quiet period after the last viewport-change event before a load runs.
    pub debounce: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_cached_bounds: DEFAULT_MAX_CACHED_BOUNDS,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            buffer_ratio: DEFAULT_BUFFER_RATIO,
            max_features: DEFAULT_MAX_FEATURES,
            load_chunk_size: DEFAULT_LOAD_CHUNK_SIZE,
            cell_size: DEFAULT_CELL_SIZE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl LoaderConfig {
    /// Defaults with any `EMBER_*` environment overrides applied. Unparseable
    /// values fall back to the default rather than failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        apply_env("EMBER_MAX_CACHED_BOUNDS", &mut config.max_cached_bounds);
        apply_env("EMBER_OVERLAP_THRESHOLD", &mut config.overlap_threshold);
        apply_env("EMBER_BUFFER_RATIO", &mut config.buffer_ratio);
        apply_env("EMBER_MAX_FEATURES", &mut config.max_features);
        apply_env("EMBER_LOAD_CHUNK_SIZE", &mut config.load_chunk_size);
        apply_env("EMBER_CELL_SIZE", &mut config.cell_size);
        let mut debounce_ms = config.debounce.as_millis() as u64;
        apply_env("EMBER_DEBOUNCE_MS", &mut debounce_ms);
        config.debounce = Duration::from_millis(debounce_ms);
        config
    }
}

fn apply_env<T: std::str::FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(name)
        && let Ok(value) = raw.parse()
    {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LoaderConfig::default();
        assert_eq!(config.max_cached_bounds, 5);
        assert_eq!(config.overlap_threshold, 0.7);
        assert_eq!(config.buffer_ratio, 0.5);
        assert_eq!(config.max_features, 10_000);
        assert_eq!(config.debounce, Duration::from_millis(250));
    }
}

use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalyticsConfig, AttributionSettings, CacheSettings, ContributionWeights, LoggingSettings,
    MetricsSettings, RecommenderSettings,
};

/// Prefix for environment overrides, e.g. `STRATLAYER__METRICS__MIN_TRADES=5`.
pub const ENV_PREFIX: &str = "STRATLAYER";

/// Loads the analytics configuration.
///
/// Sources are layered in order: built-in defaults, the TOML file at `path`
/// (optional, `analytics.toml` by default), then `STRATLAYER__*` environment
/// variables. The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig, ConfigError> {
    tracing::debug!(path = ?path, "Loading analytics configuration.");
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("analytics.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `AnalyticsConfig` struct
    let config = builder.try_deserialize::<AnalyticsConfig>()?;
    config.validate()?;
    tracing::debug!(
        min_trades = config.metrics.min_trades,
        cache_capacity = config.cache.capacity,
        "Analytics configuration loaded."
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("stratlayer-{}-{name}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn environment_overrides_the_file() {
        let path = write_config(
            "override",
            "[metrics]\nmin_trades = 3\n\n[cache]\ncapacity = 32\nttl = \"90s\"\n",
        );
        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe { std::env::set_var("STRATLAYER__METRICS__MIN_TRADES", "7") };

        let loaded = load_config(Some(&path));
        unsafe { std::env::remove_var("STRATLAYER__METRICS__MIN_TRADES") };
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.metrics.min_trades, 7);
        assert_eq!(config.cache.capacity, 32);
        assert_eq!(config.cache.ttl, std::time::Duration::from_secs(90));
        assert_eq!(config.metrics.trading_days_per_year, 252);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let path = write_config("invalid", "[metrics]\ntrading_days_per_year = 0\n");

        let loaded = load_config(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(loaded, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("stratlayer-does-not-exist.toml");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::LoadError(_))));
    }
}

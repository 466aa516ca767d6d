//! Logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Builds the default filter directives for a configured level.
///
/// sqlx logs every statement at info and tower-http traces at debug; both
/// are capped so request logs stay readable at `info`.
fn default_directives(level: &str) -> String {
    format!("{},sqlx=warn,tower_http=info", level)
}

/// Initializes the tracing subscriber from the `[logging]` config section.
///
/// A `RUST_LOG` environment variable overrides the configured level
/// entirely, including the per-crate caps.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .init();
    } else {
        registry.with(fmt::layer().pretty().with_target(true)).init();
    }

    tracing::debug!(
        level = %config.level,
        format = %config.format,
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cap_noisy_crates() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("sqlx=warn"));
        assert!(directives.contains("tower_http=info"));
    }
}

//! Tracing subscriber setup.
//!
//! `RUST_LOG` overrides the configured level, so a deployment can turn
//! individual targets up without a config rollout.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    // Production runs json (the default.toml setting); anything else
    // gets the human-readable form for local work.
    if config.format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().pretty().with_span_events(FmtSpan::CLOSE))
            .init();
    }
}

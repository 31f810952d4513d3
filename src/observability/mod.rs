//! Tracing initialization for the purge binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset. Quiets the HTTP stack so run
/// output stays readable.
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,rustls=warn";

/// Initialize the tracing subscriber.
///
/// Console logging in compact format; `RUST_LOG` overrides the default
/// filter when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

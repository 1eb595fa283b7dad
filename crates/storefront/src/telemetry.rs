//! Logging and error tracking setup.
//!
//! Installs a `tracing` subscriber with an `EnvFilter`, a fmt layer on stderr
//! (text or JSON per [`LogFormat`]), and the Sentry layer. Sentry is only initialized when a DSN is configured;
//! without one the Sentry layer is inert.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, StorefrontConfig};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "marketpulse_storefront=info,marketpulse_cli=info";

/// Keeps Sentry alive; flushes pending events on drop.
#[derive(Default)]
pub struct TelemetryGuard {
    sentry: Option<sentry::ClientInitGuard>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("sentry", &self.sentry.is_some())
            .finish()
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(std::borrow::Cow::Owned(config.sentry_environment.clone())),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install logging and error tracking for the process.
///
/// Sentry must be initialized before the subscriber, so call this once at
/// startup and hold the guard until exit. A second call leaves the existing
/// subscriber in place.
pub fn init(config: &StorefrontConfig) -> TelemetryGuard {
    let sentry_guard = init_sentry(config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    // JSON lines for log shippers, text otherwise
    let is_json = config.log_format == LogFormat::Json;
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init()
        .is_ok();

    if installed && sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    TelemetryGuard {
        sentry: sentry_guard,
    }
}

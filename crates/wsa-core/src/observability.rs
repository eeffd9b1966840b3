//! Logging setup and spans
//!
//! Structured logging with one span per activation and one per scope.

use crate::config::{LogConfig, LogFormat};
use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber
///
/// `RUST_LOG` wins over `config.default_directive`. Safe to call multiple
/// times; only the first call has an effect.
pub fn init_logging(config: &LogConfig) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

        // try_init: the embedding application may already own the subscriber
        let result = match config.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false))
                .try_init(),
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "Subscriber already installed");
        }
    });
}

/// Span covering one activation request
#[must_use]
pub fn activation_span(project: &str, server: &str) -> Span {
    tracing::info_span!("activation", project = project, server = server)
}

/// Span covering one scope migration
#[must_use]
pub fn scope_span(scope: &str, web_app: &str) -> Span {
    tracing::info_span!("scope", scope = scope, web_app = web_app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging(&LogConfig::default());
        init_logging(&LogConfig {
            format: LogFormat::Json,
            default_directive: "debug".to_string(),
        });
    }

    #[test]
    fn spans_can_be_entered() {
        let span = activation_span("Mithras", "JettyA");
        let _guard = span.enter();
        let inner = scope_span("WEBEDIT", "WEBEDIT@project-1");
        let _inner = inner.enter();
    }
}
